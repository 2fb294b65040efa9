use crate::{puzzle::Difficulty, stats::DayResult};

pub const BASE_SCORE: f64 = 1000.0;
/// Points lost per second of solving
pub const TIME_PENALTY_PER_SECOND: f64 = 10.0;
pub const HINT_PENALTY: i32 = 100;

/// Score for a solve: 1000 minus 10 per second, minus 100 per hint, never negative.
pub fn solve_score(elapsed_ms: u64, hints_used: u32) -> i32 {
    let seconds = elapsed_ms as f64 / 1000.0;
    let timed = (BASE_SCORE - seconds * TIME_PENALTY_PER_SECOND).round().max(0.0) as i32;
    let penalty = HINT_PENALTY.saturating_mul(hints_used.min(i32::MAX as u32) as i32);
    timed.saturating_sub(penalty).max(0)
}

/// Heatmap level 0..=4 for a day's entry.
pub fn intensity(entry: Option<&DayResult>) -> u8 {
    let Some(entry) = entry.filter(|e| e.solved) else {
        return 0;
    };
    if entry.score >= 1000 {
        4
    } else if entry.difficulty == Difficulty::Hard || entry.score >= 700 {
        3
    } else if entry.difficulty == Difficulty::Medium || entry.score >= 300 {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::PuzzleKind;

    fn entry(score: i32, difficulty: Difficulty, solved: bool) -> DayResult {
        DayResult {
            solved,
            score,
            difficulty,
            kind: PuzzleKind::Binary,
            puzzle_id: "1-binary-easy".to_string(),
            time_taken: 10,
            hints_used: 0,
        }
    }

    #[test]
    fn test_instant_solve_scores_full() {
        assert_eq!(solve_score(0, 0), 1000);
    }

    #[test]
    fn test_time_penalty_rounds() {
        // 12.34s -> 1000 - 123.4 = 876.6 -> 877
        assert_eq!(solve_score(12_340, 0), 877);
    }

    #[test]
    fn test_slow_solve_floors_at_zero() {
        assert_eq!(solve_score(150_000, 0), 0);
        assert_eq!(solve_score(90_000, 2), 0);
    }

    #[test]
    fn test_hint_penalty() {
        assert_eq!(solve_score(10_000, 1), 800);
        assert_eq!(solve_score(10_000, 3), 600);
    }

    #[test]
    fn test_intensity_levels() {
        assert_eq!(intensity(None), 0);
        assert_eq!(intensity(Some(&entry(900, Difficulty::Easy, false))), 0);
        assert_eq!(intensity(Some(&entry(1000, Difficulty::Easy, true))), 4);
        assert_eq!(intensity(Some(&entry(100, Difficulty::Hard, true))), 3);
        assert_eq!(intensity(Some(&entry(750, Difficulty::Easy, true))), 3);
        assert_eq!(intensity(Some(&entry(50, Difficulty::Medium, true))), 2);
        assert_eq!(intensity(Some(&entry(300, Difficulty::Easy, true))), 2);
        assert_eq!(intensity(Some(&entry(299, Difficulty::Easy, true))), 1);
    }
}
