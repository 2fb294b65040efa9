//! Seeded pseudo-random source for puzzle generation.
//!
//! A small LCG (a=9301, c=49297, m=233280). It is weak but fully specified,
//! which keeps a daily puzzle identical across releases and platforms.

const MULTIPLIER: u64 = 9301;
const INCREMENT: u64 = 49297;
const MODULUS: u64 = 233_280;

#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: u64,
}

impl SeededRandom {
    pub fn new(seed: u32) -> Self {
        Self {
            state: u64::from(seed),
        }
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER + INCREMENT) % MODULUS;
        self.state as f64 / MODULUS as f64
    }

    /// Uniform index in `[0, n)`. `n` must be non-zero.
    pub fn below(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        ((self.next_f64() * n as f64) as usize).min(n - 1)
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.below(i + 1);
            slice.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SeededRandom::new(12345);
        let mut b = SeededRandom::new(12345);
        for _ in 0..100 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn test_first_value_matches_lcg() {
        // (1 * 9301 + 49297) % 233280 = 58598
        let mut rng = SeededRandom::new(1);
        assert_eq!(rng.next_f64(), 58598.0 / 233280.0);
    }

    #[test]
    fn test_values_in_unit_interval() {
        let mut rng = SeededRandom::new(u32::MAX);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_below_stays_in_range() {
        let mut rng = SeededRandom::new(7);
        for n in 1..20 {
            for _ in 0..50 {
                assert!(rng.below(n) < n);
            }
        }
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = SeededRandom::new(99);
        let mut values: Vec<u8> = (0..10).collect();
        rng.shuffle(&mut values);
        let mut sorted = values.clone();
        sorted.sort();
        assert_eq!(sorted, (0..10).collect::<Vec<u8>>());
    }
}
