pub mod score;
pub mod user;

pub use score::{AllTimeLeaderboardRow, DailyLeaderboardRow, DailyScore, WeeklyLeaderboardRow};
pub use user::{User, UserProfile, UserStatsRow};
