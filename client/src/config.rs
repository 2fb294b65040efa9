use std::{collections::HashMap, path::Path, path::PathBuf, time::Duration};

use chrono::NaiveDate;
use config::{Config, Environment, File};
use daily_puzzle_core::{seed::DEFAULT_SALT, PuzzleGenerator, SeedSchedule};
use serde::Deserialize;

use crate::{error::Result, sync::RetryPolicy};

/// Config file read from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "daily-puzzle.toml";
pub const ENV_PREFIX: &str = "DAILY_PUZZLE";

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the score API, including `/api`
    pub api_url: String,
    pub data_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub puzzle: PuzzleSettings,
    pub sync: SyncSettings,
    /// Base64 AES-256 key; when set the stored session token is encrypted
    pub session_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PuzzleSettings {
    pub salt: String,
    pub cycle_days: Option<u32>,
    pub cycle_anchor: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    pub batch_size: usize,
    pub max_attempts: u32,
    pub base_delay_secs: u64,
    pub max_delay_secs: u64,
}

impl ClientConfig {
    /// Defaults, then `daily-puzzle.toml`, then `DAILY_PUZZLE_*` variables.
    pub fn load() -> Result<Self> {
        Self::load_with(Path::new(DEFAULT_CONFIG_FILE), None)
    }

    /// `env` replaces the process environment when given.
    pub fn load_with(file: &Path, env: Option<HashMap<String, String>>) -> Result<Self> {
        let config = Config::builder()
            .set_default("api_url", "http://localhost:5000/api")?
            .set_default("data_dir", "daily-puzzle-data")?
            .set_default("request_timeout_secs", 10_i64)?
            .set_default("puzzle.salt", DEFAULT_SALT)?
            .set_default("puzzle.cycle_anchor", "2024-01-01")?
            .set_default("sync.batch_size", 20_i64)?
            .set_default("sync.max_attempts", 8_i64)?
            .set_default("sync.base_delay_secs", 30_i64)?
            .set_default("sync.max_delay_secs", 3600_i64)?
            .add_source(File::from(file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn generator(&self) -> PuzzleGenerator {
        let schedule = match self.puzzle.cycle_days {
            Some(days) if days > 1 => SeedSchedule::Cycle {
                days,
                anchor: self.puzzle.cycle_anchor,
            },
            _ => SeedSchedule::Daily,
        };
        PuzzleGenerator::new(self.puzzle.salt.clone(), schedule)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_secs(self.sync.base_delay_secs),
            max_delay: Duration::from_secs(self.sync.max_delay_secs),
            max_attempts: self.sync.max_attempts,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_without_file() {
        let config =
            ClientConfig::load_with(Path::new("/nonexistent/daily-puzzle.toml"), env(&[])).unwrap();
        assert_eq!(config.api_url, "http://localhost:5000/api");
        assert_eq!(config.sync.batch_size, 20);
        assert_eq!(config.retry_policy().base_delay, Duration::from_secs(30));
        assert_eq!(config.generator().schedule, SeedSchedule::Daily);
        assert!(config.session_key.is_none());
    }

    #[test]
    fn test_file_then_env_override() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "api_url = \"https://puzzles.example.com/api\"\n\n[puzzle]\ncycle_days = 3\n\n[sync]\nbatch_size = 5"
        )
        .unwrap();

        let config = ClientConfig::load_with(
            file.path(),
            env(&[
                ("DAILY_PUZZLE_SYNC__BATCH_SIZE", "7"),
                ("DAILY_PUZZLE_DATA_DIR", "/tmp/puzzles"),
            ]),
        )
        .unwrap();

        assert_eq!(config.api_url, "https://puzzles.example.com/api");
        assert_eq!(config.sync.batch_size, 7);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/puzzles"));
        assert!(matches!(
            config.generator().schedule,
            SeedSchedule::Cycle { days: 3, .. }
        ));
    }
}
