use anyhow::{Context, Result};
use chrono::NaiveDate;
use daily_puzzle_core::{seed::DEFAULT_SALT, PuzzleGenerator, SeedSchedule};
use serde::Deserialize;
use std::{env, time::Duration};

/// Shortest accepted JWT secret
pub const MIN_JWT_SECRET_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub limits: RateLimitConfig,
    pub puzzle: PuzzleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub client_url: String,
    /// `production` hides internal error details from responses
    pub environment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

/// Requests allowed per window, per client address
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WindowLimit {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl WindowLimit {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub auth: WindowLimit,
    pub score_submit: WindowLimit,
    pub api: WindowLimit,
    /// Key clients by `x-forwarded-for`. Only safe behind a proxy that
    /// overwrites the header.
    pub trust_proxy: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PuzzleConfig {
    pub salt: String,
    pub cycle_days: Option<u32>,
    pub cycle_anchor: NaiveDate,
    /// How many days back a late (offline) submission may be dated
    pub backfill_days: i64,
    pub max_sync_batch: usize,
}

impl PuzzleConfig {
    pub fn generator(&self) -> PuzzleGenerator {
        let schedule = match self.cycle_days {
            Some(days) if days > 1 => SeedSchedule::Cycle {
                days,
                anchor: self.cycle_anchor,
            },
            _ => SeedSchedule::Daily,
        };
        PuzzleGenerator::new(self.salt.clone(), schedule)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let database = DatabaseConfig {
            url: var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: or("DATABASE_MAX_CONNECTIONS", "10")
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
        };

        let server = ServerConfig {
            host: or("HOST", "0.0.0.0"),
            port: or("PORT", "5000").parse().context("PORT must be a number")?,
            client_url: or("CLIENT_URL", "http://localhost:5173"),
            environment: or("APP_ENV", "development"),
        };

        let jwt_secret = var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters",
                MIN_JWT_SECRET_LEN
            );
        }
        let security = SecurityConfig {
            jwt_secret,
            token_ttl_days: or("TOKEN_TTL_DAYS", "7")
                .parse()
                .context("TOKEN_TTL_DAYS must be a number")?,
        };

        let window = |prefix: &str, max: u32, secs: u64| -> Result<WindowLimit> {
            Ok(WindowLimit {
                max_requests: or(&format!("{}_MAX", prefix), &max.to_string())
                    .parse()
                    .with_context(|| format!("{}_MAX must be a number", prefix))?,
                window_secs: or(&format!("{}_WINDOW_SECS", prefix), &secs.to_string())
                    .parse()
                    .with_context(|| format!("{}_WINDOW_SECS must be a number", prefix))?,
            })
        };
        let limits = RateLimitConfig {
            auth: window("RATE_LIMIT_AUTH", 20, 15 * 60)?,
            score_submit: window("RATE_LIMIT_SUBMIT", 5, 60)?,
            api: window("RATE_LIMIT_API", 100, 15 * 60)?,
            trust_proxy: or("TRUST_PROXY", "false")
                .parse()
                .context("TRUST_PROXY must be true or false")?,
        };

        let puzzle = PuzzleConfig {
            salt: or("PUZZLE_SALT", DEFAULT_SALT),
            cycle_days: var("PUZZLE_CYCLE_DAYS")
                .map(|v| v.parse())
                .transpose()
                .context("PUZZLE_CYCLE_DAYS must be a number")?,
            cycle_anchor: NaiveDate::parse_from_str(
                &or("PUZZLE_CYCLE_ANCHOR", "2024-01-01"),
                daily_puzzle_core::DATE_FORMAT,
            )
            .context("PUZZLE_CYCLE_ANCHOR must be YYYY-MM-DD")?,
            backfill_days: or("SCORE_BACKFILL_DAYS", "30")
                .parse()
                .context("SCORE_BACKFILL_DAYS must be a number")?,
            max_sync_batch: or("MAX_SYNC_BATCH", "50")
                .parse()
                .context("MAX_SYNC_BATCH must be a number")?,
        };

        Ok(Config {
            database,
            server,
            security,
            limits,
            puzzle,
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn is_production(&self) -> bool {
        self.server.environment.eq_ignore_ascii_case("production")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    pub(crate) fn test_config() -> Config {
        Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/daily_puzzle_test"),
            ("JWT_SECRET", "test-secret-value"),
        ]))
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = test_config();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.security.token_ttl_days, 7);
        assert_eq!(config.limits.auth.max_requests, 20);
        assert_eq!(config.limits.score_submit.window_secs, 60);
        assert_eq!(config.limits.api.max_requests, 100);
        assert_eq!(config.puzzle.backfill_days, 30);
        assert_eq!(config.puzzle.max_sync_batch, 50);
        assert!(!config.limits.trust_proxy);
        assert_eq!(config.puzzle.generator().schedule, SeedSchedule::Daily);
        assert!(!config.is_production());
        assert_eq!(config.server_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_missing_database_url_fails() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "long-enough")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_short_jwt_secret_fails() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "short"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("at least 8"));
    }

    #[test]
    fn test_cycle_schedule_from_env() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "long-enough"),
            ("PUZZLE_CYCLE_DAYS", "3"),
            ("PUZZLE_CYCLE_ANCHOR", "2024-05-01"),
            ("RATE_LIMIT_SUBMIT_MAX", "9"),
            ("TRUST_PROXY", "true"),
            ("APP_ENV", "Production"),
        ]))
        .unwrap();
        assert!(config.limits.trust_proxy);
        assert!(matches!(
            config.puzzle.generator().schedule,
            SeedSchedule::Cycle { days: 3, .. }
        ));
        assert_eq!(config.limits.score_submit.max_requests, 9);
        assert!(config.is_production());
    }

    #[test]
    fn test_bad_port_fails() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "long-enough"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_bad_numbers_fail_instead_of_defaulting() {
        for key in ["SCORE_BACKFILL_DAYS", "MAX_SYNC_BATCH", "TRUST_PROXY"] {
            let err = Config::from_lookup(lookup(&[
                ("DATABASE_URL", "postgres://x"),
                ("JWT_SECRET", "long-enough"),
                (key, "lots"),
            ]))
            .unwrap_err();
            assert!(err.to_string().contains(key), "{}", err);
        }
    }
}
