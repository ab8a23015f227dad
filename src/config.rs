use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::scheduling::service::DEFAULT_REPORT_WINDOW_DAYS;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_level: tracing::Level,
    pub run_migrations: bool,
    pub report_window_days: u32,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Reads the process environment. `.env` is loaded by `main` first.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: or_default("ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: or_default("REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: or_default("RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: or_default("RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: or_default("RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_level: or_default("LOG_LEVEL", tracing::Level::DEBUG)?,
            run_migrations: or_default("RUN_MIGRATIONS", false)?,
            report_window_days: or_default("REPORT_WINDOW_DAYS", DEFAULT_REPORT_WINDOW_DAYS)?,
        })
    }

    /// Settings for tests: no database, short-lived tokens.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: String::new(),
            jwt_secret: jwt_secret.to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            access_token_ttl: 300,
            refresh_token_ttl: 600,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            log_level: tracing::Level::DEBUG,
            run_migrations: false,
            report_window_days: DEFAULT_REPORT_WINDOW_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_and_bad_values_are_reported() {
        assert_eq!(or_default("AGENCY_DESK_TEST_UNSET_KEY", 42u32).unwrap(), 42);

        // SAFETY: this test is the only reader of this key.
        unsafe { env::set_var("AGENCY_DESK_TEST_BAD_TTL", "soon") };
        let err = or_default::<usize>("AGENCY_DESK_TEST_BAD_TTL", 900).unwrap_err();
        assert!(err.to_string().contains("AGENCY_DESK_TEST_BAD_TTL"));

        unsafe { env::set_var("AGENCY_DESK_TEST_LEVEL", "info") };
        assert_eq!(
            or_default("AGENCY_DESK_TEST_LEVEL", tracing::Level::DEBUG).unwrap(),
            tracing::Level::INFO
        );
    }
}
