use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

use tracing::info;

use crate::error::{AppError, Result};

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub addr: SocketAddr,
    /// Mark the session cookie `Secure`. Leave off for plain-HTTP development.
    pub secure_cookies: bool,
    pub session_ttl_days: i64,
    pub session_cleanup_secs: u64,
    /// Display name injected into every rendered page.
    pub app_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://wanderlust.db?mode=rwc".into(),
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            secure_cookies: false,
            session_ttl_days: 7,
            session_cleanup_secs: 3600,
            app_name: "Wanderlust".into(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let host: String = try_load("HOST", "127.0.0.1".to_string())?;
        let port: u16 = try_load("PORT", defaults.addr.port())?;
        let addr = format!("{host}:{port}")
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST/PORT: {e}")))?;

        Ok(Self {
            database_url: try_load("DATABASE_URL", defaults.database_url)?,
            addr,
            secure_cookies: try_load("SESSION_SECURE", defaults.secure_cookies)?,
            session_ttl_days: try_load("SESSION_TTL_DAYS", defaults.session_ttl_days)?,
            session_cleanup_secs: try_load("SESSION_CLEANUP_SECS", defaults.session_cleanup_secs)?,
            app_name: try_load("APP_NAME", defaults.app_name)?,
        })
    }
}

fn try_load<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("invalid {key} value: {e}"))),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_keys_fall_back() {
        let ttl: i64 = try_load("WANDERLUST_TEST_UNSET_TTL", 7).unwrap();
        assert_eq!(ttl, 7);
    }

    #[test]
    fn unparsable_value_is_an_error() {
        env::set_var("WANDERLUST_TEST_BAD_PORT", "eighty");
        let port: Result<u16> = try_load("WANDERLUST_TEST_BAD_PORT", 8080);
        assert!(matches!(port, Err(AppError::Config(_))));
    }
}
