use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

const DEV_JWT_SECRET: &str = "millet-market-dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid { key: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expire_days: i64,
    pub bcrypt_cost: u32,
    pub upload_dir: PathBuf,
    pub max_file_size: usize,
    pub frontend_url: String,
    /// Snapshot directory; `None` keeps every collection in memory only.
    pub data_dir: Option<PathBuf>,
    pub seed_demo_data: bool,
    pub actor_buffer: usize,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            host: try_load("MARKET_HOST", "0.0.0.0")?,
            port: try_load("MARKET_PORT", "5000")?,
            jwt_secret: load_secret("JWT_SECRET"),
            jwt_expire_days: try_load("JWT_EXPIRE_DAYS", "7")?,
            bcrypt_cost: try_load("BCRYPT_COST", "10")?,
            upload_dir: try_load("UPLOAD_DIR", "./uploads")?,
            max_file_size: try_load("MAX_FILE_SIZE", "5242880")?,
            frontend_url: try_load("FRONTEND_URL", "http://localhost:3000")?,
            data_dir: env::var("DATA_DIR").ok().filter(|v| !v.is_empty()).map(PathBuf::from),
            seed_demo_data: try_load("SEED_DEMO_DATA", "false")?,
            actor_buffer: try_load("ACTOR_BUFFER", "32")?,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid { key, value: value.clone(), reason: e.to_string() }
    })
}

/// Environment first, then a mounted secret file, then the development
/// default.
fn load_secret(name: &str) -> String {
    if let Ok(value) = env::var(name) {
        if !value.is_empty() {
            return value;
        }
    }
    let path = format!("/run/secrets/{name}");
    match read_to_string(&path) {
        Ok(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => {
            warn!("{name} not configured, using development secret");
            DEV_JWT_SECRET.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_invalid_values() {
        let port: u16 = try_load("MILLET_TEST_UNSET_PORT", "5000").unwrap();
        assert_eq!(port, 5000);

        let result: Result<u16, _> = try_load("MILLET_TEST_UNSET_BAD", "not-a-port");
        assert!(matches!(result, Err(ConfigError::Invalid { key: "MILLET_TEST_UNSET_BAD", .. })));
    }
}
