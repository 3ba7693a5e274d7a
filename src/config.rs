//! Runtime configuration.
//!
//! Loaded once at startup from the environment (after `.env.local` /
//! `.env`) and passed by reference to `MenuClient`.
//!
//!   MENU_SCAN_BASE_URL              backend origin (default http://localhost:3000)
//!   MENU_SCAN_LANGUAGE              user language, resolved against the supported set
//!   MENU_SCAN_TIMEOUT_SECS          whole-request timeout (default 120)
//!   MENU_SCAN_CONNECT_TIMEOUT_SECS  connect timeout (default 10)

use std::time::Duration;

use crate::language;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    /// Resolved language code, always one of `SUPPORTED_LANGUAGES`.
    pub user_language: &'static str,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("MENU_SCAN_BASE_URL must start with http:// or https://, got: {0}")]
    InvalidBaseUrl(String),
    #[error("{var} must be a positive whole number of seconds, got: {value}")]
    InvalidTimeout { var: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_language: language::DEFAULT_LANGUAGE,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Read the process environment, loading env files first.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_env_files();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_url = match get("MENU_SCAN_BASE_URL") {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                url.trim_end_matches('/').to_string()
            }
            Some(url) => return Err(ConfigError::InvalidBaseUrl(url)),
            None => DEFAULT_BASE_URL.to_string(),
        };

        let user_language = match get("MENU_SCAN_LANGUAGE") {
            Some(tag) => {
                let resolved = language::resolve(&tag).code;
                if resolved != tag {
                    log::info!("[CONFIG] Language '{}' resolved to '{}'", tag, resolved);
                }
                resolved
            }
            None => language::DEFAULT_LANGUAGE,
        };

        let request_timeout = seconds(&get, "MENU_SCAN_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let connect_timeout = seconds(
            &get,
            "MENU_SCAN_CONNECT_TIMEOUT_SECS",
            DEFAULT_CONNECT_TIMEOUT_SECS,
        )?;

        Ok(Self {
            base_url,
            user_language,
            request_timeout,
            connect_timeout,
        })
    }
}

fn seconds<G>(get: &G, var: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(Duration::from_secs(default)),
        Some(value) => match value.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::InvalidTimeout { var, value }),
        },
    }
}

/// Load `.env.local`, else `.env`, from the working directory.
pub fn load_env_files() {
    for env_file in [".env.local", ".env"] {
        let path = std::path::Path::new(env_file);
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(_) => log::info!("[CONFIG] Loaded {}", path.display()),
                Err(e) => log::warn!("[CONFIG] Failed to load {}: {}", path.display(), e),
            }
            break;
        }
    }
}
