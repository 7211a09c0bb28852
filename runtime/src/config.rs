//! Scraper configuration: secrets and tunables from the environment.
//!
//! Secrets come from `USER_ID` and `PASSWORD`. A local `.env` file is loaded
//! first when present; variables already set in the process take priority.

use crate::renderer::chromium::LaunchOptions;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PORTAL_URL: &str = "https://intranet.wiut.uz/UserModuleMaterials";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_MIN_DELAY_MS: u64 = 2_000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 3_000;

pub const USER_ID_VAR: &str = "USER_ID";
pub const PASSWORD_VAR: &str = "PASSWORD";

/// Configuration failures, all fatal at startup.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("required secret {0} is not set (export it or add it to .env)")]
    MissingSecret(&'static str),

    #[error("failed to load env file {}: {source}", .path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// Portal login credentials. Both fields are secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_id: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything one scrape run needs to know.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub credentials: Credentials,
    pub portal_url: String,
    pub data_dir: PathBuf,
    /// Bound for every explicit wait on the page.
    pub wait_timeout: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub browser: LaunchOptions,
    /// Run the external formatter after a successful scrape.
    pub run_formatter: bool,
}

impl ScraperConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Credentials {
            user_id: require_secret(&lookup, USER_ID_VAR)?,
            password: require_secret(&lookup, PASSWORD_VAR)?,
        };

        let non_blank = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            credentials,
            portal_url: non_blank("LMS_PORTAL_URL").unwrap_or_else(|| DEFAULT_PORTAL_URL.to_string()),
            data_dir: non_blank("LMS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            wait_timeout: Duration::from_secs(
                non_blank("LMS_WAIT_TIMEOUT_SECS")
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_WAIT_TIMEOUT_SECS),
            ),
            min_delay: Duration::from_millis(DEFAULT_MIN_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            browser: LaunchOptions {
                chrome_path: non_blank("LMS_CHROMIUM_PATH").map(PathBuf::from),
                headless: true,
            },
            run_formatter: true,
        })
    }
}

fn require_secret<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingSecret(name)),
    }
}

/// Load variables from an env file into the process environment.
///
/// With no explicit path, `./.env` is used if it exists; its absence is not
/// an error. An explicit path must exist. Returns the file that was loaded.
pub fn load_env_file(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match explicit {
        Some(path) => {
            dotenvy::from_path(path).map_err(|source| ConfigError::EnvFile {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.not_found() => Ok(None),
            Err(source) => Err(ConfigError::EnvFile {
                path: PathBuf::from(".env"),
                source,
            }),
        },
    }
}
