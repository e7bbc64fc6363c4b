use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConsoleError;

pub const DEFAULT_API_URL: &str = "http://localhost:4000/api";
pub const DEFAULT_DRAFT_DIR: &str = ".stakeboard";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Console configuration loaded from environment variables.
///
/// Command-line flags in the binary override the URL, token and 2FA code.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the platform API.
    pub api_url: String,
    /// Admin session token, passed through as a bearer token.
    pub api_token: Option<String>,
    /// Fixed 2FA code for non-interactive use.
    pub two_factor_code: Option<String>,
    /// Directory holding the local draft cache.
    pub draft_dir: PathBuf,
    /// HTTP request timeout.
    pub request_timeout: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            two_factor_code: None,
            draft_dir: PathBuf::from(DEFAULT_DRAFT_DIR),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ConsoleConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                     |
    /// |-------------------------|-----------------------------|
    /// | `STAKEBOARD_API_URL`    | `http://localhost:4000/api` |
    /// | `STAKEBOARD_API_TOKEN`  | --                          |
    /// | `STAKEBOARD_2FA_CODE`   | --                          |
    /// | `STAKEBOARD_DRAFT_DIR`  | `.stakeboard`               |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                        |
    pub fn from_env() -> Result<Self, ConsoleError> {
        let defaults = Self::default();

        let request_timeout = match non_empty_var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    ConsoleError::Config(format!(
                        "REQUEST_TIMEOUT_SECS must be a valid u64, got '{raw}'"
                    ))
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.request_timeout,
        };

        Ok(Self {
            api_url: non_empty_var("STAKEBOARD_API_URL").unwrap_or(defaults.api_url),
            api_token: non_empty_var("STAKEBOARD_API_TOKEN"),
            two_factor_code: non_empty_var("STAKEBOARD_2FA_CODE"),
            draft_dir: non_empty_var("STAKEBOARD_DRAFT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.draft_dir),
            request_timeout,
        })
    }
}
