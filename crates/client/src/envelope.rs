//! Response envelope and error body shapes used by the platform API.
//!
//! Success bodies look like `{ "success": true, "data": ..., "message": ... }`;
//! error bodies carry a `message` (or `error`) string and, for 2FA
//! challenges, `requires2FA: true`.

use serde::Deserialize;

/// Shown when the server gives no usable error message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, rename = "requires2FA")]
    pub requires_2fa: bool,
}

impl ErrorBody {
    /// Parse an error body, tolerating non-JSON text.
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// First non-blank message the server supplied.
    pub fn message(&self) -> Option<String> {
        [&self.message, &self.error]
            .into_iter()
            .flatten()
            .map(|m| m.trim())
            .find(|m| !m.is_empty())
            .map(str::to_string)
    }
}
