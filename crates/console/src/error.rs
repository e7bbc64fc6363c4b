use stakeboard_client::DistributionApiError;
use stakeboard_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] DistributionApiError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Draft cache error: {0}")]
    Draft(String),
}

impl ConsoleError {
    /// Text to show the admin in a toast.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
