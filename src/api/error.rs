use thiserror::Error;

use crate::session::RefreshError;

/// Shown when the backend gave us nothing better to display.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// Result type alias for the API client.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Everything the client cannot resolve on its own ends up here.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was received (connection refused, timeout, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// The backend refused a request that already went through one refresh.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The refresh exchange failed; the session is gone.
    #[error("Session refresh failed: {0}")]
    Refresh(#[from] RefreshError),

    /// Domain or validation failure reported by the backend.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The response could not be decoded into the expected shape.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// The called feature is switched off in the configuration.
    #[error("Feature disabled: {0}")]
    FeatureDisabled(&'static str),
}

impl ClientError {
    /// The message the UI layer should present to the user.
    pub fn display_message(&self) -> String {
        match self {
            ClientError::Network(_) => "Unable to reach the server".to_string(),
            ClientError::Unauthorized { message } | ClientError::Api { message, .. } => {
                message.clone()
            }
            ClientError::Refresh(err) => err.message.clone(),
            ClientError::Decode(_) => GENERIC_ERROR_MESSAGE.to_string(),
            ClientError::FeatureDisabled(feature) => {
                format!("{} is currently unavailable", feature)
            }
        }
    }

    /// HTTP status associated with the failure, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized { .. } => Some(401),
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Refresh(err) => err.status,
            _ => None,
        }
    }

    /// Replaces the generic fallback message with a more specific one.
    pub fn or_message(self, fallback: &str) -> Self {
        match self {
            ClientError::Api { status, message } if message == GENERIC_ERROR_MESSAGE => {
                ClientError::Api {
                    status,
                    message: fallback.to_string(),
                }
            }
            ClientError::Unauthorized { message } if message == GENERIC_ERROR_MESSAGE => {
                ClientError::Unauthorized {
                    message: fallback.to_string(),
                }
            }
            other => other,
        }
    }
}
