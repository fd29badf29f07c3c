use crate::remote::{FailureKind, RemoteError};
use serde::Serialize;
use thiserror::Error;

/// Error returned by every command, tagged so a front end can branch on `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CommandError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("short link {short_code} was not found or has expired")]
    NotFound { short_code: String },
    #[error("remote service unavailable: {0}")]
    Network(String),
    #[error("local storage error: {0}")]
    Storage(String),
}

impl CommandError {
    pub fn from_remote(err: RemoteError, short_code: &str) -> Self {
        match err.kind() {
            FailureKind::NotFound => Self::NotFound {
                short_code: short_code.to_string(),
            },
            FailureKind::Validation => Self::Validation(err.to_string()),
            FailureKind::Serialization => Self::Storage(err.to_string()),
            FailureKind::Network => Self::Network(err.to_string()),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Network(_) => FailureKind::Network,
            Self::Storage(_) => FailureKind::Serialization,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Short text for a notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => format!("Please check your input: {msg}"),
            Self::NotFound { .. } => {
                "This link was not found or has expired; it was removed from your history.".to_string()
            }
            Self::Network(_) => "Could not load data from the server. Please try again.".to_string(),
            Self::Storage(_) => "Could not access local storage.".to_string(),
        }
    }
}
