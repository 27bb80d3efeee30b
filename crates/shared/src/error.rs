//! Error taxonomy for capture, dispatch and persistence.

use thiserror::Error;

use crate::notice::Notice;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SummarizeError {
    /// Input rejected locally; the endpoint was never contacted.
    #[error("{0}")]
    Validation(String),

    /// The endpoint answered, but not with a usable summary.
    #[error("API Error: {}", remote_label(.status, .message))]
    Remote {
        status: Option<u16>,
        message: String,
    },

    /// No response was obtained at all.
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Storage error: {0}")]
    Persistence(String),
}

fn remote_label(status: &Option<u16>, message: &str) -> String {
    match (status, message.trim().is_empty()) {
        (Some(code), true) => code.to_string(),
        (Some(code), false) => format!("{} - {}", code, message),
        (None, _) => message.to_string(),
    }
}

impl SummarizeError {
    pub fn validation(message: impl Into<String>) -> Self {
        SummarizeError::Validation(message.into())
    }

    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        SummarizeError::Remote {
            status: Some(status),
            message: message.into(),
        }
    }

    /// HTTP status carried by a remote error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SummarizeError::Remote { status, .. } => *status,
            _ => None,
        }
    }

    /// User-facing notice for this error.
    pub fn to_notice(&self) -> Notice {
        match self {
            SummarizeError::Validation(msg) => Notice::error("No text provided", msg.clone()),
            SummarizeError::Persistence(msg) => Notice::error("Storage unavailable", msg.clone()),
            other => Notice::error("Error generating summary", other.to_string()),
        }
    }
}
