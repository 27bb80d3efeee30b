//! Messages crossing the watcher / popup / worker boundary.

use serde::{Deserialize, Serialize};

use crate::error::SummarizeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtMessage {
    /// Popup asks the worker for one summary.
    Summarize { text: String, credential: String },
    /// Watcher staged a new pending selection.
    SelectionCaptured { text: String, chars: usize },
    /// Capture switched on or off.
    CaptureToggled { active: bool },
    SummaryReady { summary: String },
    SummaryFailed { error: String },
}

impl ExtMessage {
    /// Parse and validate a message from its JSON form.
    pub fn from_json(raw: &str) -> Result<Self, SummarizeError> {
        let msg: ExtMessage = serde_json::from_str(raw).map_err(|e| {
            tracing::debug!("rejected message: {}", e);
            SummarizeError::validation(format!("invalid message: {}", e))
        })?;
        msg.validate()?;
        Ok(msg)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), SummarizeError> {
        match self {
            ExtMessage::Summarize { credential, .. } if credential.trim().is_empty() => Err(
                SummarizeError::validation("summarize message carries no credential"),
            ),
            ExtMessage::SelectionCaptured { text, chars } if text.chars().count() != *chars => {
                Err(SummarizeError::validation(
                    "selection length does not match its text",
                ))
            }
            _ => Ok(()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ExtMessage::Summarize { .. } => "summarize",
            ExtMessage::SelectionCaptured { .. } => "selection_captured",
            ExtMessage::CaptureToggled { .. } => "capture_toggled",
            ExtMessage::SummaryReady { .. } => "summary_ready",
            ExtMessage::SummaryFailed { .. } => "summary_failed",
        }
    }
}
