//! Persisted value records: credential, pending selection, summary history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API token for the summarization endpoint.
///
/// Never validated locally; a bad token only shows up as a failed remote call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Trimmed credential, or `None` when blank.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Text captured from a selection and staged for the next request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingSelection {
    pub text: String,
}

impl PendingSelection {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// One successful summarization. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Creation time in epoch milliseconds.
    pub id: String,
    pub text: String,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

impl SummaryRecord {
    pub fn new(text: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::at(Utc::now(), text, summary)
    }

    pub fn at(timestamp: DateTime<Utc>, text: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: timestamp.timestamp_millis().to_string(),
            text: text.into(),
            summary: summary.into(),
            timestamp,
        }
    }

    /// Case-insensitive match against the original text or the summary.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.text.to_lowercase().contains(&q) || self.summary.to_lowercase().contains(&q)
    }
}

/// Cut `text` to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
