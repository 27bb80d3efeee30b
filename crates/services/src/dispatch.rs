//! One summarization request per submit.

use shared::error::SummarizeError;
use shared::records::{truncate_chars, Credential, SummaryRecord};
use shared::settings::SummarizerSettings;
use shared::summarizer::Summarizer;
use std::sync::Arc;

use crate::history::SummaryHistory;
use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub summary: String,
    /// Present when history is enabled.
    pub record: Option<SummaryRecord>,
}

pub struct Dispatcher {
    summarizer: Arc<dyn Summarizer>,
    storage: Storage,
    history: Option<SummaryHistory>,
    max_input_chars: usize,
}

impl Dispatcher {
    pub fn new(summarizer: Arc<dyn Summarizer>, storage: Storage, settings: &SummarizerSettings) -> Self {
        let history = settings
            .history_enabled
            .then(|| SummaryHistory::new(storage.clone()));
        Self {
            summarizer,
            storage,
            history,
            max_input_chars: settings.max_input_chars,
        }
    }

    /// Trim and bound the input, rejecting blank text.
    pub fn prepare<'a>(&self, text: &'a str) -> Result<&'a str, SummarizeError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SummarizeError::validation(
                "Please enter some text to summarize",
            ));
        }
        Ok(truncate_chars(trimmed, self.max_input_chars))
    }

    /// Run one request. On success history is appended and the pending
    /// selection is cleared if it is the text that was sent.
    pub async fn dispatch(
        &self,
        text: &str,
        credential: &Credential,
    ) -> Result<DispatchOutcome, SummarizeError> {
        let input = self.prepare(text)?;
        let summary = self.summarizer.summarize(input, credential).await?;

        if self.storage.clear_pending_if(text).await {
            tracing::debug!("pending selection consumed");
        }

        let record = match &self.history {
            Some(history) => Some(history.append(input, &summary).await),
            None => None,
        };

        tracing::info!(chars = summary.chars().count(), "summary generated");
        Ok(DispatchOutcome { summary, record })
    }
}
