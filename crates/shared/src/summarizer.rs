use async_trait::async_trait;

use crate::error::SummarizeError;
use crate::records::Credential;

/// Anything that can turn text into a summary with one remote call.
///
/// Note: Uses async_trait for object safety
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, credential: &Credential)
        -> Result<String, SummarizeError>;
}
