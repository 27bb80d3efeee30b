//! Summary history, persisted as one JSON array in the local tier.
//!
//! Newest first, append-only, no dedup and no cap. Only a bulk clear removes
//! entries.

use serde_json::Value;
use shared::keys;
use shared::records::SummaryRecord;

use crate::storage::{Storage, Tier};

#[derive(Clone)]
pub struct SummaryHistory {
    storage: Storage,
}

impl SummaryHistory {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// All records, most recent first. Unreadable data counts as empty.
    pub async fn list(&self) -> Vec<SummaryRecord> {
        let Some(value) = self.storage.get(Tier::Local, keys::SUMMARIES).await else {
            return Vec::new();
        };
        match serde_json::from_value::<Vec<SummaryRecord>>(value) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("ignoring unreadable summary history: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn search(&self, query: &str) -> Vec<SummaryRecord> {
        self.list()
            .await
            .into_iter()
            .filter(|r| r.matches(query))
            .collect()
    }

    /// Record a new summary at the front of the list.
    pub async fn append(&self, text: &str, summary: &str) -> SummaryRecord {
        let record = SummaryRecord::new(text, summary);
        self.push(record.clone()).await;
        record
    }

    pub async fn push(&self, record: SummaryRecord) {
        let mut records = self.list().await;
        records.insert(0, record);
        match serde_json::to_value(&records) {
            Ok(value) => {
                self.storage.set(Tier::Local, keys::SUMMARIES, value).await;
            }
            Err(e) => tracing::warn!("failed to encode summary history: {}", e),
        }
    }

    /// Drop every record and the persisted key itself.
    pub async fn clear(&self) -> bool {
        self.storage.remove(Tier::Local, keys::SUMMARIES).await
    }

    pub async fn len(&self) -> usize {
        self.list().await.len()
    }

    /// Raw persisted value, mostly useful to check the key is really gone.
    pub async fn raw(&self) -> Option<Value> {
        self.storage.get(Tier::Local, keys::SUMMARIES).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_append_orders_most_recent_first() {
        let history = SummaryHistory::new(Storage::in_memory());
        let base = Utc::now();
        for i in 0..3 {
            history
                .push(SummaryRecord::at(
                    base + Duration::milliseconds(i),
                    format!("text {}", i),
                    format!("summary {}", i),
                ))
                .await;
        }

        let list = history.list().await;
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].text, "text 2");
        assert_eq!(list[2].text, "text 0");
    }

    #[tokio::test]
    async fn test_no_dedup() {
        let history = SummaryHistory::new(Storage::in_memory());
        history.append("same", "same summary").await;
        history.append("same", "same summary").await;
        assert_eq!(history.len().await, 2);
    }

    #[tokio::test]
    async fn test_clear_removes_key() {
        let history = SummaryHistory::new(Storage::in_memory());
        history.append("a", "b").await;
        assert!(history.raw().await.is_some());

        assert!(history.clear().await);
        assert!(history.list().await.is_empty());
        assert!(history.raw().await.is_none());
    }

    #[tokio::test]
    async fn test_search_filters() {
        let history = SummaryHistory::new(Storage::in_memory());
        history.append("Rust ownership rules", "borrowing").await;
        history.append("Cooking pasta", "boil water").await;

        let hits = history.search("RUST").await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].summary, "borrowing");
        assert_eq!(history.search("").await.len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_history_reads_empty() {
        let storage = Storage::in_memory();
        storage
            .set(Tier::Local, keys::SUMMARIES, Value::from("not an array"))
            .await;
        let history = SummaryHistory::new(storage);
        assert!(history.list().await.is_empty());
        history.append("x", "y").await;
        assert_eq!(history.len().await, 1);
    }
}
