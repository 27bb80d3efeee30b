//! Selection capture: stage selected text for the next summary.
//!
//! Capture starts inactive and is toggled by the user. While active, every
//! selection whose trimmed length exceeds the threshold replaces the pending
//! selection in the local tier. Nothing here touches the network.

use shared::messages::ExtMessage;
use shared::notice::Notice;
use shared::records::PendingSelection;

use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Capture is switched off.
    Inactive,
    /// Trimmed text at or below the threshold; nothing written.
    TooShort { chars: usize },
    Captured {
        text: String,
        chars: usize,
        /// False when the store rejected the write.
        stored: bool,
    },
}

impl CaptureOutcome {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            CaptureOutcome::Captured { chars, .. } => Some(Notice::selection_captured(*chars)),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<ExtMessage> {
        match self {
            CaptureOutcome::Captured { text, chars, .. } => Some(ExtMessage::SelectionCaptured {
                text: text.clone(),
                chars: *chars,
            }),
            _ => None,
        }
    }
}

pub struct SelectionCapture {
    storage: Storage,
    min_chars: usize,
    active: bool,
}

impl SelectionCapture {
    pub fn new(storage: Storage, min_chars: usize) -> Self {
        Self {
            storage,
            min_chars,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Flip the capture state and describe the change.
    pub fn toggle(&mut self) -> Notice {
        self.set_active(!self.active)
    }

    pub fn set_active(&mut self, active: bool) -> Notice {
        self.active = active;
        tracing::info!(active, "selection capture toggled");
        Notice::capture_toggled(active)
    }

    /// Handle the current selection after a pointer or key release.
    pub async fn on_selection(&self, raw: &str) -> CaptureOutcome {
        if !self.active {
            return CaptureOutcome::Inactive;
        }

        let pending = PendingSelection::new(raw.trim());
        let chars = pending.char_count();
        if chars <= self.min_chars {
            return CaptureOutcome::TooShort { chars };
        }

        let stored = self.storage.save_pending(&pending).await;
        if stored {
            tracing::info!(chars, "selection saved");
        }
        CaptureOutcome::Captured {
            text: pending.text,
            chars,
            stored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::CountingStore;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn counting_capture() -> (SelectionCapture, Storage, Arc<CountingStore>) {
        let local = Arc::new(CountingStore::default());
        let storage = Storage::new(Arc::new(MemoryStore::new()), local.clone());
        let mut capture = SelectionCapture::new(storage.clone(), 10);
        capture.set_active(true);
        (capture, storage, local)
    }

    #[tokio::test]
    async fn test_inactive_by_default() {
        let capture = SelectionCapture::new(Storage::in_memory(), 10);
        assert!(!capture.is_active());
        assert_eq!(
            capture.on_selection("a long enough selection").await,
            CaptureOutcome::Inactive
        );
    }

    #[tokio::test]
    async fn test_short_selection_not_written() {
        let (capture, storage, local) = counting_capture();
        for s in ["", "   ", "exactly10!", "  0123456789  "] {
            let outcome = capture.on_selection(s).await;
            assert!(matches!(outcome, CaptureOutcome::TooShort { .. }), "{:?}", s);
            assert!(outcome.notice().is_none());
        }
        assert_eq!(local.writes(), 0);
        assert!(storage.load_pending().await.is_none());
    }

    #[tokio::test]
    async fn test_long_selection_written_trimmed_once() {
        let (capture, storage, local) = counting_capture();
        let outcome = capture.on_selection("  eleven char  ").await;
        assert_eq!(
            outcome,
            CaptureOutcome::Captured {
                text: "eleven char".to_string(),
                chars: 11,
                stored: true,
            }
        );
        assert_eq!(local.writes(), 1);
        assert_eq!(storage.load_pending().await.unwrap().text, "eleven char");
        assert!(outcome.notice().unwrap().title.contains("11 characters"));
    }

    #[tokio::test]
    async fn test_later_selection_overwrites() {
        let (capture, storage, local) = counting_capture();
        capture.on_selection("the first selected text").await;
        capture.on_selection("the second selected text").await;
        assert_eq!(local.writes(), 2);
        assert_eq!(
            storage.load_pending().await.unwrap().text,
            "the second selected text"
        );
    }

    #[tokio::test]
    async fn test_toggle_round_trip() {
        let mut capture = SelectionCapture::new(Storage::in_memory(), 10);
        let on = capture.toggle();
        assert!(capture.is_active());
        assert!(on.title.contains("activated"));
        let off = capture.toggle();
        assert!(!capture.is_active());
        assert!(off.title.contains("deactivated"));
    }

    #[tokio::test]
    async fn test_captured_message_is_valid() {
        let (capture, _, _) = counting_capture();
        let outcome = capture.on_selection("héllo wörld, again").await;
        let msg = outcome.message().unwrap();
        assert!(msg.validate().is_ok());
    }
}
