//! State management for the ParaSummarizer popup
//!
//! `PopupState` is the UI state machine and does no I/O. `AppState` wires it
//! to storage, the background worker and the selection watcher.

use shared::error::SummarizeError;
use shared::messages::ExtMessage;
use shared::notice::{Notice, NoticeBoard};
use shared::records::{Credential, PendingSelection, SummaryRecord};
use shared::settings::SummarizerSettings;
use shared::summarizer::Summarizer;
use services::dispatch::Dispatcher;
use services::history::SummaryHistory;
use services::storage::Storage;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use crate::types::*;
use crate::utils::{copy_to_clipboard, format_error_message};
use crate::watcher::WatcherHandle;
use crate::worker::spawn_worker;

pub struct PopupState {
    mode: UiMode,
    credential: Option<Credential>,
    pub tab: Tab,
    pub input_text: String,
    pub summary: String,
    pub setup: SetupForm,
    pub notices: NoticeBoard,
    /// Saved summaries matching `history_query`, newest first.
    pub history: Vec<SummaryRecord>,
    pub history_query: String,
    pub capture_active: bool,
    /// Last selection placed in the input, to tell it apart from typed text.
    last_captured: Option<String>,
    max_input_chars: usize,
}

impl PopupState {
    pub fn new(max_input_chars: usize) -> Self {
        Self {
            mode: UiMode::Loading,
            credential: None,
            tab: Tab::default(),
            input_text: String::new(),
            summary: String::new(),
            setup: SetupForm::default(),
            notices: NoticeBoard::new(),
            history: Vec::new(),
            history_query: String::new(),
            capture_active: false,
            last_captured: None,
            max_input_chars,
        }
    }

    pub fn mode(&self) -> UiMode {
        self.mode
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    fn set_mode(&mut self, mode: UiMode) {
        if self.mode != mode {
            tracing::debug!(from = self.mode.as_str(), to = mode.as_str(), "ui mode");
            self.mode = mode;
        }
    }

    /// Whether a captured selection may replace the current input.
    fn input_is_replaceable(&self) -> bool {
        self.mode != UiMode::Submitting
            && (self.input_text.trim().is_empty()
                || self.last_captured.as_deref() == Some(self.input_text.as_str()))
    }

    fn adopt_selection(&mut self, text: String) {
        self.input_text = text.clone();
        self.last_captured = Some(text);
    }

    /// `Loading` resolves once the stored credential has been read.
    pub fn credential_loaded(&mut self, credential: Option<Credential>) {
        if self.mode != UiMode::Loading {
            return;
        }
        self.set_mode(if credential.is_some() {
            UiMode::Ready
        } else {
            UiMode::SetupRequired
        });
        self.credential = credential;
    }

    pub fn credential_saved(&mut self, credential: Credential) {
        self.credential = Some(credential);
        self.setup = SetupForm::default();
        self.set_mode(UiMode::Ready);
        self.notices.push(Notice::success(
            "API key saved",
            "You can start summarizing text.",
        ));
    }

    /// Settings view for credential rotation. Only reachable from `Ready`.
    pub fn open_settings(&mut self) {
        if self.mode != UiMode::Ready {
            return;
        }
        self.setup = SetupForm {
            key_input: self
                .credential
                .as_ref()
                .map(|c| c.expose().to_string())
                .unwrap_or_default(),
            reveal: false,
            is_update: true,
        };
        self.set_mode(UiMode::SetupRequired);
    }

    pub fn cancel_settings(&mut self) {
        if self.mode == UiMode::SetupRequired && self.credential.is_some() {
            self.setup = SetupForm::default();
            self.set_mode(UiMode::Ready);
        }
    }

    /// Pre-fill the input with a staged selection, never clobbering typed text.
    pub fn pending_loaded(&mut self, pending: Option<PendingSelection>) {
        if let Some(pending) = pending {
            if self.input_is_replaceable() {
                self.adopt_selection(pending.text);
            }
        }
    }

    pub fn can_submit(&self) -> bool {
        self.mode == UiMode::Ready && self.credential.is_some()
    }

    /// `Ready → Submitting`. Returns the message for the worker.
    pub fn begin_submit(&mut self) -> Result<ExtMessage, SummarizeError> {
        if self.mode == UiMode::Submitting {
            return Err(SummarizeError::validation("A summary is already in progress"));
        }
        let Some(credential) = self.credential.clone() else {
            return Err(SummarizeError::validation("No API key configured"));
        };
        if !self.can_submit() {
            return Err(SummarizeError::validation("Not ready to summarize"));
        }
        if self.input_text.trim().is_empty() {
            let err = SummarizeError::validation("Please enter some text to summarize");
            self.notices.push(err.to_notice());
            return Err(err);
        }

        self.summary.clear();
        self.set_mode(UiMode::Submitting);
        Ok(ExtMessage::Summarize {
            text: self.input_text.clone(),
            credential: credential.expose().to_string(),
        })
    }

    /// `Submitting → Ready`, whatever the outcome.
    pub fn finish_submit(&mut self, result: Result<String, String>) {
        match result {
            Ok(summary) => {
                self.summary = summary;
                self.notices.push(Notice::success(
                    "Summary generated!",
                    "Your text has been successfully summarized",
                ));
            }
            Err(error) => {
                self.notices.push(Notice::error(
                    "Error generating summary",
                    format_error_message(&error),
                ));
            }
        }
        self.set_mode(UiMode::Ready);
    }

    /// React to a message from the worker or the watcher.
    pub fn apply_message(&mut self, msg: ExtMessage) {
        match msg {
            ExtMessage::SummaryReady { summary } => self.finish_submit(Ok(summary)),
            ExtMessage::SummaryFailed { error } => self.finish_submit(Err(error)),
            ExtMessage::SelectionCaptured { text, chars } => {
                if self.input_is_replaceable() {
                    self.adopt_selection(text);
                }
                self.notices.push(Notice::selection_captured(chars));
            }
            ExtMessage::CaptureToggled { active } => {
                self.capture_active = active;
                self.notices.push(Notice::capture_toggled(active));
            }
            ExtMessage::Summarize { .. } => {
                tracing::warn!("popup received a summarize request; ignoring");
            }
        }
    }

    /// Load a past input back into the editor.
    pub fn reuse_text(&mut self, text: String) {
        if self.mode == UiMode::Submitting {
            return;
        }
        self.input_text = text;
        self.summary.clear();
        self.tab = Tab::Summarize;
    }

    pub fn char_counter(&self) -> String {
        format!(
            "{}/{} characters",
            self.input_text.chars().count(),
            self.max_input_chars
        )
    }
}

/// Popup state plus the plumbing around it.
pub struct AppState {
    pub popup: PopupState,
    pub settings: SummarizerSettings,
    storage: Storage,
    history: SummaryHistory,
    rt: tokio::runtime::Runtime,
    worker_tx: Sender<ExtMessage>,
    inbox_tx: Sender<ExtMessage>,
    inbox: Receiver<ExtMessage>,
    watcher: Option<WatcherHandle>,
}

impl AppState {
    pub fn new(
        settings: SummarizerSettings,
        storage: Storage,
        summarizer: Arc<dyn Summarizer>,
    ) -> anyhow::Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (inbox_tx, inbox) = channel();
        let dispatcher = Dispatcher::new(summarizer, storage.clone(), &settings);
        let worker_tx = spawn_worker(dispatcher, inbox_tx.clone())?;

        Ok(Self {
            popup: PopupState::new(settings.max_input_chars),
            history: SummaryHistory::new(storage.clone()),
            settings,
            storage,
            rt,
            worker_tx,
            inbox_tx,
            inbox,
            watcher: None,
        })
    }

    /// Attach the selection watcher; its messages arrive through the inbox.
    pub fn attach_watcher(
        &mut self,
        make: impl FnOnce(Storage, Sender<ExtMessage>) -> anyhow::Result<WatcherHandle>,
    ) {
        match make(self.storage.clone(), self.inbox_tx.clone()) {
            Ok(handle) => self.watcher = Some(handle),
            Err(e) => tracing::warn!("selection watcher unavailable: {}", e),
        }
    }

    /// Read credential, pending selection and history. Called on mount.
    pub fn load(&mut self) {
        let credential = self.rt.block_on(self.storage.load_credential());
        self.popup.credential_loaded(credential);
        let pending = self.rt.block_on(self.storage.load_pending());
        self.popup.pending_loaded(pending);
        self.refresh_history();
    }

    pub fn refresh_history(&mut self) {
        if self.settings.history_enabled {
            self.popup.history = self
                .rt
                .block_on(self.history.search(&self.popup.history_query));
        }
    }

    pub fn save_credential(&mut self) {
        let Some(credential) = Credential::new(&self.popup.setup.key_input) else {
            return;
        };
        if !self.rt.block_on(self.storage.save_credential(&credential)) {
            self.popup.notices.push(Notice::error(
                "Storage unavailable",
                "The API key is kept for this session only.",
            ));
        }
        self.popup.credential_saved(credential);
    }

    pub fn submit(&mut self) {
        match self.popup.begin_submit() {
            Ok(msg) => {
                if self.worker_tx.send(msg).is_err() {
                    self.popup
                        .finish_submit(Err("background worker stopped".to_string()));
                }
            }
            Err(e) => tracing::debug!("submit rejected: {}", e),
        }
    }

    /// Drain worker and watcher messages. Non-blocking.
    pub fn poll(&mut self) {
        while let Ok(msg) = self.inbox.try_recv() {
            let finished = matches!(msg, ExtMessage::SummaryReady { .. });
            self.popup.apply_message(msg);
            if finished {
                self.refresh_history();
            }
        }
    }

    pub fn clear_history(&mut self) {
        if self.rt.block_on(self.history.clear()) {
            self.popup.history.clear();
            self.popup.notices.push(Notice::success(
                "History cleared",
                "All saved summaries were removed",
            ));
        } else {
            self.popup.notices.push(Notice::error(
                "Storage unavailable",
                "History could not be cleared",
            ));
        }
    }

    pub fn toggle_capture(&mut self) {
        match &self.watcher {
            Some(watcher) => watcher.toggle(),
            None => self.popup.notices.push(Notice::error(
                "Selection capture unavailable",
                "No clipboard access on this system",
            )),
        }
    }

    pub fn copy_text(&mut self, text: &str) {
        match copy_to_clipboard(text) {
            Ok(()) => self.popup.notices.push(Notice::success(
                "Copied to clipboard!",
                "Summary has been copied to your clipboard",
            )),
            Err(e) => {
                tracing::warn!("clipboard write failed: {}", e);
                self.popup
                    .notices
                    .push(Notice::error("Failed to copy", "Unable to copy to clipboard"));
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.popup.mode() == UiMode::Submitting || self.popup.capture_active
    }
}
