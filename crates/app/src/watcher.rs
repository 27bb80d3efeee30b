//! Selection watcher
//!
//! Stands in for a page content script: while capture is active it polls the
//! desktop selection and hands every new value to `SelectionCapture`.
//! Captures and toggles are reported to the popup as `ExtMessage`s.

use services::capture::{CaptureOutcome, SelectionCapture};
use services::storage::Storage;
use shared::messages::ExtMessage;
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::time::Duration;

pub const POLL_INTERVAL: Duration = Duration::from_millis(400);

/// Where selected text comes from.
pub trait SelectionSource: Send {
    fn read(&mut self) -> Option<String>;
}

/// Reads the primary selection on Linux and the clipboard elsewhere.
pub struct ClipboardSource {
    clipboard: arboard::Clipboard,
}

impl ClipboardSource {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            clipboard: arboard::Clipboard::new()?,
        })
    }
}

impl SelectionSource for ClipboardSource {
    #[cfg(target_os = "linux")]
    fn read(&mut self) -> Option<String> {
        use arboard::{GetExtLinux, LinuxClipboardKind};
        let primary = self
            .clipboard
            .get()
            .clipboard(LinuxClipboardKind::Primary)
            .text();
        match primary {
            Ok(text) => Some(text),
            Err(_) => self.clipboard.get_text().ok(),
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn read(&mut self) -> Option<String> {
        self.clipboard.get_text().ok()
    }
}

enum WatcherCommand {
    Toggle,
}

/// Owning handle; dropping it stops the watcher thread.
pub struct WatcherHandle {
    control: Sender<WatcherCommand>,
}

impl WatcherHandle {
    pub fn toggle(&self) {
        if self.control.send(WatcherCommand::Toggle).is_err() {
            tracing::warn!("selection watcher is not running");
        }
    }
}

/// Start watching `source`. Capture begins inactive.
pub fn spawn_watcher<S: SelectionSource + 'static>(
    mut source: S,
    storage: Storage,
    min_chars: usize,
    events: Sender<ExtMessage>,
    interval: Duration,
) -> anyhow::Result<WatcherHandle> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (control, commands) = channel();

    std::thread::Builder::new()
        .name("selection-watcher".to_string())
        .spawn(move || {
            let mut capture = SelectionCapture::new(storage, min_chars);
            let mut last_seen: Option<String> = None;

            loop {
                match commands.recv_timeout(interval) {
                    Ok(WatcherCommand::Toggle) => {
                        capture.toggle();
                        // Only selections made after activation count.
                        last_seen = source.read();
                        let msg = ExtMessage::CaptureToggled {
                            active: capture.is_active(),
                        };
                        if events.send(msg).is_err() {
                            break;
                        }
                        continue;
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }

                if !capture.is_active() {
                    continue;
                }
                let Some(current) = source.read() else {
                    continue;
                };
                if last_seen.as_deref() == Some(current.as_str()) {
                    continue;
                }
                last_seen = Some(current.clone());

                let outcome = rt.block_on(capture.on_selection(&current));
                if let CaptureOutcome::Captured { stored: false, .. } = outcome {
                    tracing::warn!("selection captured but not persisted");
                }
                if let Some(msg) = outcome.message() {
                    if events.send(msg).is_err() {
                        break;
                    }
                }
            }
            tracing::debug!("selection watcher stopped");
        })?;

    Ok(WatcherHandle { control })
}
