//! Background worker that proxies summarize requests to the endpoint.
//!
//! Runs on its own thread with its own tokio runtime so the UI thread never
//! blocks on the network. Requests are handled one at a time; there is no
//! cancellation.

use services::dispatch::Dispatcher;
use shared::messages::ExtMessage;
use shared::records::Credential;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Start the worker. Send `ExtMessage::Summarize` into the returned sender;
/// replies arrive on `reply` as `SummaryReady` / `SummaryFailed`.
pub fn spawn_worker(dispatcher: Dispatcher, reply: Sender<ExtMessage>) -> anyhow::Result<Sender<ExtMessage>> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (tx, rx) = channel::<ExtMessage>();

    std::thread::Builder::new()
        .name("summary-worker".to_string())
        .spawn(move || run(rt, dispatcher, rx, reply))?;

    Ok(tx)
}

fn run(rt: tokio::runtime::Runtime, dispatcher: Dispatcher, rx: Receiver<ExtMessage>, reply: Sender<ExtMessage>) {
    for msg in rx {
        let response = handle(&rt, &dispatcher, msg);
        if let Some(response) = response {
            if reply.send(response).is_err() {
                // Popup is gone.
                break;
            }
        }
    }
    tracing::debug!("summary worker stopped");
}

fn handle(rt: &tokio::runtime::Runtime, dispatcher: &Dispatcher, msg: ExtMessage) -> Option<ExtMessage> {
    if let Err(e) = msg.validate() {
        return Some(ExtMessage::SummaryFailed {
            error: e.to_string(),
        });
    }

    match msg {
        ExtMessage::Summarize { text, credential } => {
            let Some(credential) = Credential::new(&credential) else {
                return Some(ExtMessage::SummaryFailed {
                    error: "No API key configured".to_string(),
                });
            };
            let reply = match rt.block_on(dispatcher.dispatch(&text, &credential)) {
                Ok(outcome) => ExtMessage::SummaryReady {
                    summary: outcome.summary,
                },
                Err(e) => {
                    tracing::error!("Error generating summary: {}", e);
                    ExtMessage::SummaryFailed {
                        error: e.to_string(),
                    }
                }
            };
            Some(reply)
        }
        other => {
            tracing::warn!(kind = other.kind(), "worker ignoring unexpected message");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use services::storage::Storage;
    use shared::error::SummarizeError;
    use shared::settings::SummarizerSettings;
    use shared::summarizer::Summarizer;
    use std::sync::Arc;
    use std::time::Duration;

    struct Echo;

    #[async_trait]
    impl Summarizer for Echo {
        async fn summarize(&self, text: &str, _credential: &Credential) -> Result<String, SummarizeError> {
            Ok(format!("summary of {}", text))
        }
    }

    fn start() -> (Sender<ExtMessage>, Receiver<ExtMessage>) {
        let dispatcher = Dispatcher::new(Arc::new(Echo), Storage::in_memory(), &SummarizerSettings::default());
        let (reply_tx, reply_rx) = channel();
        (spawn_worker(dispatcher, reply_tx).unwrap(), reply_rx)
    }

    #[test]
    fn test_worker_replies_ready() {
        let (tx, rx) = start();
        tx.send(ExtMessage::Summarize {
            text: "hello world".into(),
            credential: "sk-test".into(),
        })
        .unwrap();
        let reply = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(
            reply,
            ExtMessage::SummaryReady {
                summary: "summary of hello world".into()
            }
        );
    }

    #[test]
    fn test_worker_rejects_blank_credential() {
        let (tx, rx) = start();
        tx.send(ExtMessage::Summarize {
            text: "hello world".into(),
            credential: " ".into(),
        })
        .unwrap();
        let reply = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(reply.kind(), "summary_failed");
    }

    #[test]
    fn test_worker_ignores_non_requests() {
        let (tx, rx) = start();
        tx.send(ExtMessage::CaptureToggled { active: true }).unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }
}
