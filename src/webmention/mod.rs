// Webmention sending: notify the pages a new note links to.
//
// Sends are fire-and-forget: `dispatch` spawns one background task per target
// and returns immediately. Task outcomes only reach the logs.

pub mod discovery;
pub mod sender;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub use sender::HttpWebmentionSender;

#[async_trait]
pub trait WebmentionSender: Send + Sync {
    /// Notify `target` that `source` links to it. Returns a human-readable
    /// status message on success.
    async fn send(&self, source: &str, target: &str) -> Result<String>;
}

/// Spawn one detached webmention send per target.
///
/// The returned handles exist for tests; production callers drop them.
pub fn dispatch(
    sender: Arc<dyn WebmentionSender>,
    source: String,
    targets: Vec<String>,
) -> Vec<JoinHandle<()>> {
    targets
        .into_iter()
        .map(|target| {
            let sender = sender.clone();
            let source = source.clone();
            tokio::spawn(async move {
                match sender.send(&source, &target).await {
                    Ok(message) => info!(source = %source, target = %target, "{message}"),
                    Err(e) => warn!(source = %source, target = %target, error = %e, "Webmention failed"),
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl WebmentionSender for RecordingSender {
        async fn send(&self, source: &str, target: &str) -> Result<String> {
            if target.contains("fail") {
                anyhow::bail!("no endpoint");
            }
            self.sent
                .lock()
                .await
                .push((source.to_string(), target.to_string()));
            Ok("sent".to_string())
        }
    }

    #[tokio::test]
    async fn test_dispatch_sends_each_target() {
        let sender = Arc::new(RecordingSender::default());
        let handles = dispatch(
            sender.clone(),
            "https://example.com/notes/a".to_string(),
            vec![
                "https://one.example/".to_string(),
                "https://fail.example/".to_string(),
                "https://two.example/".to_string(),
            ],
        );
        for handle in handles {
            handle.await.unwrap();
        }

        let mut sent = sender.sent.lock().await.clone();
        sent.sort();
        assert_eq!(
            sent,
            vec![
                (
                    "https://example.com/notes/a".to_string(),
                    "https://one.example/".to_string()
                ),
                (
                    "https://example.com/notes/a".to_string(),
                    "https://two.example/".to_string()
                ),
            ]
        );
    }
}
