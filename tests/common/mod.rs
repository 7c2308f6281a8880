//! Common test utilities
//!
//! This module is shared across all integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use mlbb_topup_bot::core::web_server::{start_web_server, WebState};
use mlbb_topup_bot::storage::TopupStore;
use mlbb_topup_bot::telegram::{AdminNotifier, NotificationError};

pub const TEST_SECRET: &str = "test-secret";

/// Opens a store in a fresh temporary directory.
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub fn temp_store() -> (TempDir, TopupStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("topups.sqlite");
    let store = TopupStore::open(path.to_str().expect("temp path is UTF-8")).expect("Failed to open store");
    (dir, store)
}

/// Notifier that forwards every message to a channel.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl AdminNotifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotificationError> {
        let _ = self.tx.send(text.to_string());
        Ok(())
    }
}

/// Notifier that records the attempt and then fails like a blocked bot.
pub struct FailingNotifier {
    tx: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl AdminNotifier for FailingNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotificationError> {
        let _ = self.tx.send(text.to_string());
        Err(NotificationError::Telegram(teloxide::RequestError::Api(
            teloxide::ApiError::BotBlocked,
        )))
    }
}

/// Webhook server bound to a random local port.
pub struct TestServer {
    pub base_url: String,
    pub store: TopupStore,
    pub notifications: mpsc::UnboundedReceiver<String>,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
    _dir: TempDir,
}

impl TestServer {
    /// Server with [`TEST_SECRET`] and a recording admin notifier.
    pub async fn start() -> Self {
        Self::start_with_secret(TEST_SECRET).await
    }

    pub async fn start_with_secret(secret: &str) -> Self {
        let (tx, notifications) = mpsc::unbounded_channel();
        Self::start_with(secret, Arc::new(RecordingNotifier { tx }), notifications).await
    }

    /// Server whose admin notifier always fails after recording the attempt.
    pub async fn start_with_failing_notifier() -> Self {
        let (tx, notifications) = mpsc::unbounded_channel();
        Self::start_with(TEST_SECRET, Arc::new(FailingNotifier { tx }), notifications).await
    }

    async fn start_with(
        secret: &str,
        notifier: Arc<dyn AdminNotifier>,
        notifications: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        let (dir, store) = temp_store();
        let state = WebState::new(store.clone(), SecretString::from(secret.to_string()), Some(notifier));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let addr = listener.local_addr().expect("Listener has no address");

        let shutdown = CancellationToken::new();
        let stop = shutdown.clone();
        let handle = tokio::spawn(async move {
            start_web_server(listener, state, async move { stop.cancelled().await })
                .await
                .expect("Web server failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            store,
            notifications,
            shutdown,
            handle: Some(handle),
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Posts `body` to the webhook, with the secret header when given.
    pub async fn post_topup(&self, secret: Option<&str>, body: &str) -> reqwest::Response {
        let mut request = reqwest::Client::new()
            .post(self.url("/webhook/topup"))
            .header("content-type", "application/json")
            .body(body.to_string());
        if let Some(secret) = secret {
            request = request.header("x-webhook-secret", secret);
        }
        request.send().await.expect("Request failed")
    }

    /// Next admin notification, or `None` if nothing arrives shortly.
    pub async fn next_notification(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(2), self.notifications.recv())
            .await
            .ok()
            .flatten()
    }

    /// Stops the server and waits for it to finish.
    pub async fn stop(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            handle.await.expect("Server task panicked");
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
