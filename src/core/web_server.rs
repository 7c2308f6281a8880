//! HTTP server for provider callbacks.
//!
//! Serves the liveness string at `/` and the top-up webhook at
//! `/webhook/topup`. Runs on PORT (default 3000) next to the Telegram
//! dispatcher.

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use secrecy::SecretString;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::error::AppResult;
use crate::storage::TopupStore;
use crate::telegram::notifications::AdminNotifier;
use crate::webhook::topup_webhook;

/// Static body of the health endpoint
pub const HEALTH_TEXT: &str = "MLBB Telegram Bot running";

/// Shared state for the web server.
#[derive(Clone)]
pub struct WebState {
    pub store: TopupStore,
    pub webhook_secret: Arc<SecretString>,
    /// Admin destination; `None` disables notifications
    pub notifier: Option<Arc<dyn AdminNotifier>>,
}

impl WebState {
    pub fn new(store: TopupStore, webhook_secret: SecretString, notifier: Option<Arc<dyn AdminNotifier>>) -> Self {
        Self {
            store,
            webhook_secret: Arc::new(webhook_secret),
            notifier,
        }
    }
}

/// Routes served by the public listener.
pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/webhook/topup", post(topup_webhook))
        .with_state(state)
}

/// Start the web server on an already bound listener.
///
/// Returns once `shutdown` resolves and in-flight requests have finished.
pub async fn start_web_server<F>(listener: TcpListener, state: WebState, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    let app = router(state);

    log::info!("Starting web server on http://{}", addr);
    log::info!("  GET  /               - Health check");
    log::info!("  POST /webhook/topup  - Provider top-up callback");

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    log::info!("Web server stopped");
    Ok(())
}

/// GET /: simple health check.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, HEALTH_TEXT)
}
