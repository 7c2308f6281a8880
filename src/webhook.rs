//! Provider top-up callbacks (`POST /webhook/topup`).
//!
//! The shared secret is checked before the body is looked at. Valid calls
//! are written through [`TopupStore::record_topup`]; the admin notification
//! runs detached and never changes the response.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use crate::core::web_server::WebState;
use crate::storage::{NewTopup, RecordOutcome, TopupRecord, TopupStore};
use crate::telegram::notifications::{spawn_admin_notification, topup_notification_text};

/// Header carrying the shared secret
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Stored when the provider omits `amount` or `provider`
const PLACEHOLDER: &str = "-";

#[derive(thiserror::Error, Debug)]
pub enum WebhookError {
    #[error("forbidden")]
    Forbidden,
    #[error("missing fields")]
    MissingFields,
    #[error("invalid payload")]
    InvalidPayload,
    #[error("storage error")]
    Storage,
}

impl WebhookError {
    fn status(&self) -> StatusCode {
        match self {
            WebhookError::Forbidden => StatusCode::FORBIDDEN,
            WebhookError::MissingFields | WebhookError::InvalidPayload => StatusCode::BAD_REQUEST,
            WebhookError::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let body = json!({ "status": "error", "message": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

/// Providers send ids either as JSON strings or numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(text) => text,
            Scalar::Number(number) => number.to_string(),
        }
    }
}

/// Raw callback body. Every field is optional here; [`TopupPayload::into_new_topup`]
/// decides what is required.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopupPayload {
    #[serde(alias = "player_id")]
    player_id: Option<Scalar>,
    #[serde(alias = "server_id")]
    server_id: Option<Scalar>,
    #[serde(alias = "txn_id", alias = "transaction_id")]
    transaction_id: Option<Scalar>,
    amount: Option<Scalar>,
    provider: Option<Scalar>,
}

impl TopupPayload {
    /// Parses a request body; anything but a JSON object is rejected.
    pub fn from_slice(body: &[u8]) -> Result<Self, WebhookError> {
        let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
            log::warn!("Rejected webhook body: {}", e);
            WebhookError::InvalidPayload
        })?;
        if !value.is_object() {
            log::warn!("Rejected webhook body: not a JSON object");
            return Err(WebhookError::InvalidPayload);
        }
        serde_json::from_value(value).map_err(|e| {
            log::warn!("Rejected webhook body: {}", e);
            WebhookError::InvalidPayload
        })
    }

    /// Validates required fields and stamps the receive time.
    pub fn into_new_topup(self) -> Result<NewTopup, WebhookError> {
        let required = |value: Option<Scalar>| {
            value
                .map(|v| v.into_string().trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(WebhookError::MissingFields)
        };
        let optional = |value: Option<Scalar>| {
            value
                .map(Scalar::into_string)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        };

        Ok(NewTopup::new(
            required(self.player_id)?,
            required(self.server_id)?,
            required(self.transaction_id)?,
            optional(self.amount),
            optional(self.provider),
        ))
    }
}

type HmacSha256 = Hmac<Sha256>;

/// MAC key used only to turn both secrets into fixed-length tags
const SECRET_TAG_KEY: &[u8] = b"mlbb-topup-bot/webhook-secret";

fn secret_tag(value: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(SECRET_TAG_KEY).ok()?;
    mac.update(value.as_bytes());
    Some(mac)
}

/// Exact match against the configured secret, compared in constant time as
/// fixed-length HMAC tags. An empty configured secret matches nothing.
pub fn secret_matches(expected: &SecretString, presented: Option<&str>) -> bool {
    let expected = expected.expose_secret();
    let Some(presented) = presented else {
        return false;
    };
    if expected.is_empty() {
        return false;
    }

    match (secret_tag(expected), secret_tag(presented)) {
        (Some(expected), Some(presented)) => presented.verify_slice(&expected.finalize().into_bytes()).is_ok(),
        _ => false,
    }
}

/// Fields of a replayed callback that disagree with the stored record.
pub fn conflicting_fields(stored: &TopupRecord, incoming: &NewTopup) -> Vec<&'static str> {
    [
        ("player_id", stored.player_id == incoming.player_id),
        ("server_id", stored.server_id == incoming.server_id),
        ("amount", stored.amount == incoming.amount),
    ]
    .into_iter()
    .filter(|(_, same)| !same)
    .map(|(name, _)| name)
    .collect()
}

fn warn_on_conflicting_replay(store: &TopupStore, topup: &NewTopup) {
    match store.find_by_transaction(&topup.provider, &topup.transaction_id) {
        Ok(Some(stored)) => {
            let conflicts = conflicting_fields(&stored, topup);
            if !conflicts.is_empty() {
                log::warn!(
                    "Replayed txn {} from {} differs from stored #{} in {}: stored {}/{} {:?}, got {}/{} {:?}",
                    topup.transaction_id,
                    topup.provider,
                    stored.id,
                    conflicts.join(", "),
                    stored.player_id,
                    stored.server_id,
                    stored.amount,
                    topup.player_id,
                    topup.server_id,
                    topup.amount
                );
            }
        }
        Ok(None) => {}
        Err(e) => log::error!("Failed to load stored txn {}: {}", topup.transaction_id, e),
    }
}

/// Validates and stores one callback.
pub fn ingest(store: &TopupStore, body: &[u8]) -> Result<(NewTopup, RecordOutcome), WebhookError> {
    let topup = TopupPayload::from_slice(body)?.into_new_topup()?;

    let outcome = store.record_topup(&topup).map_err(|e| {
        log::error!("Failed to store top-up {}: {}", topup.transaction_id, e);
        WebhookError::Storage
    })?;
    if let RecordOutcome::Duplicate(_) = outcome {
        warn_on_conflicting_replay(store, &topup);
    }
    Ok((topup, outcome))
}

/// POST /webhook/topup
pub async fn topup_webhook(
    State(state): State<WebState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, WebhookError> {
    let presented = headers.get(WEBHOOK_SECRET_HEADER).and_then(|v| v.to_str().ok());
    if !secret_matches(&state.webhook_secret, presented) {
        log::warn!("Webhook call rejected: bad or missing {}", WEBHOOK_SECRET_HEADER);
        return Err(WebhookError::Forbidden);
    }

    let (topup, outcome) = ingest(&state.store, &body)?;

    match outcome {
        RecordOutcome::Inserted(id) => {
            log::info!(
                "Top-up #{} recorded: {}/{} txn {} ({})",
                id,
                topup.player_id,
                topup.server_id,
                topup.transaction_id,
                topup.provider
            );
            if let Some(notifier) = &state.notifier {
                spawn_admin_notification(notifier.clone(), topup_notification_text(&topup));
            }
            Ok(Json(json!({ "status": "ok", "id": id })))
        }
        RecordOutcome::Duplicate(id) => {
            log::info!(
                "Duplicate callback for txn {} from {}, already stored as #{}",
                topup.transaction_id,
                topup.provider,
                id
            );
            Ok(Json(json!({ "status": "ok", "id": id, "duplicate": true })))
        }
    }
}
