//! Reseller API client for player account and bind lookups.
//!
//! The reseller is an optional, untrusted collaborator: every failure is
//! reported as a [`ResellerError`] and callers fall back to synthetic data.
//! Its response schema is translated in exactly one place,
//! [`map_reseller_account`].

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::core::config::ResellerConfig;
use crate::storage::TopupRecord;

/// Creation date shown for synthetic accounts.
pub const FALLBACK_CREATED_AT: &str = "2020-01-01";

/// Whether the account is linked to each third-party identity provider.
/// Flags missing from an upstream payload read as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BindStatus {
    #[serde(deserialize_with = "lenient_flag")]
    pub moonton: bool,
    #[serde(deserialize_with = "lenient_flag")]
    pub google: bool,
    #[serde(deserialize_with = "lenient_flag")]
    pub tiktok: bool,
    #[serde(deserialize_with = "lenient_flag")]
    pub facebook: bool,
}

// The reseller payload is untrusted: a field of an unexpected type reads as
// missing instead of failing the whole response.

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    })
}

fn lenient_bind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<BindStatus>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// Canonical account shape rendered by the lookup command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub nickname: String,
    pub player_id: String,
    pub server_id: String,
    pub created_at: Option<String>,
    pub bind: Option<BindStatus>,
    pub first_topup: Option<String>,
    pub first_txn_id: Option<String>,
}

impl Account {
    /// Deterministic stand-in used when the reseller is absent or failing.
    pub fn fallback(player_id: &str, server_id: &str) -> Self {
        Self {
            nickname: format!("Player{}", player_id),
            player_id: player_id.to_string(),
            server_id: server_id.to_string(),
            created_at: Some(FALLBACK_CREATED_AT.to_string()),
            bind: Some(BindStatus::default()),
            first_topup: None,
            first_txn_id: None,
        }
    }

    /// Overrides the first top-up fields with a locally recorded top-up.
    pub fn with_first_topup(mut self, record: &TopupRecord) -> Self {
        self.first_topup = Some(record.amount.clone());
        self.first_txn_id = Some(record.transaction_id.clone());
        self
    }
}

/// Account payload returned by `GET {base}/validate`.
#[derive(Debug, Default, Deserialize)]
pub struct ResellerAccountResponse {
    #[serde(default, deserialize_with = "lenient_text")]
    pub nickname: Option<String>,
    #[serde(rename = "playerName", default, deserialize_with = "lenient_text")]
    pub player_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_bind")]
    pub bind: Option<BindStatus>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub first_topup: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub first_txn_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResellerBindResponse {
    #[serde(default, deserialize_with = "lenient_bind")]
    bind: Option<BindStatus>,
}

/// Maps the reseller's account payload into the canonical [`Account`].
///
/// Blank strings are treated like missing fields.
pub fn map_reseller_account(response: ResellerAccountResponse, player_id: &str, server_id: &str) -> Account {
    let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    Account {
        nickname: present(response.nickname)
            .or_else(|| present(response.player_name))
            .unwrap_or_else(|| format!("Player{}", player_id)),
        player_id: player_id.to_string(),
        server_id: server_id.to_string(),
        created_at: present(response.created_at),
        bind: response.bind,
        first_topup: present(response.first_topup),
        first_txn_id: present(response.first_txn_id),
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ResellerError {
    #[error("Reseller gateway is disabled")]
    Unavailable,
    #[error("Reseller request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Reseller returned status {0}")]
    Status(StatusCode),
}

struct ResellerClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

/// Optional gateway to the reseller API.
pub struct ResellerGateway {
    client: Option<ResellerClient>,
}

impl ResellerGateway {
    /// Gateway that never issues requests.
    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn new(config: Option<ResellerConfig>) -> Self {
        let Some(config) = config else {
            log::info!("Reseller gateway disabled (RESELLER_BASE/RESELLER_KEY unset)");
            return Self::disabled();
        };

        match reqwest::Client::builder().timeout(config.timeout).build() {
            Ok(http) => {
                log::info!("Reseller gateway configured: {}", config.base_url);
                Self {
                    client: Some(ResellerClient {
                        http,
                        base_url: config.base_url.trim_end_matches('/').to_string(),
                        api_key: config.api_key,
                    }),
                }
            }
            Err(e) => {
                log::warn!("Failed to build reseller HTTP client, gateway disabled: {}", e);
                Self::disabled()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// Fetches the account from `GET {base}/validate`.
    pub async fn fetch_account(&self, player_id: &str, server_id: &str) -> Result<Account, ResellerError> {
        let response: ResellerAccountResponse = self.get_json("validate", player_id, server_id).await?;
        Ok(map_reseller_account(response, player_id, server_id))
    }

    /// Fetches bind flags from `GET {base}/bind`.
    pub async fn fetch_bind_status(&self, player_id: &str, server_id: &str) -> Result<BindStatus, ResellerError> {
        let response: ResellerBindResponse = self.get_json("bind", player_id, server_id).await?;
        Ok(response.bind.unwrap_or_default())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        player_id: &str,
        server_id: &str,
    ) -> Result<T, ResellerError> {
        let client = self.client.as_ref().ok_or(ResellerError::Unavailable)?;

        let response = client
            .http
            .get(format!("{}/{}", client.base_url, endpoint))
            .query(&[("player_id", player_id), ("server_id", server_id)])
            .bearer_auth(client.api_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResellerError::Status(status));
        }

        Ok(response.json::<T>().await?)
    }
}
