//! Runtime configuration read from the environment
//!
//! Every knob is an environment variable (a `.env` file is loaded by `main`
//! through dotenvy). `Config::from_env` is used by the binary;
//! `Config::from_lookup` takes an arbitrary key lookup so tests never have
//! to mutate the process environment.

use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// HTTP listen port when PORT is unset
pub const DEFAULT_PORT: u16 = 3000;

/// Placeholder webhook secret used when WEBHOOK_SECRET is unset.
/// Must be overridden in any real deployment; startup warns about it.
pub const DEFAULT_WEBHOOK_SECRET: &str = "change_me";

/// SQLite file holding the topups table
pub const DEFAULT_DATABASE_PATH: &str = "./db.sqlite";

/// Log file path
pub const DEFAULT_LOG_FILE_PATH: &str = "topupbot.log";

/// Reseller configuration
pub mod reseller {
    use super::Duration;

    /// Request timeout for reseller API calls (in seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Default reseller request timeout duration
    pub fn default_timeout() -> Duration {
        Duration::from_secs(DEFAULT_TIMEOUT_SECS)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN (or TELOXIDE_TOKEN) is not set")]
    MissingBotToken,
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Connection details for the optional reseller API.
#[derive(Debug)]
pub struct ResellerConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub timeout: Duration,
}

/// Process-wide configuration, built once at startup.
#[derive(Debug)]
pub struct Config {
    pub bot_token: SecretString,
    /// Custom Bot API server (BOT_API_URL), e.g. a local telegram-bot-api
    pub bot_api_url: Option<url::Url>,
    pub port: u16,
    pub reseller: Option<ResellerConfig>,
    /// Shared secret expected in the `x-webhook-secret` header.
    /// An empty value rejects every webhook call.
    pub webhook_secret: SecretString,
    /// Chat id (numeric) or `@channel` that receives top-up notifications
    pub admin_chat: Option<String>,
    pub database_path: String,
    pub log_file_path: String,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset, except for WEBHOOK_SECRET where an
    /// explicitly empty value disables the webhook (fails closed).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = non_empty("BOT_TOKEN")
            .or_else(|| non_empty("TELOXIDE_TOKEN"))
            .ok_or(ConfigError::MissingBotToken)?;

        let bot_api_url = match non_empty("BOT_API_URL") {
            Some(raw) => Some(url::Url::parse(&raw).map_err(|_| ConfigError::Invalid {
                key: "BOT_API_URL",
                value: raw,
            })?),
            None => None,
        };

        let port = match non_empty("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid { key: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };

        let timeout = match non_empty("RESELLER_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "RESELLER_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => reseller::default_timeout(),
        };

        let reseller = match (non_empty("RESELLER_BASE"), non_empty("RESELLER_KEY")) {
            (Some(base_url), Some(api_key)) => Some(ResellerConfig {
                base_url,
                api_key: SecretString::from(api_key),
                timeout,
            }),
            (None, None) => None,
            (base, _) => {
                let missing = if base.is_some() { "RESELLER_KEY" } else { "RESELLER_BASE" };
                log::warn!("Reseller gateway disabled: {} is not set (both or neither are required)", missing);
                None
            }
        };

        let webhook_secret = lookup("WEBHOOK_SECRET")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| DEFAULT_WEBHOOK_SECRET.to_string());

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            bot_api_url,
            port,
            reseller,
            webhook_secret: SecretString::from(webhook_secret),
            admin_chat: non_empty("ADMIN_CHAT_ID"),
            database_path: non_empty("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            log_file_path: log_file_path_from(&lookup),
        })
    }

    /// True when the webhook still uses the shipped placeholder secret.
    pub fn uses_placeholder_secret(&self) -> bool {
        self.webhook_secret.expose_secret() == DEFAULT_WEBHOOK_SECRET
    }

    /// Human-readable summary with every secret redacted.
    pub fn redacted_summary(&self) -> String {
        let webhook = if self.webhook_secret.expose_secret().is_empty() {
            "empty (all webhook calls rejected)"
        } else if self.uses_placeholder_secret() {
            "placeholder (set WEBHOOK_SECRET!)"
        } else {
            "set"
        };
        let reseller = self
            .reseller
            .as_ref()
            .map(|r| format!("{} (timeout {}s)", r.base_url, r.timeout.as_secs()))
            .unwrap_or_else(|| "disabled".to_string());

        [
            "bot token: set".to_string(),
            format!(
                "bot api: {}",
                self.bot_api_url.as_ref().map(|u| u.as_str()).unwrap_or("official")
            ),
            format!("port: {}", self.port),
            format!("reseller: {}", reseller),
            format!("webhook secret: {}", webhook),
            format!("admin chat: {}", self.admin_chat.as_deref().unwrap_or("disabled")),
            format!("database: {}", self.database_path),
            format!("log file: {}", self.log_file_path),
        ]
        .join("\n")
    }
}

/// Log file path from LOG_FILE_PATH, readable before the rest of the
/// configuration so the logger can report configuration errors.
pub fn log_file_path() -> String {
    log_file_path_from(&|key: &str| env::var(key).ok())
}

fn log_file_path_from<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup("LOG_FILE_PATH")
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILE_PATH.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_missing_bot_token_is_fatal() {
        let err = config_from(&[("PORT", "8080")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingBotToken));

        let err = config_from(&[("BOT_TOKEN", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingBotToken));
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("BOT_TOKEN", "123:abc")]).unwrap();
        assert_eq!(config.bot_token.expose_secret(), "123:abc");
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.reseller.is_none());
        assert!(config.admin_chat.is_none());
        assert!(config.bot_api_url.is_none());
        assert!(config.uses_placeholder_secret());
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert_eq!(config.log_file_path, DEFAULT_LOG_FILE_PATH);
    }

    #[test]
    fn test_teloxide_token_fallback() {
        let config = config_from(&[("TELOXIDE_TOKEN", "42:xyz")]).unwrap();
        assert_eq!(config.bot_token.expose_secret(), "42:xyz");
    }

    #[test]
    fn test_full_configuration() {
        let config = config_from(&[
            ("BOT_TOKEN", "123:abc"),
            ("PORT", "8080"),
            ("RESELLER_BASE", "https://reseller.example/api"),
            ("RESELLER_KEY", "k3y"),
            ("RESELLER_TIMEOUT_SECS", "3"),
            ("WEBHOOK_SECRET", "s3cret"),
            ("ADMIN_CHAT_ID", "-100200300"),
            ("DATABASE_PATH", "/data/topups.sqlite"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        let reseller = config.reseller.as_ref().unwrap();
        assert_eq!(reseller.base_url, "https://reseller.example/api");
        assert_eq!(reseller.api_key.expose_secret(), "k3y");
        assert_eq!(reseller.timeout, Duration::from_secs(3));
        assert_eq!(config.webhook_secret.expose_secret(), "s3cret");
        assert!(!config.uses_placeholder_secret());
        assert_eq!(config.admin_chat.as_deref(), Some("-100200300"));
        assert_eq!(config.database_path, "/data/topups.sqlite");
    }

    #[test]
    fn test_reseller_requires_both_values() {
        let config = config_from(&[("BOT_TOKEN", "t"), ("RESELLER_BASE", "https://r.example")]).unwrap();
        assert!(config.reseller.is_none());

        let config = config_from(&[("BOT_TOKEN", "t"), ("RESELLER_KEY", "k")]).unwrap();
        assert!(config.reseller.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = config_from(&[("BOT_TOKEN", "t"), ("PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));

        let err = config_from(&[("BOT_TOKEN", "t"), ("RESELLER_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "RESELLER_TIMEOUT_SECS", .. }));

        let err = config_from(&[("BOT_TOKEN", "t"), ("BOT_API_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BOT_API_URL", .. }));
    }

    #[test]
    fn test_explicitly_empty_webhook_secret_is_kept_empty() {
        let config = config_from(&[("BOT_TOKEN", "t"), ("WEBHOOK_SECRET", "")]).unwrap();
        assert_eq!(config.webhook_secret.expose_secret(), "");
        assert!(!config.uses_placeholder_secret());
    }

    #[test]
    fn test_redacted_summary_hides_secrets() {
        let config = config_from(&[
            ("BOT_TOKEN", "123:super-secret-token"),
            ("RESELLER_BASE", "https://r.example"),
            ("RESELLER_KEY", "reseller-key-value"),
            ("WEBHOOK_SECRET", "hook-secret-value"),
        ])
        .unwrap();

        let summary = config.redacted_summary();
        assert!(summary.contains("https://r.example"));
        assert!(summary.contains("webhook secret: set"));
        assert!(!summary.contains("super-secret-token"));
        assert!(!summary.contains("reseller-key-value"));
        assert!(!summary.contains("hook-secret-value"));
    }
}
