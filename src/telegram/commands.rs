//! Chat command logic, independent of teloxide message types.
//!
//! Every method returns the reply text; the dispatcher schema only sends it.
//! Validation failures become usage messages, reseller failures fall back to
//! synthetic data, and store failures are logged.

use lazy_regex::regex_is_match;
use std::sync::Arc;

use super::bot::Command;
use super::replies;
use crate::reseller::{Account, BindStatus, ResellerGateway};
use crate::storage::{TopupRecord, TopupStore};

/// Splits `"<player_id> <server_id>"`; anything but exactly two tokens is rejected.
pub fn parse_player_args(args: &str) -> Option<(&str, &str)> {
    let mut tokens = args.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(player_id), Some(server_id), None) => Some((player_id, server_id)),
        _ => None,
    }
}

fn is_numeric(value: &str) -> bool {
    regex_is_match!(r"^[0-9]+$", value)
}

/// Answers chat commands from the record store and the reseller gateway.
#[derive(Clone)]
pub struct CommandService {
    store: TopupStore,
    gateway: Arc<ResellerGateway>,
}

impl CommandService {
    pub fn new(store: TopupStore, gateway: Arc<ResellerGateway>) -> Self {
        Self { store, gateway }
    }

    /// Reply text for a parsed command.
    pub async fn reply(&self, command: &Command) -> String {
        match command {
            Command::Start(_) => replies::START_TEXT.to_string(),
            Command::Lookup(args) => self.lookup(args).await,
            Command::BindStatus(args) => self.bind_status(args).await,
            Command::FirstTopup(args) => self.first_topup(args),
        }
    }

    /// `/cek <player_id> <server_id>`
    pub async fn lookup(&self, args: &str) -> String {
        let Some((player_id, server_id)) = parse_player_args(args) else {
            return replies::usage("cek");
        };
        if !is_numeric(player_id) || !is_numeric(server_id) {
            return replies::NOT_NUMERIC_TEXT.to_string();
        }

        let account = self.resolve_account(player_id, server_id).await;
        let account = match self.first_record(player_id, server_id) {
            Some(record) => account.with_first_topup(&record),
            None => account,
        };
        replies::format_account_message(&account)
    }

    /// Reseller account, or the synthetic fallback when it is absent or failing.
    async fn resolve_account(&self, player_id: &str, server_id: &str) -> Account {
        if self.gateway.is_available() {
            match self.gateway.fetch_account(player_id, server_id).await {
                Ok(account) => return account,
                Err(e) => log::warn!("Reseller account lookup failed for {}/{}: {}", player_id, server_id, e),
            }
        }
        Account::fallback(player_id, server_id)
    }

    /// `/bind <player_id> <server_id>`
    pub async fn bind_status(&self, args: &str) -> String {
        let Some((player_id, server_id)) = parse_player_args(args) else {
            return replies::usage("bind");
        };

        let mut bind = BindStatus::default();
        if self.gateway.is_available() {
            match self.gateway.fetch_bind_status(player_id, server_id).await {
                Ok(status) => bind = status,
                Err(e) => log::warn!("Reseller bind lookup failed for {}/{}: {}", player_id, server_id, e),
            }
        }
        replies::format_bind_message(&bind)
    }

    /// `/firsttopup <player_id> <server_id>`
    pub fn first_topup(&self, args: &str) -> String {
        let Some((player_id, server_id)) = parse_player_args(args) else {
            return replies::usage("firsttopup");
        };

        match self.store.first_match(player_id, server_id) {
            Ok(Some(record)) => replies::format_first_topup(&record),
            Ok(None) => replies::NO_TOPUP_TEXT.to_string(),
            Err(e) => {
                log::error!("Failed to read first top-up for {}/{}: {}", player_id, server_id, e);
                replies::STORE_UNAVAILABLE_TEXT.to_string()
            }
        }
    }

    /// First record for enrichment; store errors only skip enrichment.
    fn first_record(&self, player_id: &str, server_id: &str) -> Option<TopupRecord> {
        self.store.first_match(player_id, server_id).unwrap_or_else(|e| {
            log::error!("Failed to read first top-up for {}/{}: {}", player_id, server_id, e);
            None
        })
    }
}
