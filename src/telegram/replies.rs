//! Plain-text reply rendering

use crate::reseller::{Account, BindStatus};
use crate::storage::TopupRecord;

pub const START_TEXT: &str = "MLBB Account Checker Bot\n\n\
    Usage:\n\
    /cek <player_id> <server_id> - check account info\n\
    /bind <player_id> <server_id> - check bind status\n\
    /firsttopup <player_id> <server_id> - show first top-up (if recorded)\n\n\
    Example: /cek 12345678 2012";

pub const NOT_NUMERIC_TEXT: &str = "Player ID and Server ID must be numbers.";

pub const NO_TOPUP_TEXT: &str = "No top-up has been recorded for this account yet.";

pub const STORE_UNAVAILABLE_TEXT: &str = "Top-up history is unavailable right now, please try again later.";

/// `Format: /<command> <player_id> <server_id>`
pub fn usage(command: &str) -> String {
    format!("Format: /{} <player_id> <server_id>", command)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn y_n(flag: bool) -> &'static str {
    if flag {
        "Y"
    } else {
        "N"
    }
}

/// Multi-line bind reply for `/bind`.
pub fn format_bind_message(bind: &BindStatus) -> String {
    format!(
        "Bind status:\nMoonton: {}\nGoogle: {}\nTikTok: {}\nFacebook: {}",
        yes_no(bind.moonton),
        yes_no(bind.google),
        yes_no(bind.tiktok),
        yes_no(bind.facebook)
    )
}

/// One-line bind summary used inside the account reply.
pub fn format_bind_line(bind: &BindStatus) -> String {
    format!(
        "Moonton:{} Google:{} TikTok:{} Facebook:{}",
        y_n(bind.moonton),
        y_n(bind.google),
        y_n(bind.tiktok),
        y_n(bind.facebook)
    )
}

pub fn format_account_message(account: &Account) -> String {
    let or_dash = |value: Option<&str>| value.filter(|v| !v.is_empty()).unwrap_or("-").to_string();

    [
        format!("Nickname: {}", or_dash(Some(account.nickname.as_str()))),
        format!("Player ID: {}", or_dash(Some(account.player_id.as_str()))),
        format!("Server: {}", or_dash(Some(account.server_id.as_str()))),
        format!("Created: {}", or_dash(account.created_at.as_deref())),
        format!("First Top-up: {}", or_dash(account.first_topup.as_deref())),
        format!("First TXN ID: {}", or_dash(account.first_txn_id.as_deref())),
        format!("Bind: {}", format_bind_line(&account.bind.unwrap_or_default())),
    ]
    .join("\n")
}

pub fn format_first_topup(record: &TopupRecord) -> String {
    let provider = if record.provider.is_empty() { "-" } else { &record.provider };
    format!(
        "First Top-up:\nTxn ID: {}\nAmount: {}\nProvider: {}\nAt: {}",
        record.transaction_id, record.amount, provider, record.created_at
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_account_message_layout() {
        let account = Account::fallback("12345678", "2012");
        assert_eq!(
            format_account_message(&account),
            "Nickname: Player12345678\n\
             Player ID: 12345678\n\
             Server: 2012\n\
             Created: 2020-01-01\n\
             First Top-up: -\n\
             First TXN ID: -\n\
             Bind: Moonton:N Google:N TikTok:N Facebook:N"
        );
    }

    #[test]
    fn test_account_without_bind_renders_all_no() {
        let mut account = Account::fallback("1", "2");
        account.bind = None;
        account.created_at = None;
        let text = format_account_message(&account);
        assert!(text.contains("Created: -"));
        assert!(text.ends_with("Bind: Moonton:N Google:N TikTok:N Facebook:N"));
    }

    #[test]
    fn test_bind_message() {
        let bind = BindStatus {
            moonton: true,
            facebook: true,
            ..BindStatus::default()
        };
        assert_eq!(
            format_bind_message(&bind),
            "Bind status:\nMoonton: Yes\nGoogle: No\nTikTok: No\nFacebook: Yes"
        );
    }

    #[test]
    fn test_usage() {
        assert_eq!(usage("cek"), "Format: /cek <player_id> <server_id>");
    }
}
