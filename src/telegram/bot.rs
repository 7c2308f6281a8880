//! Bot initialization and command definitions
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Command registration in the Telegram UI

use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config::Config;
use crate::core::error::AppResult;

/// Bot commands enum with descriptions
///
/// Argument parsing is done by the command service, so each command takes
/// the raw rest-of-message string.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "MLBB Account Checker commands:")]
pub enum Command {
    // Deep links (`t.me/<bot>?start=<payload>`) arrive as `/start <payload>`
    #[command(description = "show usage")]
    Start(String),
    #[command(rename = "cek", description = "check account info: /cek <player_id> <server_id>")]
    Lookup(String),
    #[command(rename = "bind", description = "check bind status: /bind <player_id> <server_id>")]
    BindStatus(String),
    #[command(
        rename = "firsttopup",
        description = "show first recorded top-up: /firsttopup <player_id> <server_id>"
    )]
    FirstTopup(String),
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(AppError)` - Failed to build the HTTP client
pub fn create_bot(config: &Config) -> AppResult<Bot> {
    let client = teloxide::net::default_reqwest_settings().build()?;
    let bot = Bot::with_client(config.bot_token.expose_secret(), client);

    let bot = match &config.bot_api_url {
        Some(url) => {
            log::info!("Using custom Bot API URL: {}", url);
            bot.set_api_url(url.clone())
        }
        None => bot,
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> AppResult<()> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_commands_keep_raw_arguments() {
        assert_eq!(
            Command::parse("/start", "mlbb_bot").unwrap(),
            Command::Start(String::new())
        );
        assert_eq!(
            Command::parse("/cek 12345678 2012", "mlbb_bot").unwrap(),
            Command::Lookup("12345678 2012".to_string())
        );
        assert_eq!(
            Command::parse("/bind 1 2", "mlbb_bot").unwrap(),
            Command::BindStatus("1 2".to_string())
        );
        assert_eq!(
            Command::parse("/firsttopup@mlbb_bot 111 9", "mlbb_bot").unwrap(),
            Command::FirstTopup("111 9".to_string())
        );
    }

    #[test]
    fn test_start_accepts_deep_link_payload() {
        assert_eq!(
            Command::parse("/start ref123", "mlbb_bot").unwrap(),
            Command::Start("ref123".to_string())
        );
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Command::parse("/lookup 1 2", "mlbb_bot").is_err());
        assert!(Command::parse("/cek@other_bot 1 2", "mlbb_bot").is_err());
    }
}
