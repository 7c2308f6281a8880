use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tokio::task::JoinHandle;

use crate::storage::NewTopup;

#[derive(thiserror::Error, Debug)]
pub enum NotificationError {
    #[error("Telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
}

/// Destination for operator notifications.
///
/// The webhook only depends on this trait so tests can capture messages
/// without a Telegram server.
#[async_trait]
pub trait AdminNotifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), NotificationError>;
}

/// Sends notifications to the admin chat through the bot.
pub struct TelegramAdminNotifier {
    bot: Bot,
    recipient: Recipient,
}

impl TelegramAdminNotifier {
    /// `destination` is a numeric chat id or a `@channel` username.
    pub fn new(bot: Bot, destination: &str) -> Self {
        Self {
            bot,
            recipient: parse_recipient(destination),
        }
    }
}

#[async_trait]
impl AdminNotifier for TelegramAdminNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotificationError> {
        self.bot.send_message(self.recipient.clone(), text).await?;
        Ok(())
    }
}

fn parse_recipient(destination: &str) -> Recipient {
    let destination = destination.trim();
    match destination.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if destination.starts_with('@') => Recipient::ChannelUsername(destination.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{}", destination)),
    }
}

/// Text of the admin message for a freshly recorded top-up.
pub fn topup_notification_text(topup: &NewTopup) -> String {
    format!(
        "New topup recorded:\nPlayer: {}-{}\nTxn: {}\nAmount: {}\nProvider: {}\nAt: {}",
        topup.player_id,
        topup.server_id,
        topup.transaction_id,
        topup.amount,
        topup.provider,
        topup.created_at()
    )
}

/// Sends the notification on a detached task.
///
/// Failures are logged and never retried; the caller does not wait.
pub fn spawn_admin_notification(notifier: Arc<dyn AdminNotifier>, text: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        match notifier.notify(&text).await {
            Ok(()) => log::info!("Admin notified about new top-up"),
            Err(e) => log::warn!("Notify admin failed: {}", e),
        }
    })
}
