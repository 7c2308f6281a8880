//! Dispatcher schema and handler dependencies

use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::bot::Command;
use super::commands::CommandService;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub commands: CommandService,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(commands: CommandService) -> Self {
        Self { commands }
    }
}

/// Creates the dispatcher schema for the Telegram bot.
///
/// Only known commands are handled; any other update falls through to the
/// dispatcher's default handler.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move { handle_command(&bot, &msg, &cmd, &deps).await }
        })
}

async fn handle_command(bot: &Bot, msg: &Message, cmd: &Command, deps: &HandlerDeps) -> Result<(), HandlerError> {
    log::info!("Command {:?} from chat {}", cmd, msg.chat.id);

    let reply = deps.commands.reply(cmd).await;
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}
