use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use mlbb_topup_bot::cli::{Cli, Commands};
use mlbb_topup_bot::core::web_server::{start_web_server, WebState};
use mlbb_topup_bot::core::{
    config, init_logger, install_panic_hook, log_startup_configuration, AppError, Config,
};
use mlbb_topup_bot::reseller::ResellerGateway;
use mlbb_topup_bot::storage::TopupStore;
use mlbb_topup_bot::telegram::{
    create_bot, schema, setup_bot_commands, AdminNotifier, CommandService, HandlerDeps, TelegramAdminNotifier,
};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, configuration,
/// database, listener bind).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::log_file_path())?;
    install_panic_hook();

    let mut config = match Config::from_env().map_err(AppError::from) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Some(Commands::Run { port }) => {
            if let Some(port) = port {
                config.port = port;
            }
            run_bot(config).await
        }
        Some(Commands::CheckConfig) => {
            println!("Configuration OK\n{}", config.redacted_summary());
            Ok(())
        }
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot(config).await
        }
    }
}

/// Runs the Telegram dispatcher and the webhook server until SIGINT/SIGTERM.
async fn run_bot(config: Config) -> Result<()> {
    log_startup_configuration(&config);

    let store = TopupStore::open(&config.database_path)?;
    match store.count() {
        Ok(count) => log::info!("Record store holds {} top-up(s)", count),
        Err(e) => log::warn!("Failed to count stored top-ups: {}", e),
    }

    let bot = create_bot(&config)?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let gateway = Arc::new(ResellerGateway::new(config.reseller));

    let notifier = config.admin_chat.as_deref().map(|destination| {
        Arc::new(TelegramAdminNotifier::new(bot.clone(), destination)) as Arc<dyn AdminNotifier>
    });

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    let web_state = WebState::new(store.clone(), config.webhook_secret, notifier);
    let web_shutdown = shutdown.clone();
    let web_handle = tokio::spawn(async move {
        let stop = web_shutdown.clone();
        if let Err(e) = start_web_server(listener, web_state, async move { stop.cancelled().await }).await {
            log::error!("Web server failed: {}", e);
        }
        // Without the webhook there is no point in keeping the bot alive
        web_shutdown.cancel();
    });

    let handler = schema(HandlerDeps::new(CommandService::new(store, gateway)));
    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .default_handler(|update| async move {
            log::debug!("Unhandled update: {:?}", update.id);
        })
        .build();

    let dispatcher_token = dispatcher.shutdown_token();
    let dispatcher_shutdown = shutdown.clone();
    tokio::spawn(async move {
        dispatcher_shutdown.cancelled().await;
        // Idle means the dispatcher has not started polling yet
        loop {
            match dispatcher_token.shutdown() {
                Ok(done) => {
                    done.await;
                    log::info!("Dispatcher shutdown gracefully");
                    break;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }
    });

    log::info!("Starting bot in long polling mode");
    let polling = Polling::builder(bot).drop_pending_updates().build();
    dispatcher
        .dispatch_with_listener(
            polling,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    // The dispatcher may also stop on its own; make sure the server follows
    shutdown.cancel();
    if let Err(e) = web_handle.await {
        log::error!("Web server task failed: {}", e);
    }

    log::info!("Shutdown complete");
    Ok(())
}

/// Cancels `token` on Ctrl+C or SIGTERM.
async fn wait_for_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => log::info!("Received SIGTERM, shutting down..."),
    }
    token.cancel();
}
