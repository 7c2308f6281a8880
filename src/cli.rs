use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mlbb-topup-bot")]
#[command(author, version, about = "MLBB account checker bot with a top-up webhook", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot and the webhook server (default)
    Run {
        /// Listen port, overrides PORT
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate configuration and print it with secrets redacted
    CheckConfig,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_no_subcommand() {
        let cli = Cli::try_parse_from(["mlbb-topup-bot"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_run_with_port() {
        let cli = Cli::try_parse_from(["mlbb-topup-bot", "run", "--port", "8081"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Run { port: Some(8081) }));
    }

    #[test]
    fn test_check_config() {
        let cli = Cli::try_parse_from(["mlbb-topup-bot", "check-config"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckConfig));
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["mlbb-topup-bot", "run", "--port", "99999"]).is_err());
    }
}
