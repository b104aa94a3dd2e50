//! Command-line interface definition using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Build version string with git hash and build date.
fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const BUILD_DATE: &str = env!("BUILD_DATE");

    // Format: "0.3.0 (abc1234, 2026-01-29)"
    static VERSION_STRING: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} ({}, {})", VERSION, GIT_HASH, BUILD_DATE))
}

/// PickNTrust - affiliate deals backend and Telegram ingestion bot
#[derive(Parser, Debug)]
#[command(name = "pickntrust")]
#[command(author, version = version_string(), about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to state directory
    #[arg(short, long, env = "PICKNTRUST_STATE_DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the API server (plus photo proxy and webhook when a bot token is set)
    Serve {
        /// Host to bind (default: API_HOST or 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (default: API_PORT or 5000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Receive Telegram updates through a webhook on this server
        #[arg(short, long)]
        webhook: bool,
    },

    /// Run the ingestion bot in long polling mode
    Bot,

    /// Run the ingestion pipeline on a message text
    Ingest {
        /// Chat id of the monitored channel the text pretends to come from
        #[arg(long, allow_negative_numbers = true)]
        chat_id: i64,

        /// Message id (default: current unix time)
        #[arg(long)]
        message_id: Option<i64>,

        /// Do not resolve or scrape links
        #[arg(long)]
        offline: bool,

        /// Message text
        #[arg(required = true)]
        text: String,
    },

    /// Run a database maintenance task
    Maint {
        #[arg(value_enum)]
        task: MaintTask,
    },

    /// Export unified_content as JSON
    Backup {
        /// Output directory (default: <state-dir>/backups)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Inspect or write the monitored channel configuration
    Channels {
        #[command(subcommand)]
        action: ChannelsAction,
    },

    /// Show store counters
    Stats,
}

/// Maintenance tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MaintTask {
    /// Rewrite display_pages as normalized JSON arrays
    NormalizePages,
    /// Fold legacy status values into processing_status
    NormalizeStatus,
    /// Deactivate rows whose timer has run out
    Expire,
    /// Remove duplicate rows per affiliate URL and page
    Dedupe,
    /// Standardize category names
    Categories,
    /// Fill missing defaults (currency, image, pages)
    Backfill,
    /// Run every task
    All,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelsAction {
    /// List monitored channels
    List,
    /// Write the default channel set to channels.json
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Returns the default log filter for the verbosity level.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "pickntrust=info,teloxide=warn",
            1 => "pickntrust=debug,teloxide=info",
            2 => "pickntrust=trace,teloxide=debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_serve() {
        let cli = Cli::parse_from(["pickntrust", "serve", "--port", "8080", "--webhook"]);
        match cli.command {
            Commands::Serve { host, port, webhook } => {
                assert!(host.is_none());
                assert_eq!(port, Some(8080));
                assert!(webhook);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_parse_ingest_negative_chat() {
        let cli = Cli::parse_from([
            "pickntrust",
            "ingest",
            "--chat-id",
            "-1002955338551",
            "Deal https://amzn.to/x",
        ]);
        match cli.command {
            Commands::Ingest {
                chat_id,
                message_id,
                offline,
                text,
            } => {
                assert_eq!(chat_id, -1002955338551);
                assert!(message_id.is_none());
                assert!(!offline);
                assert_eq!(text, "Deal https://amzn.to/x");
            }
            _ => panic!("Expected Ingest command"),
        }
    }

    #[test]
    fn test_cli_parse_maint() {
        let cli = Cli::parse_from(["pickntrust", "maint", "normalize-pages"]);
        assert!(matches!(
            cli.command,
            Commands::Maint {
                task: MaintTask::NormalizePages
            }
        ));
        assert!(Cli::try_parse_from(["pickntrust", "maint", "vacuum"]).is_err());
    }

    #[test]
    fn test_cli_parse_channels() {
        let cli = Cli::parse_from(["pickntrust", "channels", "init", "--force"]);
        assert!(matches!(
            cli.command,
            Commands::Channels {
                action: ChannelsAction::Init { force: true }
            }
        ));
    }

    #[test]
    fn test_cli_verbose() {
        let cli = Cli::parse_from(["pickntrust", "-vv", "stats"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_filter(), "pickntrust=trace,teloxide=debug");
    }

    #[test]
    fn test_cli_help() {
        Cli::command().debug_assert();
    }
}
