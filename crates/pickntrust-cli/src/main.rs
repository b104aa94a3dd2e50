//! PickNTrust CLI entry point.

use clap::Parser;
use pickntrust_cli::{cli::Cli, commands, load_env_files};
use pickntrust_core::{config, Settings};
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let cli = Cli::parse();

    if let Some(dir) = &cli.state_dir {
        std::env::set_var(config::STATE_DIR_ENV, dir);
    }
    load_env_files();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    fmt().with_env_filter(filter).with_target(false).init();

    if let Err(e) = config::ensure_all_dirs() {
        tracing::warn!(error = %e, "Failed to create state directories");
    }

    let settings = Settings::from_env();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(commands::execute(cli.command, settings)) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
