//! Coffer - versioned artifact cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use coffer::cli::args::LogFormat;
use coffer::cli::{commands, Cli, Commands};
use coffer::config::ConfigManager;
use coffer::error::CofferResult;
use coffer::Datastore;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CofferResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;
    debug!("Loaded config from {}", config_manager.path().display());

    // Config commands must work even when the store section is broken
    if let Commands::Config(args) = cli.command {
        return commands::config(args, &config_manager, &config).await;
    }

    let datastore = Datastore::from_config(&config, cli.cache_root)?;

    match cli.command {
        Commands::Config(_) => Ok(()),
        Commands::Publish(args) => commands::publish(args, datastore).await,
        Commands::Fetch(args) => commands::fetch(args, datastore).await,
        Commands::List(args) => commands::list(args, datastore).await,
        Commands::Evict(args) => commands::evict(args, datastore).await,
        Commands::Unpublish(args) => commands::unpublish(args, datastore).await,
        Commands::Wipe(args) => commands::wipe(args, datastore).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug. `RUST_LOG` wins when set.
fn init_logging(verbose: u8, format: LogFormat) {
    let default = match verbose {
        0 => "coffer=warn",
        1 => "coffer=info",
        _ => "coffer=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.without_time().init(),
        LogFormat::Json => builder.json().init(),
    }
}
