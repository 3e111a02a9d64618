//! appshell - offline app-shell cache and update controller
//!
//! CLI entry point that dispatches to subcommands.

use appshell::cli::{commands, Cli, Commands};
use appshell::config::ConfigManager;
use appshell::error::AppShellResult;
use clap::Parser;
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
            } else if e.is_retryable() {
                eprintln!(
                    "{} The network may be unreachable; try again later",
                    style("Hint:").yellow()
                );
            }
            ExitCode::FAILURE
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("appshell=warn"),
        1 => EnvFilter::new("appshell=info"),
        _ => EnvFilter::new("appshell=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

async fn run() -> AppShellResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Config commands must work even when the file does not parse
    if let Commands::Config(args) = cli.command {
        init_logging(cli.verbose, false);
        return commands::config(args, &config_manager).await;
    }

    let config = config_manager.load().await?;
    let verbose = cli.verbose.max(u8::from(config.general.verbose));
    init_logging(verbose, config.general.log_format == "json");
    debug!("Using config {}", config_manager.path().display());

    match cli.command {
        Commands::Config(_) => Ok(()),
        Commands::Install(args) => commands::install(args, &config).await,
        Commands::Update(args) => commands::update(args, &config).await,
        Commands::Activate(args) => commands::activate(args, &config).await,
        Commands::Fetch(args) => commands::fetch(args, &config).await,
        Commands::Status => commands::status(&config).await,
        Commands::Buckets(args) => commands::buckets(args, &config).await,
        Commands::Manifest(args) => commands::manifest(args, &config).await,
    }
}
