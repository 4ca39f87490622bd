//! Midscene harness CLI
//!
//! Main entry point for the command-line tool.

use clap::Parser;
use midscene_harness::cli::{run_command, Command};
use midscene_harness::planning::Language;
use midscene_harness::Config;
use tracing_subscriber::EnvFilter;

/// Inspect the UI-TARS planning protocol
#[derive(Parser, Debug)]
#[command(name = "midscene")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug output
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Override the thought language
    #[arg(long, global = true)]
    language: Option<Language>,

    /// Override the network idle timeout in milliseconds
    #[arg(long, global = true)]
    idle_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if args.debug {
        config.planning.debug = true;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.default_log_level())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    if let Some(language) = args.language {
        config.planning.language = Some(language);
    }

    if let Some(ms) = args.idle_timeout_ms {
        config.harness.network_idle_timeout_ms = ms;
    }

    let output = run_command(args.command, &config)?;
    println!("{}", output);

    Ok(())
}
