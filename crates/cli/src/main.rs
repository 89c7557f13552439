//! opq - coalesce a stream of document writes into net operations

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod input;
mod settings;

use settings::QueueArgs;

/// opq - merge bursts of CREATE/UPDATE/DELETE intents into batched writes
#[derive(Parser)]
#[command(name = "opq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read JSON-lines operations and print each flushed batch as a JSON line
    Run {
        #[command(flatten)]
        queue: QueueArgs,

        /// Input file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Show the resolved queue configuration
    Config {
        #[command(flatten)]
        queue: QueueArgs,

        /// Print an example configuration file instead
        #[arg(long)]
        example: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { queue, input } => {
            let config = settings::resolve(&queue)?;
            init_tracing(config.log_level.as_deref())?;
            cmd::run::run(config, input).await
        }
        Commands::Config { queue, example } => {
            if example {
                cmd::config::run_example()
            } else {
                cmd::config::run_show(&queue)
            }
        }
    }
}

/// Send diagnostics to stderr so stdout stays machine-readable
fn init_tracing(level: Option<&str>) -> Result<()> {
    let level = opque::parse_log_level(level).context("Invalid --log-level")?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
