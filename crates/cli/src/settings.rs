//! Queue options from a config file and command-line flags

use anyhow::{Context, Result};
use clap::Args;
use opque::{FlushDelay, QueueConfig};
use std::path::{Path, PathBuf};

/// Queue options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct QueueArgs {
    /// TOML file with queue options (flags override it)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Milliseconds of quiet before buffered operations are flushed
    #[arg(long)]
    pub flush_delay: Option<String>,

    /// Document field holding the coalescing key
    #[arg(long)]
    pub identifier: Option<String>,

    /// Diagnostic verbosity: off, error, warn, info, debug, trace
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Load a TOML config file
pub fn load_file(path: &Path) -> Result<QueueConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    QueueConfig::from_toml_str(&text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Combine the config file (if any) with flags, flags winning
pub fn resolve(args: &QueueArgs) -> Result<QueueConfig> {
    let base = match &args.config {
        Some(path) => load_file(path)?,
        None => QueueConfig::default(),
    };

    let flags = QueueConfig {
        flush_delay: args.flush_delay.clone().map(FlushDelay::from),
        identifier: args.identifier.clone(),
        log_level: args.log_level.clone(),
    };

    Ok(base.merge(flags))
}
