//! Configuration command
//!
//! Shows the queue options a run would use, with validation status.

use crate::settings::{self, QueueArgs};
use anyhow::Result;
use opque::QueueConfig;
use owo_colors::OwoColorize;
use std::fmt::Display;

/// Print the resolved configuration
pub fn run_show(args: &QueueArgs) -> Result<()> {
    let config = settings::resolve(args)?;

    println!("{}", "Queue Configuration".bold());
    if let Some(path) = &args.config {
        println!("{}: {}\n", "Location".dimmed(), path.display().dimmed());
    } else {
        println!("{}\n", "(flags only)".dimmed());
    }

    show_option(
        "flush_delay",
        config.flush_delay.as_ref().map(|d| format!("{d:?}")),
        config.flush_delay_duration().map(|d| format!("{}ms", d.as_millis())),
    );
    show_option(
        "identifier",
        config.identifier.clone(),
        config.identifier_field().map(|f| format!("{f:?}")),
    );
    show_option(
        "log_level",
        config.log_level.clone(),
        config.log_filter().map(|level| level.to_string()),
    );

    if let Err(e) = validate(&config) {
        println!("\n{} {}", "✗".red(), e);
        anyhow::bail!("configuration is not usable");
    }

    println!("\n{} configuration is valid", "✓".green());
    Ok(())
}

fn show_option<E: Display>(
    key: &str,
    raw: Option<String>,
    resolved: std::result::Result<String, E>,
) {
    let raw = raw.unwrap_or_else(|| "(unset)".to_string());
    match resolved {
        Ok(value) => println!("  {} = {} {}", key.cyan(), raw, format!("({value})").dimmed()),
        Err(e) => println!("  {} = {} {}", key.cyan(), raw, e.to_string().red()),
    }
}

fn validate(config: &QueueConfig) -> opque::Result<()> {
    config.flush_delay_duration()?;
    config.identifier_field()?;
    config.log_filter()?;
    Ok(())
}

/// Print an example configuration file
pub fn run_example() -> Result<()> {
    println!("{}", example_config());
    Ok(())
}

pub fn example_config() -> &'static str {
    r#"# Milliseconds of quiet before buffered operations are flushed
flush_delay = 500

# Document field whose value is the coalescing key
identifier = "_id"

# off | error | warn | info | debug | trace
log_level = "error"
"#
}
