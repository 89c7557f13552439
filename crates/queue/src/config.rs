//! Queue configuration
//!
//! Every option is optional at the serde level so that a missing option is
//! reported as a configuration error with a useful message rather than a
//! parser error. Validation happens in one place, before any timer starts.

use opque_core::{QueueError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

/// Shortest period the flush timer runs at; smaller delays are rounded up
pub const MIN_FLUSH_DELAY: Duration = Duration::from_millis(1);

/// Delay between the last submission and the flush, in milliseconds
///
/// Accepts an integer, a fractional number or a numeric string (`250`,
/// `250.5`, `"250"`). Zero and sub-millisecond values run at
/// [`MIN_FLUSH_DELAY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlushDelay {
    Millis(u64),
    Fractional(f64),
    Text(String),
}

impl FlushDelay {
    /// Validate and convert to a duration
    pub fn to_duration(&self) -> Result<Duration> {
        let delay = match self {
            FlushDelay::Millis(ms) => Duration::from_millis(*ms),
            FlushDelay::Fractional(ms) => fractional_millis(*ms, self)?,
            FlushDelay::Text(text) => {
                let ms = text.trim().parse::<f64>().map_err(|_| invalid(self))?;
                fractional_millis(ms, self)?
            }
        };

        Ok(delay.max(MIN_FLUSH_DELAY))
    }
}

fn fractional_millis(ms: f64, raw: &FlushDelay) -> Result<Duration> {
    let nanos = (ms * 1_000_000.0).round();
    if !nanos.is_finite() || nanos < 0.0 || nanos >= u64::MAX as f64 {
        return Err(invalid(raw));
    }
    Ok(Duration::from_nanos(nanos as u64))
}

fn invalid(raw: &FlushDelay) -> QueueError {
    let raw = match raw {
        FlushDelay::Millis(ms) => ms.to_string(),
        FlushDelay::Fractional(ms) => ms.to_string(),
        FlushDelay::Text(text) => format!("{text:?}"),
    };
    QueueError::config(format!(
        "flush_delay must be a non-negative number of milliseconds, got {raw}"
    ))
}

impl From<u64> for FlushDelay {
    fn from(ms: u64) -> Self {
        FlushDelay::Millis(ms)
    }
}

impl From<f64> for FlushDelay {
    fn from(ms: f64) -> Self {
        FlushDelay::Fractional(ms)
    }
}

impl From<&str> for FlushDelay {
    fn from(text: &str) -> Self {
        FlushDelay::Text(text.to_string())
    }
}

impl From<String> for FlushDelay {
    fn from(text: String) -> Self {
        FlushDelay::Text(text)
    }
}

/// Options recognized when building a queue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Required; see [`FlushDelay`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_delay: Option<FlushDelay>,

    /// Required; document field holding the coalescing key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// Optional; `off`, `error`, `warn`, `info`, `debug` or `trace` (default: `error`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl QueueConfig {
    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| QueueError::config(e.to_string()))
    }

    /// Validated flush delay
    pub fn flush_delay_duration(&self) -> Result<Duration> {
        self.flush_delay
            .as_ref()
            .ok_or_else(|| QueueError::config("a flush_delay is required"))?
            .to_duration()
    }

    /// Validated identifier field name
    pub fn identifier_field(&self) -> Result<&str> {
        match self.identifier.as_deref() {
            Some(field) if !field.is_empty() => Ok(field),
            Some(_) => Err(QueueError::config("identifier must not be empty")),
            None => Err(QueueError::config("an identifier is required")),
        }
    }

    /// Validated diagnostic level
    pub fn log_filter(&self) -> Result<LevelFilter> {
        parse_log_level(self.log_level.as_deref())
    }

    /// Overlay the options set in `other` on top of these
    pub fn merge(mut self, other: QueueConfig) -> Self {
        if other.flush_delay.is_some() {
            self.flush_delay = other.flush_delay;
        }
        if other.identifier.is_some() {
            self.identifier = other.identifier;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        self
    }
}

/// Parse a diagnostic level, defaulting to errors only
pub fn parse_log_level(level: Option<&str>) -> Result<LevelFilter> {
    match level {
        None => Ok(LevelFilter::ERROR),
        Some(text) => LevelFilter::from_str(text.trim())
            .map_err(|_| QueueError::config(format!("unknown log_level {text:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_string_delays() {
        let config = QueueConfig::from_toml_str("flush_delay = 250\nidentifier = \"_id\"").unwrap();
        assert_eq!(config.flush_delay_duration().unwrap(), Duration::from_millis(250));

        let config = QueueConfig::from_toml_str("flush_delay = \"1000\"\nidentifier = \"_id\"").unwrap();
        assert_eq!(config.flush_delay_duration().unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_options() {
        let config = QueueConfig::default();
        assert!(matches!(config.flush_delay_duration(), Err(QueueError::Configuration(_))));
        assert!(matches!(config.identifier_field(), Err(QueueError::Configuration(_))));
        assert_eq!(config.log_filter().unwrap(), LevelFilter::ERROR);
    }

    #[test]
    fn test_mistyped_options() {
        assert!(matches!(
            QueueConfig::from_toml_str("flush_delay = true"),
            Err(QueueError::Configuration(_))
        ));
        assert!(matches!(
            QueueConfig::from_toml_str("identifier = 7"),
            Err(QueueError::Configuration(_))
        ));
        assert!(matches!(
            QueueConfig::from_toml_str("flush_time = 100"),
            Err(QueueError::Configuration(_))
        ));

        let config = QueueConfig {
            flush_delay: Some("soon".into()),
            identifier: Some(String::new()),
            log_level: Some("loud".to_string()),
        };
        assert!(config.flush_delay_duration().is_err());
        assert!(config.identifier_field().is_err());
        assert!(config.log_filter().is_err());
    }

    #[test]
    fn test_zero_delay_runs_at_minimum() {
        assert_eq!(FlushDelay::Millis(0).to_duration().unwrap(), MIN_FLUSH_DELAY);
        assert_eq!(FlushDelay::from("0").to_duration().unwrap(), MIN_FLUSH_DELAY);
        assert_eq!(FlushDelay::from(0.25).to_duration().unwrap(), MIN_FLUSH_DELAY);
    }

    #[test]
    fn test_fractional_delays() {
        let expected = Duration::from_micros(250_500);
        assert_eq!(FlushDelay::from(250.5).to_duration().unwrap(), expected);
        assert_eq!(FlushDelay::from("250.5").to_duration().unwrap(), expected);

        let config = QueueConfig::from_toml_str("flush_delay = 250.5\nidentifier = \"_id\"").unwrap();
        assert_eq!(config.flush_delay, Some(FlushDelay::Fractional(250.5)));
        assert_eq!(config.flush_delay_duration().unwrap(), expected);
    }

    #[test]
    fn test_negative_and_non_finite_delays_rejected() {
        for delay in [
            FlushDelay::from(-1.0),
            FlushDelay::from("-5"),
            FlushDelay::from(f64::NAN),
            FlushDelay::from("inf"),
            FlushDelay::from(1e300),
        ] {
            assert!(
                matches!(delay.to_duration(), Err(QueueError::Configuration(_))),
                "{delay:?} should be rejected"
            );
        }

        let config = QueueConfig::from_toml_str("flush_delay = -5\nidentifier = \"_id\"").unwrap();
        assert!(config.flush_delay_duration().is_err());
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(parse_log_level(Some("debug")).unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_log_level(Some("warn")).unwrap(), LevelFilter::WARN);
        assert_eq!(parse_log_level(Some("off")).unwrap(), LevelFilter::OFF);
    }

    #[test]
    fn test_merge_prefers_later_values() {
        let file = QueueConfig {
            flush_delay: Some(FlushDelay::Millis(500)),
            identifier: Some("_id".to_string()),
            log_level: None,
        };
        let flags = QueueConfig {
            flush_delay: Some(FlushDelay::Millis(50)),
            identifier: None,
            log_level: Some("debug".to_string()),
        };

        let merged = file.merge(flags);
        assert_eq!(merged.flush_delay, Some(FlushDelay::Millis(50)));
        assert_eq!(merged.identifier.as_deref(), Some("_id"));
        assert_eq!(merged.log_level.as_deref(), Some("debug"));
    }
}
