//! Eagerly validating construction of [`OpQueue`]

use crate::config::{FlushDelay, QueueConfig};
use crate::{FlushHandler, OpQueue};
use opque_core::{QueueError, Result};
use tokio::runtime::Handle;

/// Builder for [`OpQueue`]
///
/// Nothing is checked until [`build`](Self::build), which fails before any
/// timer is started if an option is missing or malformed.
#[derive(Default)]
pub struct OpQueueBuilder {
    config: QueueConfig,
    handler: Option<Box<dyn FlushHandler>>,
}

impl OpQueueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from loaded configuration
    pub fn from_config(config: QueueConfig) -> Self {
        Self {
            config,
            handler: None,
        }
    }

    /// Milliseconds of quiet before a flush (number or numeric string)
    pub fn flush_delay(mut self, delay: impl Into<FlushDelay>) -> Self {
        self.config.flush_delay = Some(delay.into());
        self
    }

    /// Document field holding the coalescing key
    pub fn identifier(mut self, field: impl Into<String>) -> Self {
        self.config.identifier = Some(field.into());
        self
    }

    /// Verbosity of the queue's diagnostics (default: `error`)
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = Some(level.into());
        self
    }

    /// Consumer of flushed batches
    pub fn on_flush(mut self, handler: impl FlushHandler) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Validate the options and arm the queue
    ///
    /// Must be called inside a Tokio runtime; the flush timer lives on it.
    pub fn build(self) -> Result<OpQueue> {
        let flush_delay = self.config.flush_delay_duration()?;
        let handler = self
            .handler
            .ok_or_else(|| QueueError::config("a flush handler is required"))?;
        let identifier = self.config.identifier_field()?.to_string();
        let log_level = self.config.log_filter()?;
        let runtime = Handle::try_current()
            .map_err(|_| QueueError::config("the queue must be built inside a Tokio runtime"))?;

        Ok(OpQueue::start(flush_delay, identifier, log_level, handler, runtime))
    }
}
