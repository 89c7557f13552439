//! Error types shared by the store and the queue

use thiserror::Error;

/// Errors returned synchronously by construction and submission
///
/// Soft anomalies in the merge policy are never reported here; they are
/// logged and the submission proceeds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// A construction option is missing or has the wrong shape
    #[error("invalid queue configuration: {0}")]
    Configuration(String),

    /// The operation name is not CREATE, UPDATE or DELETE
    #[error("the operation you are trying to queue is not supported: {0:?}")]
    UnsupportedOperation(String),

    /// The document has no value at the configured identifier field
    #[error("the document you are trying to queue does not have the identifier field {0:?}")]
    MissingIdentifier(String),

    /// The queue was stopped and accepts no more submissions
    #[error("the queue has been stopped")]
    Stopped,
}

impl QueueError {
    /// Shorthand for a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
