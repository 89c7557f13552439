//! Write-coalescing core for opque
//!
//! This crate provides:
//! - Operation kinds and the per-document pending record
//! - Document identifier extraction
//! - Deterministic deep merge over JSON values
//! - The coalescing store that applies the merge policy

pub mod document;
pub mod error;
pub mod merge;
pub mod operation;
pub mod store;

// Re-exports
pub use document::{Document, DocumentId};
pub use error::QueueError;
pub use merge::{deep_merge, merge_documents};
pub use operation::{OpKind, PendingOperation};
pub use store::{ordered, Batch, CoalescingStore};

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, QueueError>;
