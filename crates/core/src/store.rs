//! Coalescing store
//!
//! Holds at most one pending operation per document id and folds each new
//! intent into it according to the merge policy:
//!
//! | incoming | nothing pending | CREATE pending   | UPDATE pending   | DELETE pending |
//! |----------|-----------------|------------------|------------------|----------------|
//! | CREATE   | insert          | warn, overwrite  | warn, overwrite  | warn, overwrite |
//! | UPDATE   | insert          | merge (CREATE)   | merge (UPDATE)   | warn, ignore   |
//! | DELETE   | insert          | drop the entry   | replace          | replace        |

use crate::document::{Document, DocumentId};
use crate::merge::merge_documents;
use crate::operation::{OpKind, PendingOperation};
use crate::Result;
use ahash::AHashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::level_filters::LevelFilter;
use tracing::{debug, warn, Level};

/// Pending operations keyed by document id, handed over as one unit on flush
pub type Batch = AHashMap<DocumentId, PendingOperation>;

/// Borrow a batch in id order, for stable output
pub fn ordered(batch: &Batch) -> BTreeMap<&DocumentId, &PendingOperation> {
    batch.iter().collect()
}

/// Per-document coalescing of write intents
pub struct CoalescingStore {
    /// Name of the field holding the coalescing key
    identifier: String,
    /// Verbosity of this store's own diagnostics
    log_level: LevelFilter,
    pending: Batch,
}

impl CoalescingStore {
    /// Create an empty store keyed on `identifier`
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            log_level: LevelFilter::ERROR,
            pending: Batch::default(),
        }
    }

    /// Set how much this store reports about merges and anomalies
    pub fn with_log_level(mut self, log_level: LevelFilter) -> Self {
        self.log_level = log_level;
        self
    }

    /// Fold one intent into the store
    ///
    /// Fails without touching the store if the document has no identifier.
    pub fn submit(
        &mut self,
        kind: OpKind,
        document: Document,
        metadata: Option<Value>,
    ) -> Result<DocumentId> {
        let id = DocumentId::extract(&document, &self.identifier)?;

        match kind {
            OpKind::Create => self.queue_create(id.clone(), document, metadata),
            OpKind::Update => self.queue_update(id.clone(), document, metadata),
            OpKind::Delete => self.queue_delete(id.clone(), document, metadata),
        }

        Ok(id)
    }

    fn queue_create(&mut self, id: DocumentId, document: Document, metadata: Option<Value>) {
        if let Some(current) = self.pending.get(&id) {
            if enabled(self.log_level, Level::WARN) {
                warn!(
                    id = %id,
                    current = %current.kind,
                    "received a create for a document that is already queued"
                );
            }
        }

        self.insert(id, PendingOperation::new(OpKind::Create, document, metadata));
    }

    fn queue_update(&mut self, id: DocumentId, document: Document, metadata: Option<Value>) {
        let log_level = self.log_level;

        match self.pending.get_mut(&id) {
            Some(current) if current.kind == OpKind::Delete => {
                if enabled(log_level, Level::WARN) {
                    warn!(
                        id = %id,
                        update = ?document,
                        "received an update for a document that is queued to be deleted"
                    );
                }
            }
            Some(current) => {
                merge_documents(&mut current.document, document);
                if metadata.is_some() {
                    current.metadata = metadata;
                }
                if enabled(log_level, Level::DEBUG) {
                    debug!(
                        id = %id,
                        kind = %current.kind,
                        merged = ?current.document,
                        "merged update into pending operation"
                    );
                }
            }
            None => self.insert(id, PendingOperation::new(OpKind::Update, document, metadata)),
        }
    }

    fn queue_delete(&mut self, id: DocumentId, document: Document, metadata: Option<Value>) {
        let pending_create = self
            .pending
            .get(&id)
            .is_some_and(|current| current.kind == OpKind::Create);

        if pending_create {
            // Created and deleted inside one window: nothing to write
            self.pending.remove(&id);
            if enabled(self.log_level, Level::DEBUG) {
                debug!(id = %id, "omitting create from queue because of delete");
            }
        } else {
            self.insert(id, PendingOperation::new(OpKind::Delete, document, metadata));
        }
    }

    fn insert(&mut self, id: DocumentId, operation: PendingOperation) {
        if enabled(self.log_level, Level::DEBUG) {
            debug!(id = %id, kind = %operation.kind, "queueing operation");
        }
        self.pending.insert(id, operation);
    }

    /// Swap the contents out, leaving the store empty
    ///
    /// Returns `None` when there is nothing to hand over.
    pub fn take(&mut self) -> Option<Batch> {
        if self.pending.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending))
    }

    /// Pending operation for an id
    pub fn get(&self, id: &str) -> Option<&PendingOperation> {
        self.pending.get(id)
    }

    /// Current contents
    pub fn pending(&self) -> &Batch {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn enabled(filter: LevelFilter, level: Level) -> bool {
    level <= filter
}
