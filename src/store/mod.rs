// Workflow store - durable persistence boundary for gate pass state
//
// The orchestrator owns mutation ordering (per-reference locking); the store
// is the transactional resource and is never consulted for permissions.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::request::GatePass;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("gate pass {reference} not found")]
    NotFound { reference: String },

    #[error("gate pass {reference} already exists")]
    DuplicateReference { reference: String },

    #[error("state file version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence operations the lifecycle core needs from a workflow store.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Load a pass by reference number.
    async fn get(&self, reference: &str) -> Result<GatePass, StoreError>;

    /// Insert a newly created pass. Fails on a duplicate reference.
    async fn insert(&self, pass: GatePass) -> Result<(), StoreError>;

    /// Replace an existing pass. Fails if the reference is unknown.
    async fn put(&self, pass: GatePass) -> Result<(), StoreError>;

    /// Passes created by the given actor, newest first.
    async fn list_for_actor(&self, service_no: &str) -> Result<Vec<GatePass>, StoreError>;

    /// Every stored pass, newest first.
    async fn list_all(&self) -> Result<Vec<GatePass>, StoreError>;

    /// Allocate the next unique reference number.
    async fn allocate_reference(&self) -> Result<String, StoreError>;
}
