// Gate pass lifecycle - the single authoritative state machine
//
// Transitions are request-scoped and atomic: a call either applies fully,
// with the actor and timestamp recorded, or fails leaving the pass untouched.

pub mod orchestrator;
pub mod returns;
pub mod types;

pub use orchestrator::LifecycleOrchestrator;
pub use types::{AuditRecord, ForbiddenReason, LifecycleAction, LifecycleError, Requester};
