// Gate Pass - approval pipeline orchestration for physical item movement
// This exposes the core components for testing and integration

pub mod auth;
pub mod config;
pub mod lifecycle;
pub mod menu;
pub mod request;
pub mod status;
pub mod store;
pub mod telemetry;

// Re-export key types for easy access
pub use auth::{Action, AuthorizationMatrix, Role, UnknownRole};
pub use config::{config, init_config, GatePassConfig};
pub use lifecycle::{
    AuditRecord, ForbiddenReason, LifecycleAction, LifecycleError, LifecycleOrchestrator,
    Requester,
};
pub use menu::{MenuEntry, MenuResolver, MenuTarget, DEFAULT_MENU};
pub use request::{
    Destination, GatePass, Item, NewGatePass, NewItem, PassValidationError, ReturnStatus,
};
pub use status::{Outcome, Stage, Status, StatusCategory, UnknownStatus};
pub use store::{FileStore, MemoryStore, StoreError, WorkflowStore};
pub use telemetry::{create_lifecycle_span, generate_correlation_id, init_telemetry};
