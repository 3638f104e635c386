use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::auth::{Action, Role};
use crate::request::PassValidationError;
use crate::status::{Stage, Status};
use crate::store::StoreError;

/// Explicit call context. Identity is caller-supplied and passed into every
/// orchestrator call; no component reads identity from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub service_no: String,
    pub role: Role,
}

impl Requester {
    pub fn new(service_no: impl Into<String>, role: Role) -> Self {
        Self {
            service_no: service_no.into(),
            role,
        }
    }
}

/// Lifecycle decision requested against a pass. Approvals and rejections
/// name the stage the caller saw, and the orchestrator resolves them against
/// the *current* status only: a stale executive approval replayed against a
/// pass that already moved to Verify is an InvalidTransition, never a
/// verify-stage decision in disguise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleAction {
    Approve(Stage),
    Reject(Stage),
    Cancel,
}

impl LifecycleAction {
    /// Stage the action is scoped to. Cancellation is not stage-scoped.
    pub fn stage(self) -> Option<Stage> {
        match self {
            LifecycleAction::Approve(stage) | LifecycleAction::Reject(stage) => Some(stage),
            LifecycleAction::Cancel => None,
        }
    }

    /// Permission required to take this action. Dispatch and Receive are
    /// stage-scoped verbs covering both decisions; the earlier stages use
    /// the generic approve/reject grants.
    pub fn required_permission(self) -> Action {
        match self {
            LifecycleAction::Cancel => Action::Cancel,
            LifecycleAction::Approve(Stage::Dispatch)
            | LifecycleAction::Reject(Stage::Dispatch) => Action::Dispatch,
            LifecycleAction::Approve(Stage::Receive)
            | LifecycleAction::Reject(Stage::Receive) => Action::Receive,
            LifecycleAction::Approve(_) => Action::ApproveStage,
            LifecycleAction::Reject(_) => Action::RejectStage,
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleAction::Approve(stage) => write!(f, "approve {stage}"),
            LifecycleAction::Reject(stage) => write!(f, "reject {stage}"),
            LifecycleAction::Cancel => write!(f, "cancel"),
        }
    }
}

/// One applied transition: who, what, when, and where it landed. The stage's
/// Approved code (2/5/8) survives here even though the persisted status
/// auto-advances past it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub actor_service_no: String,
    pub role: Role,
    pub action: LifecycleAction,
    /// Outcome code at the stage the action was taken (e.g. 2 for an
    /// Executive approval).
    pub stage_outcome: Status,
    /// Status persisted after the fused auto-advance.
    pub resulting_status: Status,
    pub at: DateTime<Utc>,
}

/// Why an authorization check failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// The role does not hold the required action at all.
    MissingPermission { role: Role, action: Action },
    /// The role holds the action, but the pass is assigned to a specific
    /// executive officer of record.
    AssigneeMismatch { assignee: String },
    /// Cancellation by a non-admin role other than the pass creator.
    NotRequester { requester_service_no: String },
}

impl fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForbiddenReason::MissingPermission { role, action } => {
                write!(f, "role {role} is not granted {action}")
            }
            ForbiddenReason::AssigneeMismatch { assignee } => {
                write!(f, "pass is assigned to officer {assignee}")
            }
            ForbiddenReason::NotRequester {
                requester_service_no,
            } => {
                write!(
                    f,
                    "only the original requester may cancel (pass created by {requester_service_no})"
                )
            }
        }
    }
}

/// Caller-facing failures. All are terminal for the call; the core never
/// retries and a failed call leaves the pass exactly as it was.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("gate pass {reference} not found")]
    NotFound { reference: String },

    #[error("forbidden: {reason}")]
    Forbidden { reason: ForbiddenReason },

    #[error("cannot {action} a pass at status {status}")]
    InvalidTransition {
        action: LifecycleAction,
        status: Status,
    },

    #[error("operation requires the Receive stage; pass is at status {status}")]
    InvalidState { status: Status },

    #[error("invalid gate pass: {0}")]
    Validation(#[from] PassValidationError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { reference } => LifecycleError::NotFound { reference },
            other => LifecycleError::Store(other),
        }
    }
}
