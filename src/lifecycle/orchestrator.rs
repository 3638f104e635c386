// Lifecycle orchestration - per-pass atomic transitions
//
// Every mutating call runs under a per-reference lock: permission and
// transition validity are evaluated against the freshly loaded status inside
// the same critical section that writes the new state, so a permission check
// can never go stale between check and action. Operations on different
// passes never contend; reads bypass the locks entirely.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn, Instrument};

use crate::auth::{Action, AuthorizationMatrix, Role};
use crate::request::{GatePass, NewGatePass};
use crate::status::{Stage, Status};
use crate::store::WorkflowStore;
use crate::telemetry::create_lifecycle_span;

use super::returns::apply_returns;
use super::types::{AuditRecord, ForbiddenReason, LifecycleAction, LifecycleError, Requester};

pub struct LifecycleOrchestrator {
    store: Arc<dyn WorkflowStore>,
    // One mutex per reference number; entries are created on first touch.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LifecycleOrchestrator {
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn pass_lock(&self, reference: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(reference.to_string()).or_default().clone()
    }

    /// Create a gate pass and allocate its reference number.
    pub async fn create(
        &self,
        requester: &Requester,
        spec: NewGatePass,
    ) -> Result<GatePass, LifecycleError> {
        if !AuthorizationMatrix::is_permitted(requester.role, Action::CreateRequest) {
            warn!(
                role = %requester.role,
                "Gate pass creation denied"
            );
            return Err(LifecycleError::Forbidden {
                reason: ForbiddenReason::MissingPermission {
                    role: requester.role,
                    action: Action::CreateRequest,
                },
            });
        }
        spec.validate()?;

        let reference = self.store.allocate_reference().await?;
        let pass = GatePass::new(reference, requester.service_no.clone(), spec);
        self.store.insert(pass.clone()).await?;
        info!(
            reference = %pass.reference_number,
            requester = %requester.service_no,
            items = pass.items.len(),
            "Gate pass created"
        );
        Ok(pass)
    }

    /// Load a pass by reference number.
    pub async fn get(&self, reference: &str) -> Result<GatePass, LifecycleError> {
        Ok(self.store.get(reference).await?)
    }

    /// Passes created by the given actor, newest first. Identity is
    /// caller-supplied, never derived here.
    pub async fn list_for_actor(&self, service_no: &str) -> Result<Vec<GatePass>, LifecycleError> {
        Ok(self.store.list_for_actor(service_no).await?)
    }

    /// Every stored pass, newest first.
    pub async fn list_all(&self) -> Result<Vec<GatePass>, LifecycleError> {
        Ok(self.store.list_all().await?)
    }

    /// Apply a lifecycle action against the pass's *current* status.
    ///
    /// Approvals at a non-final stage land directly on the next stage's
    /// Pending code; the stage's Approved code is recorded in the audit
    /// trail only. Returns the persisted status.
    pub async fn transition(
        &self,
        requester: &Requester,
        reference: &str,
        action: LifecycleAction,
    ) -> Result<Status, LifecycleError> {
        let span = create_lifecycle_span("transition", reference, Some(requester.role.name()), None);
        self.transition_locked(requester, reference, action)
            .instrument(span)
            .await
    }

    async fn transition_locked(
        &self,
        requester: &Requester,
        reference: &str,
        action: LifecycleAction,
    ) -> Result<Status, LifecycleError> {
        let lock = self.pass_lock(reference).await;
        let _guard = lock.lock().await;

        let mut pass = self.store.get(reference).await?;
        let current = pass.status;

        // Resolve the action against the current status only. The action
        // names the stage the caller saw; anything but that stage's Pending
        // sub-state fails here, which rejects both a stale approval replay
        // and an attempt to skip a stage.
        let (stage_outcome, new_status) = match action {
            LifecycleAction::Approve(stage) if current == stage.pending_status() => {
                current.on_approve()
            }
            LifecycleAction::Reject(stage) if current == stage.pending_status() => {
                current.on_reject().map(|rejected| (rejected, rejected))
            }
            LifecycleAction::Cancel => current
                .can_cancel()
                .then_some((Status::Canceled, Status::Canceled)),
            _ => None,
        }
        .ok_or_else(|| {
            warn!(
                reference = %reference,
                status = %current,
                action = %action,
                "Transition rejected: action does not match current status"
            );
            LifecycleError::InvalidTransition {
                action,
                status: current,
            }
        })?;

        // Permission is evaluated inside the same locked operation that
        // mutates state, never cached from an earlier check.
        let required = action.required_permission();
        if !AuthorizationMatrix::is_permitted(requester.role, required) {
            warn!(
                reference = %reference,
                role = %requester.role,
                required = %required,
                "Transition denied: missing permission"
            );
            return Err(LifecycleError::Forbidden {
                reason: ForbiddenReason::MissingPermission {
                    role: requester.role,
                    action: required,
                },
            });
        }

        // Executive approvals are additionally scoped to the officer of
        // record when one is assigned; unassigned passes are open to any
        // role holding the stage's action.
        if action.stage() == Some(Stage::Executive) {
            if let Some(assignee) = &pass.executive_officer_assignee {
                if assignee != &requester.service_no {
                    warn!(
                        reference = %reference,
                        assignee = %assignee,
                        actor = %requester.service_no,
                        "Transition denied: executive assignee mismatch"
                    );
                    return Err(LifecycleError::Forbidden {
                        reason: ForbiddenReason::AssigneeMismatch {
                            assignee: assignee.clone(),
                        },
                    });
                }
            }
        }

        // Cancellation is requester-scoped for non-admin roles.
        if action == LifecycleAction::Cancel
            && !matches!(requester.role, Role::SuperAdmin | Role::Admin)
            && pass.requester_service_no != requester.service_no
        {
            warn!(
                reference = %reference,
                creator = %pass.requester_service_no,
                actor = %requester.service_no,
                "Cancellation denied: not the original requester"
            );
            return Err(LifecycleError::Forbidden {
                reason: ForbiddenReason::NotRequester {
                    requester_service_no: pass.requester_service_no.clone(),
                },
            });
        }

        let now = Utc::now();
        pass.status = new_status;
        pass.updated_at = now;
        pass.history.push(AuditRecord {
            actor_service_no: requester.service_no.clone(),
            role: requester.role,
            action,
            stage_outcome,
            resulting_status: new_status,
            at: now,
        });
        self.store.put(pass).await?;

        info!(
            reference = %reference,
            action = %action,
            from = %current,
            outcome = %stage_outcome,
            to = %new_status,
            actor = %requester.service_no,
            role = %requester.role,
            "Gate pass transitioned"
        );
        Ok(new_status)
    }

    /// Cancel a pass. Only reachable from Executive Pending, and only by the
    /// original requester or an administrative role.
    pub async fn cancel(
        &self,
        requester: &Requester,
        reference: &str,
    ) -> Result<Status, LifecycleError> {
        self.transition(requester, reference, LifecycleAction::Cancel)
            .await
    }

    /// Mark items on a pass as returned through the gate.
    ///
    /// Permitted only while the pass is in the Receive stage's Pending or
    /// Approved status. Serials that do not match a returnable,
    /// still-pending item are skipped; the count reports matches only, and
    /// repeating a call is harmless.
    pub async fn mark_returned(
        &self,
        requester: &Requester,
        reference: &str,
        serial_numbers: &HashSet<String>,
    ) -> Result<usize, LifecycleError> {
        let span =
            create_lifecycle_span("mark_returned", reference, Some(requester.role.name()), None);
        self.mark_returned_locked(requester, reference, serial_numbers)
            .instrument(span)
            .await
    }

    async fn mark_returned_locked(
        &self,
        requester: &Requester,
        reference: &str,
        serial_numbers: &HashSet<String>,
    ) -> Result<usize, LifecycleError> {
        let lock = self.pass_lock(reference).await;
        let _guard = lock.lock().await;

        let mut pass = self.store.get(reference).await?;

        if !matches!(
            pass.status,
            Status::ReceivePending | Status::ReceiveApproved
        ) {
            warn!(
                reference = %reference,
                status = %pass.status,
                "Return rejected: pass has not reached the Receive stage"
            );
            return Err(LifecycleError::InvalidState {
                status: pass.status,
            });
        }

        if !AuthorizationMatrix::is_permitted(requester.role, Action::MarkReturned) {
            warn!(
                reference = %reference,
                role = %requester.role,
                "Return denied: missing permission"
            );
            return Err(LifecycleError::Forbidden {
                reason: ForbiddenReason::MissingPermission {
                    role: requester.role,
                    action: Action::MarkReturned,
                },
            });
        }

        let updated = apply_returns(&mut pass, serial_numbers, Utc::now());
        if updated > 0 {
            pass.updated_at = Utc::now();
            self.store.put(pass).await?;
        }

        info!(
            reference = %reference,
            requested = serial_numbers.len(),
            updated = updated,
            actor = %requester.service_no,
            "Item returns recorded"
        );
        Ok(updated)
    }

    /// Reassign the executive officer of record. Administrative operation,
    /// valid only while the pass still awaits the executive decision.
    pub async fn reassign_executive(
        &self,
        requester: &Requester,
        reference: &str,
        assignee: Option<String>,
    ) -> Result<(), LifecycleError> {
        if !AuthorizationMatrix::is_permitted(requester.role, Action::AdministerUsers) {
            return Err(LifecycleError::Forbidden {
                reason: ForbiddenReason::MissingPermission {
                    role: requester.role,
                    action: Action::AdministerUsers,
                },
            });
        }

        let lock = self.pass_lock(reference).await;
        let _guard = lock.lock().await;

        let mut pass = self.store.get(reference).await?;
        if pass.status != Status::ExecutivePending {
            return Err(LifecycleError::InvalidState {
                status: pass.status,
            });
        }

        pass.executive_officer_assignee = assignee;
        pass.updated_at = Utc::now();
        let assignee_field = pass.executive_officer_assignee.clone();
        self.store.put(pass).await?;
        info!(
            reference = %reference,
            assignee = ?assignee_field,
            actor = %requester.service_no,
            "Executive officer reassigned"
        );
        Ok(())
    }
}
