//! Gate pass lifecycle state management tests
//!
//! These tests verify the approval pipeline from creation through the final
//! Receive stage, including the properties that keep the pipeline honest:
//!
//! Test coverage:
//! - Full Executive -> Verify -> Dispatch -> Receive approval run
//! - Stage order is enforced (no skipping, no replay)
//! - Rejection terminates the pipeline at the current stage
//! - Cancellation is Executive-Pending-only and requester-scoped
//! - Two concurrent approvals resolve to exactly one winner
//! - Executive assignee scoping

use std::collections::HashSet;
use std::sync::Arc;

use gatepass::{
    Destination, GatePass, LifecycleAction, LifecycleError, LifecycleOrchestrator, MemoryStore,
    NewGatePass, NewItem, Requester, Role, Stage, Status,
};

fn item(serial: &str, returnable: bool) -> NewItem {
    NewItem {
        serial_no: serial.to_string(),
        item_model: "TP-Link ER605".to_string(),
        item_category: "Router".to_string(),
        item_quantity: 1,
        is_returnable: returnable,
    }
}

fn pass_spec(assignee: Option<&str>) -> NewGatePass {
    NewGatePass {
        executive_officer_assignee: assignee.map(str::to_string),
        destination: Destination::Internal {
            location: "Regional Store - Matara".to_string(),
        },
        items: vec![item("A1", true)],
    }
}

fn orchestrator() -> LifecycleOrchestrator {
    LifecycleOrchestrator::new(Arc::new(MemoryStore::new()))
}

async fn orchestrator_with_pass(assignee: Option<&str>) -> (LifecycleOrchestrator, GatePass) {
    let orchestrator = orchestrator();
    let creator = Requester::new("SN1001", Role::User);
    let pass = orchestrator
        .create(&creator, pass_spec(assignee))
        .await
        .unwrap();
    (orchestrator, pass)
}

#[tokio::test]
async fn test_full_approval_pipeline() {
    let (orchestrator, pass) = orchestrator_with_pass(None).await;
    let reference = &pass.reference_number;
    assert_eq!(pass.status, Status::ExecutivePending);

    let approver = Requester::new("SN2001", Role::Approver);
    let verifier = Requester::new("SN3001", Role::SecurityOfficer);
    let dispatcher = Requester::new("SN4001", Role::Dispatcher);
    let receiver = Requester::new("SN5001", Role::User);

    // Each approval lands directly on the next stage's pending status
    let status = orchestrator
        .transition(&approver, reference, LifecycleAction::Approve(Stage::Executive))
        .await
        .unwrap();
    assert_eq!(status, Status::VerifyPending);

    let status = orchestrator
        .transition(&verifier, reference, LifecycleAction::Approve(Stage::Verify))
        .await
        .unwrap();
    assert_eq!(status, Status::DispatchPending);

    let status = orchestrator
        .transition(&dispatcher, reference, LifecycleAction::Approve(Stage::Dispatch))
        .await
        .unwrap();
    assert_eq!(status, Status::ReceivePending);

    let status = orchestrator
        .transition(&receiver, reference, LifecycleAction::Approve(Stage::Receive))
        .await
        .unwrap();
    assert_eq!(status, Status::ReceiveApproved);

    // Terminal: nothing further applies
    let err = orchestrator
        .transition(&receiver, reference, LifecycleAction::Approve(Stage::Receive))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_audit_trail_records_each_stage_outcome() {
    let (orchestrator, pass) = orchestrator_with_pass(None).await;
    let reference = &pass.reference_number;

    let approver = Requester::new("SN2001", Role::Approver);
    orchestrator
        .transition(&approver, reference, LifecycleAction::Approve(Stage::Executive))
        .await
        .unwrap();

    let stored = orchestrator.get(reference).await.unwrap();
    assert_eq!(stored.history.len(), 1);
    let record = &stored.history[0];
    assert_eq!(record.actor_service_no, "SN2001");
    assert_eq!(record.role, Role::Approver);
    // The Approved code survives in the audit trail even though the
    // persisted status auto-advanced past it
    assert_eq!(record.stage_outcome, Status::ExecutiveApproved);
    assert_eq!(record.resulting_status, Status::VerifyPending);
}

#[tokio::test]
async fn test_rejection_is_terminal_at_current_stage() {
    let (orchestrator, pass) = orchestrator_with_pass(None).await;
    let reference = &pass.reference_number;

    let approver = Requester::new("SN2001", Role::Approver);
    orchestrator
        .transition(&approver, reference, LifecycleAction::Approve(Stage::Executive))
        .await
        .unwrap();

    // Reject at Verify
    let verifier = Requester::new("SN3001", Role::SecurityOfficer);
    let status = orchestrator
        .transition(&verifier, reference, LifecycleAction::Reject(Stage::Verify))
        .await
        .unwrap();
    assert_eq!(status, Status::VerifyRejected);

    // Pipeline is over; later stages never see it
    let dispatcher = Requester::new("SN4001", Role::Dispatcher);
    let err = orchestrator
        .transition(&dispatcher, reference, LifecycleAction::Approve(Stage::Dispatch))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidTransition {
            status: Status::VerifyRejected,
            ..
        }
    ));
}

#[tokio::test]
async fn test_stage_order_cannot_be_skipped() {
    let (orchestrator, pass) = orchestrator_with_pass(None).await;
    let reference = &pass.reference_number;

    // A dispatch-stage approval against Executive Pending is a stage skip
    let dispatcher = Requester::new("SN4001", Role::Dispatcher);
    let err = orchestrator
        .transition(&dispatcher, reference, LifecycleAction::Approve(Stage::Dispatch))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidTransition {
            status: Status::ExecutivePending,
            ..
        }
    ));

    // Advance to Verify Pending, then replay the executive approval: the
    // action no longer matches the current status, even though the role
    // also holds the verify-stage grant.
    let approver = Requester::new("SN2001", Role::Approver);
    orchestrator
        .transition(&approver, reference, LifecycleAction::Approve(Stage::Executive))
        .await
        .unwrap();
    let err = orchestrator
        .transition(&approver, reference, LifecycleAction::Approve(Stage::Executive))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidTransition {
            status: Status::VerifyPending,
            ..
        }
    ));
    let status = orchestrator.get(reference).await.unwrap().status;
    assert_eq!(status, Status::VerifyPending);
}

#[tokio::test]
async fn test_cancellation_by_creator_then_pipeline_closed() {
    let (orchestrator, pass) = orchestrator_with_pass(None).await;
    let reference = &pass.reference_number;

    let creator = Requester::new("SN1001", Role::User);
    let status = orchestrator.cancel(&creator, reference).await.unwrap();
    assert_eq!(status, Status::Canceled);

    let approver = Requester::new("SN2001", Role::Approver);
    let err = orchestrator
        .transition(&approver, reference, LifecycleAction::Approve(Stage::Executive))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_cancellation_denied_for_other_users_allowed_for_admin() {
    let (orchestrator, pass) = orchestrator_with_pass(None).await;
    let reference = &pass.reference_number;

    // A different member holding the Cancel grant is still not the creator
    let stranger = Requester::new("SN9999", Role::User);
    let err = orchestrator.cancel(&stranger, reference).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Forbidden { .. }));

    // Administrative roles may cancel on the requester's behalf
    let admin = Requester::new("SN0001", Role::Admin);
    let status = orchestrator.cancel(&admin, reference).await.unwrap();
    assert_eq!(status, Status::Canceled);
}

#[tokio::test]
async fn test_cancellation_unreachable_after_executive_approval() {
    let (orchestrator, pass) = orchestrator_with_pass(None).await;
    let reference = &pass.reference_number;

    let approver = Requester::new("SN2001", Role::Approver);
    orchestrator
        .transition(&approver, reference, LifecycleAction::Approve(Stage::Executive))
        .await
        .unwrap();

    // Items may already be in physical transit once executive-approved
    let creator = Requester::new("SN1001", Role::User);
    let err = orchestrator.cancel(&creator, reference).await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidTransition {
            action: LifecycleAction::Cancel,
            status: Status::VerifyPending,
        }
    ));
}

#[tokio::test]
async fn test_concurrent_approvals_resolve_to_one_winner() {
    let (orchestrator, pass) = orchestrator_with_pass(None).await;
    let orchestrator = Arc::new(orchestrator);
    let reference = pass.reference_number.clone();

    let first = {
        let orchestrator = Arc::clone(&orchestrator);
        let reference = reference.clone();
        tokio::spawn(async move {
            let approver = Requester::new("SN2001", Role::Approver);
            orchestrator
                .transition(&approver, &reference, LifecycleAction::Approve(Stage::Executive))
                .await
        })
    };
    let second = {
        let orchestrator = Arc::clone(&orchestrator);
        let reference = reference.clone();
        tokio::spawn(async move {
            let approver = Requester::new("SN2002", Role::Approver);
            orchestrator
                .transition(&approver, &reference, LifecycleAction::Approve(Stage::Executive))
                .await
        })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let successes = results.iter().filter(|result| result.is_ok()).count();
    let invalid = results
        .iter()
        .filter(|result| {
            matches!(
                result,
                Err(LifecycleError::InvalidTransition {
                    status: Status::VerifyPending,
                    ..
                })
            )
        })
        .count();
    assert_eq!(successes, 1, "exactly one approval must win");
    assert_eq!(invalid, 1, "the loser must see a normal InvalidTransition");

    let stored = orchestrator.get(&reference).await.unwrap();
    assert_eq!(stored.status, Status::VerifyPending);
    assert_eq!(stored.history.len(), 1);
}

#[tokio::test]
async fn test_executive_assignee_scoping() {
    let (orchestrator, pass) = orchestrator_with_pass(Some("SN2001")).await;
    let reference = &pass.reference_number;

    // Structurally allowed, but not the officer of record
    let other_approver = Requester::new("SN2002", Role::Approver);
    let err = orchestrator
        .transition(&other_approver, reference, LifecycleAction::Approve(Stage::Executive))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Forbidden { .. }));

    // The assigned officer proceeds
    let assigned = Requester::new("SN2001", Role::Approver);
    let status = orchestrator
        .transition(&assigned, reference, LifecycleAction::Approve(Stage::Executive))
        .await
        .unwrap();
    assert_eq!(status, Status::VerifyPending);
}

#[tokio::test]
async fn test_unassigned_pass_open_to_any_stage_holder() {
    let (orchestrator, pass) = orchestrator_with_pass(None).await;
    let reference = &pass.reference_number;

    let any_approver = Requester::new("SN7777", Role::Approver);
    let status = orchestrator
        .transition(&any_approver, reference, LifecycleAction::Approve(Stage::Executive))
        .await
        .unwrap();
    assert_eq!(status, Status::VerifyPending);
}

#[tokio::test]
async fn test_executive_reassignment_window() {
    let (orchestrator, pass) = orchestrator_with_pass(Some("SN2001")).await;
    let reference = &pass.reference_number;

    let admin = Requester::new("SN0001", Role::Admin);
    let user = Requester::new("SN1001", Role::User);

    // Non-admin roles cannot reassign
    let err = orchestrator
        .reassign_executive(&user, reference, Some("SN2002".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Forbidden { .. }));

    // Admin reassigns while the executive decision is pending
    orchestrator
        .reassign_executive(&admin, reference, Some("SN2002".to_string()))
        .await
        .unwrap();
    let stored = orchestrator.get(reference).await.unwrap();
    assert_eq!(
        stored.executive_officer_assignee.as_deref(),
        Some("SN2002")
    );

    // Window closes once the stage is past
    let assigned = Requester::new("SN2002", Role::Approver);
    orchestrator
        .transition(&assigned, reference, LifecycleAction::Approve(Stage::Executive))
        .await
        .unwrap();
    let err = orchestrator
        .reassign_executive(&admin, reference, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidState { .. }));
}

#[tokio::test]
async fn test_unknown_reference_fails_not_found() {
    let orchestrator = orchestrator();
    let approver = Requester::new("SN2001", Role::Approver);
    let err = orchestrator
        .transition(&approver, "GP-2026-99999", LifecycleAction::Approve(Stage::Executive))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound { .. }));

    let mut serials = HashSet::new();
    serials.insert("A1".to_string());
    let officer = Requester::new("SN3001", Role::SecurityOfficer);
    let err = orchestrator
        .mark_returned(&officer, "GP-2026-99999", &serials)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound { .. }));
}

#[tokio::test]
async fn test_create_requires_items_and_permission() {
    let orchestrator = orchestrator();

    // Dispatcher holds no create grant
    let dispatcher = Requester::new("SN4001", Role::Dispatcher);
    let err = orchestrator
        .create(&dispatcher, pass_spec(None))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Forbidden { .. }));

    // Empty item list is not a valid pass
    let creator = Requester::new("SN1001", Role::User);
    let mut empty = pass_spec(None);
    empty.items.clear();
    let err = orchestrator.create(&creator, empty).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Validation(_)));
}

#[tokio::test]
async fn test_operations_on_distinct_passes_are_independent() {
    let orchestrator = Arc::new(orchestrator());
    let creator = Requester::new("SN1001", Role::User);

    let mut references = Vec::new();
    for _ in 0..4 {
        let pass = orchestrator
            .create(&creator, pass_spec(None))
            .await
            .unwrap();
        references.push(pass.reference_number);
    }

    let handles: Vec<_> = references
        .iter()
        .map(|reference| {
            let orchestrator = Arc::clone(&orchestrator);
            let reference = reference.clone();
            tokio::spawn(async move {
                let approver = Requester::new("SN2001", Role::Approver);
                orchestrator
                    .transition(&approver, &reference, LifecycleAction::Approve(Stage::Executive))
                    .await
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    for reference in &references {
        let stored = orchestrator.get(reference).await.unwrap();
        assert_eq!(stored.status, Status::VerifyPending);
    }
}
