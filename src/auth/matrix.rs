use serde::{Deserialize, Serialize};
use std::fmt;

use super::role::Role;

/// Actions a role may be granted. Stage-scoped verbs (Dispatch, Receive)
/// cover both the approve and reject decisions at their stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    View,
    CreateRequest,
    ApproveStage,
    RejectStage,
    Dispatch,
    Receive,
    MarkReturned,
    Cancel,
    AdministerReferenceData,
    AdministerUsers,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::View => "view",
            Action::CreateRequest => "create-request",
            Action::ApproveStage => "approve-stage",
            Action::RejectStage => "reject-stage",
            Action::Dispatch => "dispatch",
            Action::Receive => "receive",
            Action::MarkReturned => "mark-returned",
            Action::Cancel => "cancel",
            Action::AdministerReferenceData => "administer-reference-data",
            Action::AdministerUsers => "administer-users",
        };
        write!(f, "{}", name)
    }
}

/// Static role-to-action policy. The table is exhaustive over the closed
/// Role enumeration: every (role, action) pair is either explicitly granted
/// here or denied, with no falsy-lookup path.
///
/// The orchestrator re-validates a grant inside the same locked operation
/// that mutates state; callers must not cache `is_permitted` results across
/// calls.
pub struct AuthorizationMatrix;

impl AuthorizationMatrix {
    /// Granted actions for a role, in policy order. Non-empty for every
    /// role; a role with zero grants is a configuration error, not a guest.
    pub fn permitted_actions(role: Role) -> &'static [Action] {
        match role {
            Role::SuperAdmin => &[
                Action::View,
                Action::CreateRequest,
                Action::ApproveStage,
                Action::RejectStage,
                Action::Dispatch,
                Action::Receive,
                Action::MarkReturned,
                Action::Cancel,
                Action::AdministerReferenceData,
                Action::AdministerUsers,
            ],
            Role::Admin => &[
                Action::View,
                Action::CreateRequest,
                Action::Cancel,
                Action::AdministerReferenceData,
                Action::AdministerUsers,
            ],
            Role::User => &[
                Action::View,
                Action::CreateRequest,
                Action::Receive,
                Action::Cancel,
            ],
            Role::Approver => &[Action::View, Action::ApproveStage, Action::RejectStage],
            Role::SecurityOfficer => &[
                Action::View,
                Action::ApproveStage,
                Action::RejectStage,
                Action::MarkReturned,
            ],
            Role::Pleader => &[Action::View, Action::ApproveStage, Action::RejectStage],
            Role::Dispatcher => &[Action::View, Action::Dispatch],
        }
    }

    pub fn is_permitted(role: Role, action: Action) -> bool {
        Self::permitted_actions(role).contains(&action)
    }
}
