use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle status of a gate pass, one of the 13 wire codes.
/// The integer codes are the external contract and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum Status {
    /// 1 - awaiting executive officer decision
    ExecutivePending = 1,
    /// 2 - executive approved (audit-only, auto-advances to 4)
    ExecutiveApproved = 2,
    /// 3 - executive rejected, terminal
    ExecutiveRejected = 3,
    /// 4 - awaiting verification
    VerifyPending = 4,
    /// 5 - verification approved (audit-only, auto-advances to 7)
    VerifyApproved = 5,
    /// 6 - verification rejected, terminal
    VerifyRejected = 6,
    /// 7 - awaiting dispatch clearance
    DispatchPending = 7,
    /// 8 - dispatch approved (audit-only, auto-advances to 10)
    DispatchApproved = 8,
    /// 9 - dispatch rejected, terminal
    DispatchRejected = 9,
    /// 10 - awaiting receipt confirmation
    ReceivePending = 10,
    /// 11 - received, terminal success
    ReceiveApproved = 11,
    /// 12 - receipt rejected, terminal
    ReceiveRejected = 12,
    /// 13 - canceled by the requester before executive action, terminal
    Canceled = 13,
}

/// Approval pipeline stage. Canceled passes have no stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Executive,
    Verify,
    Dispatch,
    Receive,
}

/// Sub-state outcome within a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Pending,
    Approved,
    Rejected,
    Canceled,
}

/// Display category used by list screens and dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCategory {
    Pending,
    Approved,
    Rejected,
    Terminal,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown gate pass status code {code}")]
pub struct UnknownStatus {
    pub code: i64,
}

impl TryFrom<i64> for Status {
    type Error = UnknownStatus;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Status::from_code(code)
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl Status {
    /// Resolve a wire code into a status. Total over 1..=13, fails for
    /// everything else including zero and negatives.
    pub fn from_code(code: i64) -> Result<Self, UnknownStatus> {
        let status = match code {
            1 => Status::ExecutivePending,
            2 => Status::ExecutiveApproved,
            3 => Status::ExecutiveRejected,
            4 => Status::VerifyPending,
            5 => Status::VerifyApproved,
            6 => Status::VerifyRejected,
            7 => Status::DispatchPending,
            8 => Status::DispatchApproved,
            9 => Status::DispatchRejected,
            10 => Status::ReceivePending,
            11 => Status::ReceiveApproved,
            12 => Status::ReceiveRejected,
            13 => Status::Canceled,
            _ => return Err(UnknownStatus { code }),
        };
        Ok(status)
    }

    /// Get the numeric wire code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Pipeline stage this status belongs to. `None` only for Canceled.
    pub fn stage(self) -> Option<Stage> {
        match self {
            Status::ExecutivePending | Status::ExecutiveApproved | Status::ExecutiveRejected => {
                Some(Stage::Executive)
            }
            Status::VerifyPending | Status::VerifyApproved | Status::VerifyRejected => {
                Some(Stage::Verify)
            }
            Status::DispatchPending | Status::DispatchApproved | Status::DispatchRejected => {
                Some(Stage::Dispatch)
            }
            Status::ReceivePending | Status::ReceiveApproved | Status::ReceiveRejected => {
                Some(Stage::Receive)
            }
            Status::Canceled => None,
        }
    }

    /// Sub-state outcome within the stage.
    pub fn outcome(self) -> Outcome {
        match self {
            Status::ExecutivePending | Status::VerifyPending | Status::DispatchPending
            | Status::ReceivePending => Outcome::Pending,
            Status::ExecutiveApproved | Status::VerifyApproved | Status::DispatchApproved
            | Status::ReceiveApproved => Outcome::Approved,
            Status::ExecutiveRejected | Status::VerifyRejected | Status::DispatchRejected
            | Status::ReceiveRejected => Outcome::Rejected,
            Status::Canceled => Outcome::Canceled,
        }
    }

    /// Display category for list screens.
    pub fn category(self) -> StatusCategory {
        match self.outcome() {
            Outcome::Pending => StatusCategory::Pending,
            Outcome::Approved => StatusCategory::Approved,
            Outcome::Rejected => StatusCategory::Rejected,
            Outcome::Canceled => StatusCategory::Terminal,
        }
    }

    /// Human-readable (stage, outcome) label pair.
    pub fn label(self) -> (&'static str, &'static str) {
        let stage = match self.stage() {
            Some(Stage::Executive) => "Executive",
            Some(Stage::Verify) => "Verify",
            Some(Stage::Dispatch) => "Dispatch",
            Some(Stage::Receive) => "Receive",
            None => "Canceled",
        };
        let outcome = match self.outcome() {
            Outcome::Pending => "Pending",
            Outcome::Approved => "Approved",
            Outcome::Rejected => "Rejected",
            Outcome::Canceled => "Canceled",
        };
        (stage, outcome)
    }

    /// No further transitions exist from this status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::ExecutiveRejected
                | Status::VerifyRejected
                | Status::DispatchRejected
                | Status::ReceiveRejected
                | Status::ReceiveApproved
                | Status::Canceled
        )
    }

    /// Approve edge from a Pending sub-state. Returns the stage's Approved
    /// code (audit trail) and the persisted status after the fused
    /// auto-advance to the next stage's Pending. `None` when no approve
    /// edge exists from this status.
    pub fn on_approve(self) -> Option<(Status, Status)> {
        match self {
            Status::ExecutivePending => Some((Status::ExecutiveApproved, Status::VerifyPending)),
            Status::VerifyPending => Some((Status::VerifyApproved, Status::DispatchPending)),
            Status::DispatchPending => Some((Status::DispatchApproved, Status::ReceivePending)),
            Status::ReceivePending => Some((Status::ReceiveApproved, Status::ReceiveApproved)),
            _ => None,
        }
    }

    /// Reject edge from a Pending sub-state, terminal at the current stage.
    pub fn on_reject(self) -> Option<Status> {
        match self {
            Status::ExecutivePending => Some(Status::ExecutiveRejected),
            Status::VerifyPending => Some(Status::VerifyRejected),
            Status::DispatchPending => Some(Status::DispatchRejected),
            Status::ReceivePending => Some(Status::ReceiveRejected),
            _ => None,
        }
    }

    /// Cancellation is only reachable from Executive Pending; once the
    /// executive has approved, items may already be in physical transit.
    pub fn can_cancel(self) -> bool {
        self == Status::ExecutivePending
    }
}

impl Stage {
    /// The Pending sub-state that opens this stage.
    pub fn pending_status(self) -> Status {
        match self {
            Stage::Executive => Status::ExecutivePending,
            Stage::Verify => Status::VerifyPending,
            Stage::Dispatch => Status::DispatchPending,
            Stage::Receive => Status::ReceivePending,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (stage, outcome) = self.label();
        if *self == Status::Canceled {
            write!(f, "Canceled")
        } else {
            write!(f, "{stage} {outcome}")
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Executive => "Executive",
            Stage::Verify => "Verify",
            Stage::Dispatch => "Dispatch",
            Stage::Receive => "Receive",
        };
        write!(f, "{}", name)
    }
}
