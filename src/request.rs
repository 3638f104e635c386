// Gate pass domain model. A pass owns its items; items are never shared or
// re-parented.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

use crate::lifecycle::AuditRecord;
use crate::status::Status;

static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^GP-(\d{4})-(\d{5})$").unwrap());

/// Return tracking state of a single item. Only meaningful when the item was
/// flagged returnable at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnStatus {
    NotApplicable,
    PendingReturn,
    Returned,
}

/// Where the pass is headed. The classification is immutable and decides
/// which receiver-data shape applies; it is orthogonal to the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    /// Internal location resolvable through the directory.
    Internal { location: String },
    /// External (non-SLT) place with a manually captured contact.
    NonSlt {
        contact_name: String,
        contact_phone: String,
    },
}

impl Destination {
    pub fn is_non_slt_place(&self) -> bool {
        matches!(self, Destination::NonSlt { .. })
    }
}

/// One serialized or bulk asset attached to a gate pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub serial_no: String,
    pub item_model: String,
    pub item_category: String,
    pub item_quantity: u32,
    pub is_returnable: bool,
    pub return_status: ReturnStatus,
    /// Set exactly once, when the item is marked returned.
    pub return_date: Option<DateTime<Utc>>,
}

impl Item {
    pub fn new(spec: NewItem) -> Self {
        let return_status = if spec.is_returnable {
            ReturnStatus::PendingReturn
        } else {
            ReturnStatus::NotApplicable
        };
        Self {
            serial_no: spec.serial_no,
            item_model: spec.item_model,
            item_category: spec.item_category,
            item_quantity: spec.item_quantity,
            is_returnable: spec.is_returnable,
            return_status,
            return_date: None,
        }
    }

    /// Item still owes a return to the gate.
    pub fn awaits_return(&self) -> bool {
        self.is_returnable && self.return_status == ReturnStatus::PendingReturn
    }
}

/// Creation payload for an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub serial_no: String,
    pub item_model: String,
    pub item_category: String,
    pub item_quantity: u32,
    pub is_returnable: bool,
}

/// Creation payload for a gate pass. Validated before a reference number is
/// allocated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGatePass {
    pub executive_officer_assignee: Option<String>,
    pub destination: Destination,
    pub items: Vec<NewItem>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PassValidationError {
    #[error("a gate pass must declare at least one item")]
    EmptyItems,
    #[error("duplicate serial number on pass: {serial_no}")]
    DuplicateSerial { serial_no: String },
    #[error("item {serial_no} has zero quantity")]
    ZeroQuantity { serial_no: String },
}

impl NewGatePass {
    pub fn validate(&self) -> Result<(), PassValidationError> {
        if self.items.is_empty() {
            return Err(PassValidationError::EmptyItems);
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.item_quantity == 0 {
                return Err(PassValidationError::ZeroQuantity {
                    serial_no: item.serial_no.clone(),
                });
            }
            let duplicated = self.items[..index]
                .iter()
                .any(|earlier| earlier.serial_no == item.serial_no);
            if duplicated {
                return Err(PassValidationError::DuplicateSerial {
                    serial_no: item.serial_no.clone(),
                });
            }
        }
        Ok(())
    }
}

/// The unit of work flowing through the approval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatePass {
    /// Unique, immutable, assigned at creation. External key for all actors.
    pub reference_number: String,
    pub status: Status,
    /// Insertion order is the order items were declared on the pass.
    pub items: Vec<Item>,
    /// Creator identity; scopes own-request listing and cancellation.
    pub requester_service_no: String,
    /// Officer of record for the Executive stage. Reassignable only while
    /// the status is still in the Executive stage.
    pub executive_officer_assignee: Option<String>,
    pub destination: Destination,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Actor and timestamp for every applied transition, oldest first.
    pub history: Vec<AuditRecord>,
}

impl GatePass {
    pub fn new(reference_number: String, requester_service_no: String, spec: NewGatePass) -> Self {
        let now = Utc::now();
        Self {
            reference_number,
            status: Status::ExecutivePending,
            items: spec.items.into_iter().map(Item::new).collect(),
            requester_service_no,
            executive_officer_assignee: spec.executive_officer_assignee,
            destination: spec.destination,
            created_at: now,
            updated_at: now,
            history: Vec::new(),
        }
    }

    pub fn item(&self, serial_no: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.serial_no == serial_no)
    }

    /// Pass has not reached a terminal status; item details remain editable.
    pub fn is_unresolved(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Returnable items still outstanding at the gate.
    pub fn outstanding_returns(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| item.awaits_return())
    }
}

/// Format a reference number from its allocation parts: `GP-<year>-<seq>`.
pub fn format_reference(year: i32, sequence: u64) -> String {
    format!("GP-{year:04}-{sequence:05}")
}

/// Parse a reference number back into (year, sequence). Used by the file
/// store to recover its allocation counter after a restart.
pub fn parse_reference(reference: &str) -> Option<(i32, u64)> {
    let captures = REFERENCE_RE.captures(reference)?;
    let year = captures[1].parse().ok()?;
    let sequence = captures[2].parse().ok()?;
    Some((year, sequence))
}
