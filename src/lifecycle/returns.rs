// Item return sub-workflow. Tracks which serialized items came back through
// the gate; marking is irreversible and idempotent.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::request::{GatePass, ReturnStatus};

/// Mark the matching items returned and stamp their return date.
///
/// A serial matches only if it belongs to the pass, was flagged returnable
/// at creation, and is still pending return. Non-matching entries are
/// skipped, not failed; the returned count reports matches only, so a
/// partial match surfaces as a count smaller than the requested set.
pub fn apply_returns(
    pass: &mut GatePass,
    serial_numbers: &HashSet<String>,
    now: DateTime<Utc>,
) -> usize {
    let mut updated = 0;
    for item in &mut pass.items {
        if !serial_numbers.contains(&item.serial_no) {
            continue;
        }
        if !item.awaits_return() {
            // Already returned or never returnable: skipped without error,
            // return_date stays as first set.
            continue;
        }
        item.return_status = ReturnStatus::Returned;
        item.return_date = Some(now);
        updated += 1;
    }
    updated
}
