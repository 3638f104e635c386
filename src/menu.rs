// Per-role navigation menus. Order is presentation policy, fixed per role;
// callers must not reorder.

use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::auth::{Role, UnknownRole};
use crate::request::Destination;

/// Navigation surfaces a menu entry can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MenuTarget {
    Dashboard,
    NewRequest,
    MyRequests,
    AllRequests,
    PendingApprovals,
    DispatchQueue,
    ReceiveQueue,
    ItemReturns,
    Locations,
    Categories,
    Users,
}

impl MenuTarget {
    pub fn route(self) -> &'static str {
        match self {
            MenuTarget::Dashboard => "dashboard",
            MenuTarget::NewRequest => "requests/new",
            MenuTarget::MyRequests => "requests/mine",
            MenuTarget::AllRequests => "requests",
            MenuTarget::PendingApprovals => "approvals",
            MenuTarget::DispatchQueue => "dispatch",
            MenuTarget::ReceiveQueue => "receive",
            MenuTarget::ItemReturns => "returns",
            MenuTarget::Locations => "admin/locations",
            MenuTarget::Categories => "admin/categories",
            MenuTarget::Users => "admin/users",
        }
    }
}

impl fmt::Display for MenuTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.route())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub title: &'static str,
    pub target: MenuTarget,
}

const fn entry(title: &'static str, target: MenuTarget) -> MenuEntry {
    MenuEntry { title, target }
}

/// Baseline member menu: request creation, own-request listing, receive.
/// Also what an unrecognized role name resolves to when the fallback is on.
pub const DEFAULT_MENU: &[MenuEntry] = &[
    entry("New Gate Pass", MenuTarget::NewRequest),
    entry("My Requests", MenuTarget::MyRequests),
    entry("Receive", MenuTarget::ReceiveQueue),
];

const SUPER_ADMIN_MENU: &[MenuEntry] = &[
    entry("Dashboard", MenuTarget::Dashboard),
    entry("All Requests", MenuTarget::AllRequests),
    entry("New Gate Pass", MenuTarget::NewRequest),
    entry("Pending Approvals", MenuTarget::PendingApprovals),
    entry("Dispatch", MenuTarget::DispatchQueue),
    entry("Receive", MenuTarget::ReceiveQueue),
    entry("Item Returns", MenuTarget::ItemReturns),
    entry("Locations", MenuTarget::Locations),
    entry("Categories", MenuTarget::Categories),
    entry("Users", MenuTarget::Users),
];

const ADMIN_MENU: &[MenuEntry] = &[
    entry("Dashboard", MenuTarget::Dashboard),
    entry("All Requests", MenuTarget::AllRequests),
    entry("New Gate Pass", MenuTarget::NewRequest),
    entry("Locations", MenuTarget::Locations),
    entry("Categories", MenuTarget::Categories),
    entry("Users", MenuTarget::Users),
];

const APPROVER_MENU: &[MenuEntry] = &[
    entry("Dashboard", MenuTarget::Dashboard),
    entry("Pending Approvals", MenuTarget::PendingApprovals),
];

const SECURITY_OFFICER_MENU: &[MenuEntry] = &[
    entry("Dashboard", MenuTarget::Dashboard),
    entry("Pending Approvals", MenuTarget::PendingApprovals),
    entry("Item Returns", MenuTarget::ItemReturns),
];

const PLEADER_MENU: &[MenuEntry] = &[
    entry("Dashboard", MenuTarget::Dashboard),
    entry("Pending Approvals", MenuTarget::PendingApprovals),
];

const DISPATCHER_MENU: &[MenuEntry] = &[
    entry("Dashboard", MenuTarget::Dashboard),
    entry("Dispatch", MenuTarget::DispatchQueue),
];

pub struct MenuResolver;

impl MenuResolver {
    /// Ordered menu for a role. Deterministic; the order is part of the
    /// contract.
    pub fn menu_for(role: Role) -> &'static [MenuEntry] {
        match role {
            Role::SuperAdmin => SUPER_ADMIN_MENU,
            Role::Admin => ADMIN_MENU,
            Role::User => DEFAULT_MENU,
            Role::Approver => APPROVER_MENU,
            Role::SecurityOfficer => SECURITY_OFFICER_MENU,
            Role::Pleader => PLEADER_MENU,
            Role::Dispatcher => DISPATCHER_MENU,
        }
    }

    /// Resolve a menu from a raw role name. With `fallback` on (the
    /// historical behavior) an unrecognized name gets the baseline member
    /// menu; with it off the caller sees the parse error instead. Either
    /// way the mismatch is logged - the fallback never feeds the permission
    /// matrix, so no lifecycle action is reachable through it.
    pub fn menu_for_name(
        name: &str,
        fallback: bool,
    ) -> Result<&'static [MenuEntry], UnknownRole> {
        match name.parse::<Role>() {
            Ok(role) => Ok(Self::menu_for(role)),
            Err(_) if fallback => {
                warn!(role_name = %name, "Unknown role name, serving baseline member menu");
                Ok(DEFAULT_MENU)
            }
            Err(err) => {
                warn!(role_name = %name, "Unknown role name rejected");
                Err(err)
            }
        }
    }

    /// Receiver-data fields a request form asks for, decided by the
    /// destination classification.
    pub fn receiver_fields(destination: &Destination) -> &'static [&'static str] {
        if destination.is_non_slt_place() {
            &["contact_name", "contact_phone"]
        } else {
            &["location"]
        }
    }
}
