// Role and permission policy - static tables, no derived logic
// Role-to-action mapping is fixed business policy; encoding it as data keeps
// the lifecycle orchestrator free of role-specific branching.

pub mod matrix;
pub mod role;

pub use matrix::{Action, AuthorizationMatrix};
pub use role::{Role, UnknownRole};
