use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Organizational roles recognized by the gate pass system.
/// A session holds exactly one role, assigned out-of-band; there is no
/// anonymous-but-authenticated state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    SuperAdmin,
    Admin,
    User,
    Approver,
    SecurityOfficer,
    Pleader,
    Dispatcher,
}

/// All roles, in policy order. Kept in one place so matrix and menu tests
/// can sweep the full enumeration.
pub const ALL_ROLES: [Role; 7] = [
    Role::SuperAdmin,
    Role::Admin,
    Role::User,
    Role::Approver,
    Role::SecurityOfficer,
    Role::Pleader,
    Role::Dispatcher,
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role name: {name}")]
pub struct UnknownRole {
    pub name: String,
}

impl Role {
    /// Canonical display name. "Security Officer" carries the space on the
    /// wire; the legacy compact form is accepted on parse only.
    pub fn name(self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::Admin => "Admin",
            Role::User => "User",
            Role::Approver => "Approver",
            Role::SecurityOfficer => "Security Officer",
            Role::Pleader => "Pleader",
            Role::Dispatcher => "Dispatcher",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Case-sensitive match against canonical names. Legacy aliases from the
    /// previous directory export (RO1/Verifier, RO2) are accepted as
    /// synonyms and normalized to the canonical variant.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let role = match name {
            "SuperAdmin" => Role::SuperAdmin,
            "Admin" => Role::Admin,
            "User" => Role::User,
            "Approver" => Role::Approver,
            "Security Officer" | "SecurityOfficer" => Role::SecurityOfficer,
            "Pleader" => Role::Pleader,
            "Dispatcher" => Role::Dispatcher,
            // Legacy role codes: RO1 was the verify-stage officer, RO2 the
            // patrol leader.
            "RO1" | "Verifier" => Role::SecurityOfficer,
            "RO2" => Role::Pleader,
            _ => {
                return Err(UnknownRole {
                    name: name.to_string(),
                })
            }
        };
        Ok(role)
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.name().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names_parse() {
        for role in ALL_ROLES {
            assert_eq!(role.name().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_legacy_aliases_normalize() {
        assert_eq!("RO1".parse::<Role>().unwrap(), Role::SecurityOfficer);
        assert_eq!("Verifier".parse::<Role>().unwrap(), Role::SecurityOfficer);
        assert_eq!("RO2".parse::<Role>().unwrap(), Role::Pleader);
        // Normalized form displays the canonical name, never the alias
        assert_eq!("RO1".parse::<Role>().unwrap().to_string(), "Security Officer");
    }

    #[test]
    fn test_compact_security_officer_accepted() {
        assert_eq!("SecurityOfficer".parse::<Role>().unwrap(), Role::SecurityOfficer);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("superadmin".parse::<Role>().is_err());
        assert!("ADMIN".parse::<Role>().is_err());
        assert!("ro1".parse::<Role>().is_err());
    }

    #[test]
    fn test_unknown_role_carries_name() {
        let err = "Gatekeeper".parse::<Role>().unwrap_err();
        assert_eq!(err.name, "Gatekeeper");
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&Role::SecurityOfficer).unwrap();
        assert_eq!(json, "\"Security Officer\"");
        let role: Role = serde_json::from_str("\"RO2\"").unwrap();
        assert_eq!(role, Role::Pleader);
    }
}
