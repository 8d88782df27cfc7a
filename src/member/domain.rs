//! Core member domain types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{endpoints, member::PasswordHash};

/// A newtype wrapper for integer member IDs.
///
/// This helps disambiguate member IDs from other types of IDs, leading to
/// better compile time errors, and more flexible generics that can have
/// distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct MemberId(i64);

impl MemberId {
    /// Create a new member ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the member ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// What a member is allowed to do.
///
/// Roles are ordered: every officer can do what a member can, and every admin
/// can do what an officer can. The derived ordering relies on the variants
/// being declared from least to most privileged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub enum Role {
    /// A regular member of the organization.
    Member,
    /// An officer who manages finances, payments, and story review.
    Officer,
    /// An admin who additionally manages member roles.
    Admin,
}

impl Role {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Officer => "officer",
            Role::Admin => "admin",
        }
    }

    pub(crate) fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "member" => Some(Role::Member),
            "officer" => Some(Role::Officer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// The page a member of this role lands on after logging in, and is sent
    /// back to when they request a page above their role.
    pub fn home_endpoint(self) -> &'static str {
        match self {
            Role::Member => endpoints::EVENTS_VIEW,
            Role::Officer => endpoints::FINANCE_VIEW,
            Role::Admin => endpoints::MEMBERS_VIEW,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A member of the organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// The member's ID in the application database.
    pub id: MemberId,
    /// The member's email address, used to log in. Unique.
    pub email: String,
    /// The member's password hash.
    pub password_hash: PasswordHash,
    /// The member's display name.
    pub full_name: String,
    /// The section or team the member belongs to, e.g. "Brass".
    pub section: String,
    /// What the member is allowed to do.
    pub role: Role,
    /// Whether an officer has confirmed the member belongs to the
    /// organization. Unverified members only see the pending page.
    pub verified: bool,
}

#[cfg(test)]
mod role_tests {
    use super::Role;

    #[test]
    fn roles_are_ordered_by_privilege() {
        assert!(Role::Member < Role::Officer);
        assert!(Role::Officer < Role::Admin);
    }

    #[test]
    fn role_round_trips_through_string() {
        for role in [Role::Member, Role::Officer, Role::Admin] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
    }

    #[test]
    fn from_str_rejects_unknown_role() {
        assert_eq!(Role::from_str("president"), None);
    }
}
