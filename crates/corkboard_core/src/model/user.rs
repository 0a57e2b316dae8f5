//! User domain model and role predicates.
//!
//! # Responsibility
//! - Define the user record and its role assignment.
//! - Keep permission predicates (`can_change`, `can_administer`) next to the
//!   role data they evaluate.
//!
//! # Invariants
//! - At most one system user exists; the storage layer enforces this.
//! - The system user never counts as an active member of the directory.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a user.
pub type UserId = Uuid;

/// Display name given to the singular system user.
pub const SYSTEM_USER_NAME: &str = "System";

/// Role assignment for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full administrative rights over other accounts.
    Admin,
    /// Regular account.
    Member,
    /// Internal actor for automated activity; excluded from people listings.
    System,
}

impl Role {
    /// Stable string value stored in the `users.role` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::System => "system",
        }
    }

    /// Parses a stored string value; `None` for unrecognized input.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// An account in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable global ID.
    pub uuid: UserId,
    /// Display name.
    pub name: String,
    /// Role assignment.
    pub role: Role,
    /// Deactivated accounts keep their rows but drop out of active listings.
    pub active: bool,
}

impl User {
    /// Creates a new active user with a generated stable ID.
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self::with_id(Uuid::new_v4(), name, role)
    }

    /// Creates a user with a caller-provided stable ID.
    pub fn with_id(uuid: UserId, name: impl Into<String>, role: Role) -> Self {
        Self {
            uuid,
            name: name.into(),
            role,
            active: true,
        }
    }

    /// True for administrator accounts.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this user may change `other`'s account: admins may change
    /// anyone, everyone may change themselves.
    pub fn can_change(&self, other: &User) -> bool {
        self.is_admin() || other.uuid == self.uuid
    }

    /// Whether this user may administer `other`: admin rights over accounts
    /// other than one's own.
    pub fn can_administer(&self, other: &User) -> bool {
        self.is_admin() && other.uuid != self.uuid
    }
}
