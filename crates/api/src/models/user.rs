//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use craftly_core::{Email, Role, UserId};

/// A marketplace account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (login name).
    pub email: Email,
    /// Name shown to other users.
    pub display_name: String,
    /// Granted roles, sorted. Every user is at least a buyer.
    pub roles: Vec<Role>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
