//! Profile and notification domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use craftly_core::validation::{ValidationError, require_length, validate_display_name};
use craftly_core::{Email, NotificationId, NotificationKind, Role, ShippingAddress, UserId};

/// The caller's own profile, merged with account fields.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user_id: UserId,
    pub email: Email,
    pub roles: Vec<Role>,
    pub display_name: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub default_address: Option<ShippingAddress>,
    pub updated_at: DateTime<Utc>,
}

/// What any user can see about another.
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub roles: Vec<Role>,
}

impl From<Profile> for PublicProfile {
    fn from(p: Profile) -> Self {
        Self {
            user_id: p.user_id,
            display_name: p.display_name,
            avatar_url: p.avatar_url,
            bio: p.bio,
            roles: p.roles,
        }
    }
}

/// Partial profile update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.display_name {
            validate_display_name(name)?;
        }
        if let Some(phone) = &self.phone {
            require_length("phone", phone, 0, 30)?;
        }
        if let Some(bio) = &self.bio {
            require_length("bio", bio, 0, 1000)?;
        }
        Ok(())
    }
}

/// An in-app notification.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_is_valid() {
        assert!(ProfileUpdate::default().validate().is_ok());
    }

    #[test]
    fn test_update_rejects_short_display_name() {
        let update = ProfileUpdate {
            display_name: Some(" a ".to_owned()),
            ..ProfileUpdate::default()
        };
        assert!(matches!(
            update.validate(),
            Err(ValidationError::Length {
                field: "display_name",
                ..
            })
        ));
    }
}
