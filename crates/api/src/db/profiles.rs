//! Profile repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use craftly_core::{Email, ShippingAddress, UserId};

use super::RepositoryError;
use super::users::roles_of;
use crate::models::{Profile, ProfileUpdate, PublicProfile};

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    user_id: i32,
    email: String,
    display_name: String,
    phone: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
    default_address: Option<Json<ShippingAddress>>,
    updated_at: DateTime<Utc>,
}

const SELECT_PROFILE: &str = r"
    SELECT p.user_id, u.email, p.display_name, p.phone, p.bio, p.avatar_url,
           p.default_address, p.updated_at
    FROM craftly.profile p
    JOIN craftly.user u ON u.id = p.user_id
    WHERE p.user_id = $1
";

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's full profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(SELECT_PROFILE)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let roles = roles_of(self.pool, user_id).await?;

        Ok(Some(Profile {
            user_id: UserId::new(row.user_id),
            email,
            roles,
            display_name: row.display_name,
            phone: row.phone,
            bio: row.bio,
            avatar_url: row.avatar_url,
            default_address: row.default_address.map(|a| a.0),
            updated_at: row.updated_at,
        }))
    }

    /// What other users see of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_public(&self, user_id: UserId) -> Result<Option<PublicProfile>, RepositoryError> {
        Ok(self.get(user_id).await?.map(PublicProfile::from))
    }

    /// Display name of a user, if they exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn display_name(&self, user_id: UserId) -> Result<Option<String>, RepositoryError> {
        let name = sqlx::query_scalar::<_, String>(
            "SELECT display_name FROM craftly.profile WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(name)
    }

    /// Apply a partial update. Absent fields keep their value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile doesn't exist.
    pub async fn update(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE craftly.profile SET
                display_name = COALESCE($2, display_name),
                phone = COALESCE($3, phone),
                bio = COALESCE($4, bio),
                avatar_url = COALESCE($5, avatar_url),
                updated_at = now()
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(update.display_name.as_deref().map(str::trim))
        .bind(update.phone.as_deref().map(str::trim))
        .bind(update.bio.as_deref().map(str::trim))
        .bind(update.avatar_url.as_deref())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(user_id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Replace the default shipping address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile doesn't exist.
    pub async fn set_default_address(
        &self,
        user_id: UserId,
        address: &ShippingAddress,
    ) -> Result<Profile, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE craftly.profile
            SET default_address = $2, updated_at = now()
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(Json(address))
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(user_id).await?.ok_or(RepositoryError::NotFound)
    }
}
