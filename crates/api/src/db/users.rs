//! User repository for database operations.
//!
//! Accounts, password hashes and granted roles. Every account gets a
//! `profile` row at registration, which carries its display name.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use craftly_core::{Email, Role, UserId};

use super::RepositoryError;
use crate::models::User;

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    display_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, roles: Vec<Role>) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(User {
            id: UserId::new(self.id),
            email,
            display_name: self.display_name,
            roles,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_USER: &str = r"
    SELECT u.id, u.email, p.display_name, u.created_at, u.updated_at
    FROM craftly.user u
    JOIN craftly.profile p ON p.user_id = u.id
";

/// Roles granted to `user_id`, sorted.
pub(crate) async fn roles_of<'e, E>(executor: E, user_id: UserId) -> Result<Vec<Role>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, Role>(
        r"
        SELECT role FROM craftly.user_role
        WHERE user_id = $1
        ORDER BY role
        ",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.email = $1"))
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(r) => {
                let roles = roles_of(self.pool, UserId::new(r.id)).await?;
                Ok(Some(r.into_user(roles)?))
            }
            None => Ok(None),
        }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(r) => {
                let roles = roles_of(self.pool, id).await?;
                Ok(Some(r.into_user(roles)?))
            }
            None => Ok(None),
        }
    }

    /// Whether a user with this ID exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: UserId) -> Result<bool, RepositoryError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM craftly.user WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(found)
    }

    /// Create a new buyer account with its profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        display_name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id, created_at, updated_at) =
            sqlx::query_as::<_, (i32, DateTime<Utc>, DateTime<Utc>)>(
                r"
                INSERT INTO craftly.user (email, password_hash)
                VALUES ($1, $2)
                RETURNING id, created_at, updated_at
                ",
            )
            .bind(email.as_str())
            .bind(password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepositoryError::on_unique(e, "email already exists"))?;

        sqlx::query("INSERT INTO craftly.user_role (user_id, role) VALUES ($1, $2)")
            .bind(id)
            .bind(Role::Buyer)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO craftly.profile (user_id, display_name) VALUES ($1, $2)")
            .bind(id)
            .bind(display_name.trim())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(User {
            id: UserId::new(id),
            email: email.clone(),
            display_name: display_name.trim().to_owned(),
            roles: vec![Role::Buyer],
            created_at,
            updated_at,
        })
    }

    /// Get a user and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM craftly.user WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(hash) = hash else {
            return Ok(None);
        };

        Ok(self.get_by_email(email).await?.map(|user| (user, hash)))
    }

    /// Get the password hash for a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn password_hash_by_id(&self, id: UserId) -> Result<String, RepositoryError> {
        sqlx::query_scalar::<_, String>("SELECT password_hash FROM craftly.user WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE craftly.user
            SET password_hash = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Grant a role. Granting a role the user already holds is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn grant_role(&self, id: UserId, role: Role) -> Result<Vec<Role>, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO craftly.user_role (user_id, role)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(id)
        .bind(role)
        .execute(self.pool)
        .await
        .map_err(RepositoryError::on_missing_parent)?;

        Ok(roles_of(self.pool, id).await?)
    }

    /// Revoke a role.
    ///
    /// Returns `true` if the user held the role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revoke_role(&self, id: UserId, role: Role) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM craftly.user_role WHERE user_id = $1 AND role = $2")
            .bind(id)
            .bind(role)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
