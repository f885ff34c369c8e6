//! Authentication service.
//!
//! Email and password accounts. Passwords are hashed with Argon2id and the
//! same strength rules the client checks are enforced again here.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use craftly_core::validation::{validate_display_name, validate_password};
use craftly_core::{Email, Role, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new buyer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::Validation` if the display name is out of bounds.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        validate_display_name(display_name)?;

        let password_hash = hash_password(password)?;

        self.users
            .create_with_password(&email, display_name, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// Unknown email and wrong password produce the same error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Change a password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WrongPassword` if `current` doesn't match.
    /// Returns `AuthError::WeakPassword` if `new` doesn't meet requirements.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        let stored = self
            .users
            .password_hash_by_id(user_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        verify_password(current, &stored).map_err(|_| AuthError::WrongPassword)?;
        validate_password(new)?;

        let hash = hash_password(new)?;
        self.users.update_password(user_id, &hash).await?;
        Ok(())
    }

    /// Grant the seller role to an existing account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn become_seller(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .grant_role(user_id, Role::Seller)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Reload a user (e.g. to refresh session roles).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("woodgrain9").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("woodgrain9", &hash).is_ok());
        assert!(matches!(
            verify_password("woodgrain8", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("woodgrain9").unwrap();
        let b = hash_password("woodgrain9").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything1", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
