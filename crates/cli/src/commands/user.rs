//! Role management commands.
//!
//! # Usage
//!
//! ```bash
//! # Make an existing account an admin
//! craftly-cli user grant -e ops@craftly.app -r admin
//!
//! # Take the seller role away
//! craftly-cli user revoke -e mira@craftly.app -r seller
//! ```
//!
//! The admin role can only be granted here; the API lets users grant
//! themselves `seller` and nothing else.

use craftly_api::db::UserRepository;
use craftly_core::{Email, Role, UserId};

use super::{CliError, connect};

/// Parse the `--role` argument.
fn parse_role(role: &str) -> Result<Role, CliError> {
    role.parse()
        .map_err(|_| CliError::InvalidRole(role.to_owned()))
}

/// Look up an account by email.
async fn find_user(users: &UserRepository<'_>, email: &str) -> Result<UserId, CliError> {
    let parsed = Email::parse(email).map_err(|e| CliError::InvalidEmail(format!("{email}: {e}")))?;
    let user = users
        .get_by_email(&parsed)
        .await?
        .ok_or_else(|| CliError::UserNotFound(email.to_owned()))?;
    Ok(user.id)
}

/// Grant `role` to the account with `email`.
///
/// # Errors
///
/// Returns `CliError` for an unknown role or user, or a database failure.
pub async fn grant(email: &str, role: &str) -> Result<(), CliError> {
    let role = parse_role(role)?;
    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let user_id = find_user(&users, email).await?;
    let roles = users.grant_role(user_id, role).await?;

    let roles: Vec<String> = roles.iter().map(ToString::to_string).collect();
    tracing::info!(%user_id, %email, roles = %roles.join(", "), "Granted {role}");
    Ok(())
}

/// Revoke `role` from the account with `email`.
///
/// Every account keeps the buyer role.
///
/// # Errors
///
/// Returns `CliError` for an unknown role or user, or a database failure.
pub async fn revoke(email: &str, role: &str) -> Result<(), CliError> {
    let role = parse_role(role)?;
    if role == Role::Buyer {
        return Err(CliError::InvalidRole(
            "buyer (every account keeps the buyer role)".to_owned(),
        ));
    }

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let user_id = find_user(&users, email).await?;
    if users.revoke_role(user_id, role).await? {
        tracing::info!(%user_id, %email, "Revoked {role}");
    } else {
        tracing::warn!(%user_id, %email, "User did not have the {role} role");
    }
    Ok(())
}
