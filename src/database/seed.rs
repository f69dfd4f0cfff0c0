//! Startup seeding of the administrator account.

use thiserror::Error;

use crate::auth::{CredentialVerifier, PasswordError};
use crate::config::BootstrapConfig;
use crate::database::models::{NewUser, User};
use crate::database::{DatabaseError, Repository};
use crate::handlers::public::utils::{validate_email_format, validate_password_strength, validate_username_format};
use crate::types::Role;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Invalid {field} for admin bootstrap: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Create the configured admin unless that username already exists.
///
/// Returns the new user, or `None` when nothing was configured or the account was already there.
/// An existing account is left untouched.
pub async fn seed_admin<R>(
    repo: &R,
    verifier: &CredentialVerifier,
    bootstrap: &BootstrapConfig,
) -> Result<Option<User>, SeedError>
where
    R: Repository + ?Sized,
{
    let Some(raw_username) = bootstrap.admin_username.as_deref() else {
        return Ok(None);
    };

    let username = validate_username_format(raw_username).map_err(|reason| SeedError::Invalid {
        field: "ADMIN_USERNAME",
        reason,
    })?;
    let email = match bootstrap.admin_email.as_deref() {
        Some(email) => validate_email_format(email),
        None => Ok(format!("{}@localhost.localdomain", username)),
    }
    .map_err(|reason| SeedError::Invalid {
        field: "ADMIN_EMAIL",
        reason,
    })?;
    let password = bootstrap.admin_password.clone().unwrap_or_default();
    validate_password_strength(&password).map_err(|reason| SeedError::Invalid {
        field: "ADMIN_PASSWORD",
        reason,
    })?;

    if repo.find_principal_by_username(&username).await?.is_some() {
        tracing::info!("Admin bootstrap skipped: '{}' already exists", username);
        return Ok(None);
    }

    let hashed_password = verifier.hash_offloaded(password).await?;
    let user = repo
        .create_user(NewUser {
            username,
            email,
            hashed_password,
            user_type: Role::Admin,
        })
        .await?;

    tracing::info!("Seeded admin '{}' with id {}", user.username, user.id);
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryDatabase, PrincipalStore};

    fn bootstrap(username: &str, password: &str) -> BootstrapConfig {
        BootstrapConfig {
            admin_username: Some(username.to_string()),
            admin_email: None,
            admin_password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_seeds_admin_once() {
        let db = MemoryDatabase::new();
        let verifier = CredentialVerifier::new(8, 1).unwrap();
        let config = bootstrap("Root", "Sup3rSecret");

        let user = seed_admin(&db, &verifier, &config).await.unwrap().unwrap();
        assert_eq!(user.username, "root");
        assert_eq!(user.user_type, Role::Admin);
        assert_eq!(user.email, "root@localhost.localdomain");
        assert!(verifier.verify("Sup3rSecret", &user.hashed_password));

        assert!(seed_admin(&db, &verifier, &config).await.unwrap().is_none());
        let principal = db.find_principal_by_username("root").await.unwrap().unwrap();
        assert_eq!(principal.id, user.id);
    }

    #[tokio::test]
    async fn test_nothing_configured() {
        let db = MemoryDatabase::new();
        let verifier = CredentialVerifier::new(8, 1).unwrap();
        assert!(seed_admin(&db, &verifier, &BootstrapConfig::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_weak_password_is_refused() {
        let db = MemoryDatabase::new();
        let verifier = CredentialVerifier::new(8, 1).unwrap();

        let err = seed_admin(&db, &verifier, &bootstrap("root", "short")).await.unwrap_err();
        assert!(matches!(err, SeedError::Invalid { field: "ADMIN_PASSWORD", .. }));
        assert!(db.find_principal_by_username("root").await.unwrap().is_none());
    }
}
