//! Login and bearer-token resolution against the principal store.

use crate::auth::{AuthError, CredentialVerifier, TokenService};
use crate::database::PrincipalStore;
use crate::error::ApiError;
use crate::types::Principal;

/// Check a username/password pair, returning the active principal it belongs to
pub async fn authenticate<S>(
    store: &S,
    verifier: &CredentialVerifier,
    username: &str,
    password: &str,
) -> Result<Principal, ApiError>
where
    S: PrincipalStore + ?Sized,
{
    let username = username.trim().to_lowercase();

    let Some(credential) = store.find_credential(&username).await? else {
        // Same hashing work as a wrong password
        verifier
            .verify_offloaded(password.to_string(), verifier.dummy_hash().to_string())
            .await;
        tracing::info!("Login failed: unknown user '{}'", username);
        return Err(AuthError::InvalidCredentials.into());
    };

    if !verifier
        .verify_offloaded(password.to_string(), credential.password_hash)
        .await
    {
        tracing::info!("Login failed: bad password for '{}'", username);
        return Err(AuthError::InvalidCredentials.into());
    }

    match store.find_principal_by_username(&username).await? {
        Some(principal) if principal.active => Ok(principal),
        _ => {
            tracing::info!("Login refused: '{}' is inactive", username);
            Err(AuthError::PrincipalInactiveOrMissing.into())
        }
    }
}

/// Verify a bearer token and reload the principal it names.
///
/// The returned principal comes from the store, so role and active flag reflect the
/// current record rather than what was embedded at issuance.
pub async fn resolve_bearer<S>(store: &S, tokens: &TokenService, token: &str) -> Result<Principal, ApiError>
where
    S: PrincipalStore + ?Sized,
{
    let claims = tokens.verify(token)?;

    match store.find_principal_by_id(claims.principal_id).await? {
        Some(principal) if principal.active && principal.username == claims.sub => Ok(principal),
        Some(principal) if principal.username != claims.sub => {
            tracing::warn!(
                "Token subject '{}' does not match principal {} ('{}')",
                claims.sub,
                principal.id,
                principal.username
            );
            Err(AuthError::PrincipalInactiveOrMissing.into())
        }
        _ => {
            tracing::warn!("Token for principal {} refers to an inactive or missing user", claims.principal_id);
            Err(AuthError::PrincipalInactiveOrMissing.into())
        }
    }
}
