//! Role and ownership decisions.
//!
//! Administrators are granted every action on every resource. Everyone else may only act
//! on resources they own. Moderators currently have no extra privileges.

use crate::auth::AuthError;
use crate::database::{DatabaseError, ResourceStore};
use crate::types::Principal;

pub fn can_access(principal: &Principal, resource_owner_id: i64) -> bool {
    if principal.is_admin() {
        return true;
    }
    resource_owner_id == principal.id
}

pub fn require_admin(principal: &Principal) -> Result<(), AuthError> {
    if principal.is_admin() {
        Ok(())
    } else {
        tracing::warn!("Admin-only action denied for '{}' ({})", principal.username, principal.role);
        Err(AuthError::Forbidden)
    }
}

/// Outcome of an ownership check that needed a store lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Granted,
    Denied,
}

/// Decide access to an existing resource by id.
///
/// Admins are granted without a lookup. For everyone else a missing resource is denied,
/// so non-admins cannot probe which ids exist.
pub async fn authorize_resource<S>(store: &S, principal: &Principal, resource_id: i64) -> Result<Decision, DatabaseError>
where
    S: ResourceStore + ?Sized,
{
    if principal.is_admin() {
        return Ok(Decision::Granted);
    }

    let decision = match store.find_resource_owner(resource_id).await? {
        Some(owner_id) if can_access(principal, owner_id) => Decision::Granted,
        _ => Decision::Denied,
    };

    if decision == Decision::Denied {
        tracing::warn!("Access to resource {} denied for '{}'", resource_id, principal.username);
    }
    Ok(decision)
}
