use axum::extract::{rejection::QueryRejection, Query, State};
use axum::Extension;

use crate::app::AppState;
use crate::auth::{require_admin, AuthError};
use crate::database::models::UserResponse;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Principal;

use super::data::{page_bounds, ListQuery};

/// GET /users - admin only
pub async fn users_list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<UserResponse>> {
    require_admin(&principal)?;
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let (skip, limit) = page_bounds(&query)?;
    let users = state.db.list_users(skip, limit).await?;
    Ok(ApiResponse::success(users.iter().map(UserResponse::from).collect()))
}

/// GET /me - profile of the authenticated principal
pub async fn me_get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<UserResponse> {
    // The middleware just resolved this id; a miss means the user vanished mid-request
    let user = state
        .db
        .get_user(principal.id)
        .await?
        .ok_or(ApiError::Auth(AuthError::PrincipalInactiveOrMissing))?;
    Ok(ApiResponse::success(UserResponse::from(&user)))
}
