// handlers/public/login.rs - POST /login handler

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::authenticate;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// POST /login - exchange a username/password pair for a bearer token
///
/// Unknown users and wrong passwords are indistinguishable to the caller.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let Json(request) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let principal = authenticate(
        state.db.as_ref(),
        &state.credentials,
        &request.username,
        &request.password,
    )
    .await?;

    let ttl = Duration::minutes(state.config.security.access_token_expire_minutes as i64);
    let access_token = state.tokens.issue(&principal, Some(ttl)).map_err(|e| {
        tracing::error!("Token issuance failed for '{}': {}", principal.username, e);
        ApiError::internal_server_error("Could not issue access token")
    })?;

    tracing::info!("Issued access token for '{}' ({})", principal.username, principal.role);

    Ok(ApiResponse::success(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: ttl.num_seconds(),
    }))
}
