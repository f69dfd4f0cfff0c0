// handlers/public/register.rs - POST /register handler

use std::collections::HashMap;

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::AuthError;
use crate::database::models::{NewUser, UserResponse};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Role;

use super::utils::{validate_email_format, validate_password_strength, validate_username_format};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub user_type: Option<String>,
}

/// POST /register - create a new account
///
/// Field problems are reported together in `field_errors`. Registering as admin or
/// moderator requires `allow_privileged_registration`.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<UserResponse> {
    let Json(request) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let mut field_errors = HashMap::new();

    let username = validate_username_format(&request.username)
        .map_err(|e| field_errors.insert("username".to_string(), e))
        .ok();
    let email = validate_email_format(&request.email)
        .map_err(|e| field_errors.insert("email".to_string(), e))
        .ok();
    if let Err(e) = validate_password_strength(&request.password) {
        field_errors.insert("password".to_string(), e);
    }
    let user_type = match request.user_type.as_deref() {
        None => Some(Role::User),
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|e| field_errors.insert("user_type".to_string(), e.to_string()))
            .ok(),
    };

    let (Some(username), Some(email), Some(user_type), true) = (username, email, user_type, field_errors.is_empty())
    else {
        return Err(ApiError::validation_error("Invalid registration request", Some(field_errors)));
    };

    if user_type.is_privileged() && !state.config.security.allow_privileged_registration {
        tracing::warn!("Refused self-registration of '{}' as {}", username, user_type);
        return Err(AuthError::Forbidden.into());
    }

    let hashed_password = state
        .credentials
        .hash_offloaded(request.password)
        .await
        .map_err(|e| {
            tracing::error!("Password hashing failed during registration: {}", e);
            ApiError::internal_server_error("Could not create account")
        })?;

    let user = state
        .db
        .create_user(NewUser {
            username,
            email,
            hashed_password,
            user_type,
        })
        .await?;

    tracing::info!("Registered user '{}' ({}) with id {}", user.username, user.user_type, user.id);
    Ok(ApiResponse::created(UserResponse::from(&user)))
}
