//! Owned data items. Every per-item route runs the ownership check before touching the item.

use axum::extract::{
    rejection::{JsonRejection, PathRejection, QueryRejection},
    Path, Query, State,
};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{authorize_resource, AuthError, Decision};
use crate::database::models::{DataItem, DataItemChanges, NewDataItem};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Principal;

pub const TITLE_MAX_LEN: usize = 200;
pub const DEFAULT_PAGE_LIMIT: usize = 100;
pub const MAX_PAGE_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// POST /data - create an item owned by the caller
pub async fn item_create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> ApiResult<DataItem> {
    let Json(request) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let item = state
        .db
        .create_item(NewDataItem {
            title: validate_title(&request.title)?,
            content: validate_content(&request.content)?,
            user_id: principal.id,
        })
        .await?;

    tracing::info!("User '{}' created data item {}", principal.username, item.id);
    Ok(ApiResponse::created(item))
}

/// GET /data - admins page through every item, everyone else through their own
pub async fn items_list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<DataItem>> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let (skip, limit) = page_bounds(&query)?;

    let owner = if principal.is_admin() { None } else { Some(principal.id) };
    let items = state.db.list_items(owner, skip, limit).await?;
    Ok(ApiResponse::success(items))
}

/// GET /data/:id
pub async fn item_get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<DataItem> {
    let id = item_id(id)?;
    require_access(&state, &principal, id).await?;

    let item = state
        .db
        .get_item(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Data item not found"))?;
    Ok(ApiResponse::success(item))
}

/// PUT /data/:id - partial update of title and/or content
pub async fn item_update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> ApiResult<DataItem> {
    let id = item_id(id)?;
    let Json(request) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    require_access(&state, &principal, id).await?;

    let changes = DataItemChanges {
        title: request.title.as_deref().map(validate_title).transpose()?,
        content: request.content.as_deref().map(validate_content).transpose()?,
    };

    let item = state
        .db
        .update_item(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Data item not found"))?;

    tracing::info!("User '{}' updated data item {}", principal.username, id);
    Ok(ApiResponse::success(item))
}

/// DELETE /data/:id
pub async fn item_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let id = item_id(id)?;
    require_access(&state, &principal, id).await?;

    if !state.db.delete_item(id).await? {
        return Err(ApiError::not_found("Data item not found"));
    }

    tracing::info!("User '{}' deleted data item {}", principal.username, id);
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

async fn require_access(state: &AppState, principal: &Principal, id: i64) -> Result<(), ApiError> {
    match authorize_resource(state.db.as_ref(), principal, id).await? {
        Decision::Granted => Ok(()),
        Decision::Denied => Err(AuthError::Forbidden.into()),
    }
}

fn item_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    id.map(|Path(id)| id)
        .map_err(|_| ApiError::bad_request("Data item id must be an integer"))
}

pub(super) fn page_bounds(query: &ListQuery) -> Result<(usize, usize), ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(ApiError::bad_request(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_LIMIT
        )));
    }
    Ok((query.skip.unwrap_or(0), limit))
}

fn validate_title(title: &str) -> Result<String, ApiError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(field_error("title", "Title cannot be empty"));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(field_error(
            "title",
            &format!("Title must be at most {} characters", TITLE_MAX_LEN),
        ));
    }
    Ok(title.to_string())
}

fn validate_content(content: &str) -> Result<String, ApiError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(field_error("content", "Content cannot be empty"));
    }
    Ok(content.to_string())
}

fn field_error(field: &str, message: &str) -> ApiError {
    let mut field_errors = std::collections::HashMap::new();
    field_errors.insert(field.to_string(), message.to_string());
    ApiError::validation_error(message, Some(field_errors))
}
