//! The caller's own profile and avatar.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use medmart_core::validation::{validate_full_name, validate_optional};
use medmart_core::{User, UserRole, ValidationError};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::AppState;

const AVATAR_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: String,
    #[serde(default)]
    pub company_name: Option<String>,
}

/// `GET /api/user`
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<User>> {
    let user = state
        .db
        .users()
        .get_by_id(&auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user))
}

/// `PUT /api/user`
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    let full_name = validate_full_name(&req.full_name)?;
    let company_name = validate_optional("company name", req.company_name.as_deref(), 120)?;
    if auth.role == UserRole::Supplier && company_name.is_none() {
        return Err(ValidationError::required("company name").into());
    }

    let user = state
        .db
        .users()
        .update_profile(&auth.user_id, &full_name, company_name.as_deref())
        .await?;

    Ok(Json(user))
}

/// `PUT /api/avatar` with the raw image as the body.
pub async fn upload_avatar(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
        .unwrap_or_default();

    if !AVATAR_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::new(
            ErrorCode::UnsupportedMediaType,
            format!("Avatar must be one of {}", AVATAR_TYPES.join(", ")),
        ));
    }
    if body.is_empty() {
        return Err(ApiError::invalid("Avatar image is empty"));
    }
    if body.len() > state.config.max_avatar_bytes {
        return Err(ApiError::new(
            ErrorCode::PayloadTooLarge,
            format!("Avatar exceeds {} bytes", state.config.max_avatar_bytes),
        ));
    }

    state.db.users().set_avatar(&auth.user_id, &body, &content_type).await?;
    info!(user_id = %auth.user_id, size = body.len(), "Avatar updated");

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/avatar`
pub async fn my_avatar(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Response> {
    avatar_response(&state, &auth.user_id).await
}

/// `GET /api/avatar/{user_id}`
pub async fn avatar(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<Response> {
    avatar_response(&state, &user_id).await
}

/// `DELETE /api/avatar`
pub async fn delete_avatar(State(state): State<AppState>, auth: AuthUser) -> ApiResult<StatusCode> {
    state.db.users().clear_avatar(&auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn avatar_response(state: &AppState, user_id: &str) -> ApiResult<Response> {
    let (bytes, content_type) = state
        .db
        .users()
        .get_avatar(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("No avatar"))?;

    Ok(([(CONTENT_TYPE, content_type)], bytes).into_response())
}
