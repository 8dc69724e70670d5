//! The caller's notification inbox.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use medmart_core::Notification;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::routes::clamp_limit;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InboxQuery {
    pub unread_only: bool,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedRead {
    pub updated: u64,
}

/// `GET /api/notifications`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<InboxQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    let limit = clamp_limit(query.limit, 50, 200);
    let inbox = state
        .db
        .notifications()
        .list_for_user(&auth.user_id, query.unread_only, limit)
        .await?;

    Ok(Json(inbox))
}

/// `POST /api/notifications/{id}/read`
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    // Someone else's notification looks the same as a missing one
    if !state.db.notifications().mark_read(&id, &auth.user_id).await? {
        return Err(ApiError::not_found(format!("Notification not found: {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/notifications/read-all`
pub async fn mark_all_read(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<MarkedRead>> {
    let updated = state.db.notifications().mark_all_read(&auth.user_id).await?;
    Ok(Json(MarkedRead { updated }))
}
