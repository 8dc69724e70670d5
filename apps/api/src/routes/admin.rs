//! Admin console: marketplace stats, activity feed, account roles.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use medmart_core::{ActivityEntry, AdminStats, User, UserRole};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::routes::clamp_limit;
use crate::AppState;

const DEFAULT_ACTIVITY_LIMIT: u32 = 20;
const MAX_ACTIVITY_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsersQuery {
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleUpdate {
    pub role: UserRole,
}

/// `GET /api/admin/stats`
pub async fn stats(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<AdminStats>> {
    auth.require_admin()?;
    Ok(Json(state.db.dashboards().admin_stats().await?))
}

/// `GET /api/admin/recent-activity`
pub async fn recent_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<Vec<ActivityEntry>>> {
    auth.require_admin()?;
    let limit = clamp_limit(query.limit, DEFAULT_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT);
    Ok(Json(state.db.activity().recent(limit).await?))
}

/// `GET /api/admin/users`
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<UsersQuery>,
) -> ApiResult<Json<Vec<User>>> {
    auth.require_admin()?;
    Ok(Json(state.db.users().list(query.role).await?))
}

/// `PUT /api/admin/users/{id}/role`
///
/// Admins cannot change their own role, so the last admin can't lock
/// everyone out.
pub async fn set_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RoleUpdate>,
) -> ApiResult<Json<User>> {
    auth.require_admin()?;
    if id == auth.user_id {
        return Err(ApiError::forbidden("Admins cannot change their own role"));
    }

    let users = state.db.users();
    users.set_role(&id, req.role).await?;
    info!(user_id = %id, role = %req.role, by = %auth.user_id, "Role changed");

    let user = users
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", id)))?;
    Ok(Json(user))
}
