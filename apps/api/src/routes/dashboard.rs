//! Role dashboards.

use axum::extract::State;
use axum::Json;

use medmart_core::{BuyerDashboard, SupplierDashboard, UserRole};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::AppState;

/// `GET /api/dashboard/buyer`
pub async fn buyer(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<BuyerDashboard>> {
    auth.require_role(&[UserRole::Buyer])?;
    Ok(Json(state.db.dashboards().buyer(&auth.user_id).await?))
}

/// `GET /api/dashboard/supplier`
pub async fn supplier(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<SupplierDashboard>> {
    auth.require_role(&[UserRole::Supplier])?;
    Ok(Json(state.db.dashboards().supplier(&auth.user_id).await?))
}
