//! Route table.

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod dashboard;
pub mod notifications;
pub mod orders;

#[cfg(test)]
mod tests;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    // Replaces axum's 2 MiB default for uploads
    let avatar_limit = state.config.max_avatar_bytes;

    let api = Router::new()
        // Auth
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        // Account
        .route("/user", get(account::me).put(account::update_profile))
        .route(
            "/avatar",
            get(account::my_avatar)
                .put(account::upload_avatar)
                .delete(account::delete_avatar)
                .layer(DefaultBodyLimit::max(avatar_limit)),
        )
        .route("/avatar/{user_id}", get(account::avatar))
        // Catalog
        .route("/products", get(catalog::list_products).post(catalog::create_product))
        .route(
            "/products/{id}",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delist_product),
        )
        .route("/categories", get(catalog::list_categories))
        .route("/suppliers", get(catalog::list_suppliers))
        // Cart
        .route("/cart", get(cart::view).delete(cart::clear))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{product_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/cart/merge", post(cart::merge))
        // Orders
        .route("/checkout", post(orders::checkout))
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::get))
        .route("/orders/{id}/status", put(orders::update_status))
        // Dashboards
        .route("/dashboard/buyer", get(dashboard::buyer))
        .route("/dashboard/supplier", get(dashboard::supplier))
        // Admin
        .route("/admin/stats", get(admin::stats))
        .route("/admin/recent-activity", get(admin::recent_activity))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{id}/role", put(admin::set_role))
        // Notifications
        .route("/notifications", get(notifications::list))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/{id}/read", post(notifications::mark_read));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "degraded" })))
    }
}

/// Clamps an optional `?limit=` to `1..=max`.
pub(crate) fn clamp_limit(limit: Option<u32>, default: u32, max: u32) -> u32 {
    limit.unwrap_or(default).clamp(1, max)
}
