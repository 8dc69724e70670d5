//! Checkout and order history.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use medmart_core::checkout::{AddressForm, CheckoutWizard, PaymentForm};
use medmart_core::{CoreError, Order, OrderStatus, OrderWithItems, UserRole};
use medmart_db::NewOrder;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::routes::clamp_limit;
use crate::AppState;

const DEFAULT_ORDER_LIMIT: u32 = 50;
const MAX_ORDER_LIMIT: u32 = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub address: AddressForm,
    pub payment: PaymentForm,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// `POST /api/checkout`
///
/// Runs the address and payment steps server side, then places the caller's
/// remote cart as one order and empties the cart.
pub async fn checkout(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<OrderWithItems>)> {
    let mut wizard = CheckoutWizard::new();
    wizard.submit_address(&req.address)?;
    wizard.submit_payment(&req.payment, Utc::now().date_naive())?;
    let draft = wizard.review()?;

    let carts = state.db.carts();
    let items = carts.items(&auth.user_id).await?;
    if items.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let placed = state
        .db
        .orders()
        .place(&NewOrder {
            buyer_id: auth.user_id.clone(),
            address: draft.address,
            payment: draft.payment,
            lines: items
                .iter()
                .map(|item| (item.product.id.clone(), item.quantity))
                .collect(),
            shipping: state.config.shipping_policy(),
        })
        .await?;

    if let Err(e) = carts.clear(&auth.user_id).await {
        warn!(order_id = %placed.order.id, error = %e, "Order placed but cart could not be cleared");
    }

    info!(
        order_number = %placed.order.order_number,
        buyer_id = %auth.user_id,
        total_cents = placed.order.total_cents,
        "Checkout complete"
    );

    Ok((StatusCode::CREATED, Json(placed)))
}

/// `GET /api/orders`
///
/// Buyers see their own orders, suppliers the orders containing their
/// products, admins everything.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Order>>> {
    let limit = clamp_limit(query.limit, DEFAULT_ORDER_LIMIT, MAX_ORDER_LIMIT);
    let orders = state.db.orders();

    let list = match auth.role {
        UserRole::Buyer => orders.list_for_buyer(&auth.user_id, limit).await?,
        UserRole::Supplier => orders.list_for_supplier(&auth.user_id, limit).await?,
        UserRole::Admin => orders.list_all(limit).await?,
    };

    Ok(Json(list))
}

/// `GET /api/orders/{id}`
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderWithItems>> {
    let order = visible_order(&state, &auth, &id).await?;
    Ok(Json(order))
}

/// `PUT /api/orders/{id}/status`
///
/// Suppliers on the order and admins may move it to any status; the buyer
/// may only cancel while it is still pending.
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdate>,
) -> ApiResult<Json<OrderWithItems>> {
    let current = visible_order(&state, &auth, &id).await?;

    if auth.role == UserRole::Buyer
        && !(req.status == OrderStatus::Cancelled && current.order.status == OrderStatus::Pending)
    {
        return Err(ApiError::forbidden("Buyers may only cancel pending orders"));
    }

    let orders = state.db.orders();
    orders.update_status(&id, req.status).await?;
    info!(order_id = %id, status = ?req.status, by = %auth.user_id, "Order status changed");

    let updated = orders
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Order not found: {}", id)))?;
    Ok(Json(updated))
}

async fn visible_order(state: &AppState, auth: &AuthUser, id: &str) -> ApiResult<OrderWithItems> {
    let order = state
        .db
        .orders()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Order not found: {}", id)))?;

    let visible = match auth.role {
        UserRole::Admin => true,
        UserRole::Buyer => order.order.buyer_id == auth.user_id,
        UserRole::Supplier => order.items.iter().any(|item| item.supplier_id == auth.user_id),
    };

    if visible {
        Ok(order)
    } else {
        Err(ApiError::forbidden("Not allowed to view this order"))
    }
}
