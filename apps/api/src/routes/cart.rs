//! The signed-in user's remote cart.
//!
//! Every mutation answers with the refetched cart, so clients can replace
//! their copy wholesale.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use medmart_core::checkout::OrderQuote;
use medmart_core::validation::validate_quantity;
use medmart_core::{Cart, CartItem, CartTotals, CoreError};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub totals: CartTotals,
    pub quote: OrderQuote,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItem {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantity {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub items: Vec<MergeLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeLine {
    pub product_id: String,
    pub quantity: i64,
}

async fn load(state: &AppState, user_id: &str) -> ApiResult<Json<CartView>> {
    let cart = Cart::from_items(state.db.carts().items(user_id).await?);

    Ok(Json(CartView {
        totals: cart.totals(),
        quote: state.config.shipping_policy().quote(&cart),
        items: cart.items().to_vec(),
    }))
}

/// `GET /api/cart`
pub async fn view(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<CartView>> {
    load(&state, &auth.user_id).await
}

/// `POST /api/cart/items`
///
/// Adds to the existing quantity when the product is already in the cart.
pub async fn add_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<AddItem>,
) -> ApiResult<Json<CartView>> {
    validate_quantity(req.quantity)?;

    let product = state
        .db
        .products()
        .get_by_id(&req.product_id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::ProductNotFound(req.product_id.clone())))?;
    if !product.is_active {
        return Err(CoreError::ProductUnavailable(product.sku).into());
    }

    // The summed line must still fit
    let carts = state.db.carts();
    let mut cart = Cart::from_items(carts.items(&auth.user_id).await?);
    cart.add_item(&product, req.quantity)?;

    carts.add(&auth.user_id, &product.id, req.quantity).await?;
    load(&state, &auth.user_id).await
}

/// `PUT /api/cart/items/{product_id}`
///
/// A quantity below one removes the line.
pub async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(product_id): Path<String>,
    Json(req): Json<SetQuantity>,
) -> ApiResult<Json<CartView>> {
    let carts = state.db.carts();

    if req.quantity < 1 {
        carts.remove(&auth.user_id, &product_id).await?;
    } else {
        validate_quantity(req.quantity)?;
        if !carts.set_quantity(&auth.user_id, &product_id, req.quantity).await? {
            return Err(ApiError::not_found(format!("Product {} is not in the cart", product_id)));
        }
    }

    load(&state, &auth.user_id).await
}

/// `DELETE /api/cart/items/{product_id}`
///
/// Removing a line that isn't there is not an error.
pub async fn remove_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(product_id): Path<String>,
) -> ApiResult<Json<CartView>> {
    state.db.carts().remove(&auth.user_id, &product_id).await?;
    load(&state, &auth.user_id).await
}

/// `DELETE /api/cart`
pub async fn clear(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<CartView>> {
    state.db.carts().clear(&auth.user_id).await?;
    load(&state, &auth.user_id).await
}

/// `POST /api/cart/merge`
///
/// Folds an anonymous cart into the remote one; quantities add up.
pub async fn merge(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<MergeRequest>,
) -> ApiResult<Json<CartView>> {
    let lines: Vec<(String, i64)> = req
        .items
        .into_iter()
        .map(|line| (line.product_id, line.quantity))
        .collect();

    state.db.carts().merge(&auth.user_id, &lines).await?;
    load(&state, &auth.user_id).await
}
