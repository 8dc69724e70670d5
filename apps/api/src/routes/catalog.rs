//! Storefront catalog and supplier listing management.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use medmart_core::catalog::{browse, Page, ProductFilter, ProductSort};
use medmart_core::validation::{
    validate_optional, validate_price_cents, validate_product_name, validate_search_query, validate_sku,
    validate_stock,
};
use medmart_core::{ActivityKind, Category, Product, Supplier, UserRole};
use medmart_db::{NewProduct, ProductUpdate};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductQuery {
    pub search: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub in_stock: bool,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub category_id: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

/// `GET /api/products`
///
/// Active listings only, filtered, sorted and paginated.
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Page<Product>>> {
    let sort = match query.sort.as_deref() {
        Some(s) => ProductSort::from_str(s)?,
        None => ProductSort::default(),
    };

    let search = match query.search.as_deref() {
        Some(q) => Some(validate_search_query(q)?),
        None => None,
    };

    let category_id = match (query.category_id, query.category.as_deref()) {
        (Some(id), _) => Some(id),
        (None, Some(slug)) => {
            let category = state
                .db
                .categories()
                .get_by_slug(slug)
                .await?
                .ok_or_else(|| ApiError::not_found(format!("Unknown category '{}'", slug)))?;
            Some(category.id)
        }
        (None, None) => None,
    };

    let filter = ProductFilter {
        search,
        category_id,
        supplier_id: query.supplier_id,
        min_price_cents: query.min_price_cents,
        max_price_cents: query.max_price_cents,
        in_stock_only: query.in_stock,
        include_inactive: false,
    };

    let products = state.db.products().list(filter.supplier_id.as_deref(), false).await?;
    Ok(Json(browse(products, &filter, sort, query.page, query.per_page)))
}

/// `GET /api/products/{id}`
pub async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Product>> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| ApiError::not_found(format!("Product not found: {}", id)))?;

    Ok(Json(product))
}

/// `POST /api/products` (suppliers)
pub async fn create_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    auth.require_role(&[UserRole::Supplier])?;

    let sku = validate_sku(&req.sku)?;
    let name = validate_product_name(&req.name)?;
    let description = validate_optional("description", req.description.as_deref(), 2000)?;
    let image_url = validate_optional("image url", req.image_url.as_deref(), 500)?;
    validate_price_cents(req.price_cents)?;
    validate_stock(req.stock)?;
    let category_id = known_category(&state, req.category_id).await?;

    let product = state
        .db
        .products()
        .insert(&NewProduct {
            supplier_id: auth.user_id.clone(),
            category_id,
            sku,
            name,
            description,
            price_cents: req.price_cents,
            stock: req.stock,
            image_url,
        })
        .await?;

    state
        .db
        .activity()
        .record(
            Some(&auth.user_id),
            ActivityKind::ProductListed,
            &format!("Listed {} ({})", product.name, product.sku),
        )
        .await?;

    info!(product_id = %product.id, sku = %product.sku, supplier_id = %auth.user_id, "Product listed");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}` (owning supplier or admin)
pub async fn update_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateProduct>,
) -> ApiResult<Json<Product>> {
    let existing = owned_product(&state, &auth, &id).await?;

    let name = req.name.as_deref().map(validate_product_name).transpose()?;
    let description = validate_optional("description", req.description.as_deref(), 2000)?;
    let image_url = validate_optional("image url", req.image_url.as_deref(), 500)?;
    if let Some(price) = req.price_cents {
        validate_price_cents(price)?;
    }
    if let Some(stock) = req.stock {
        validate_stock(stock)?;
    }
    let category_id = known_category(&state, req.category_id).await?;

    let update = ProductUpdate {
        category_id,
        name,
        description,
        price_cents: req.price_cents,
        stock: req.stock,
        image_url,
        is_active: req.is_active,
    };
    let product = state.db.products().update(&existing.id, &update).await?;

    state
        .db
        .activity()
        .record(
            Some(&auth.user_id),
            ActivityKind::ProductUpdated,
            &format!("Updated {} ({})", product.name, product.sku),
        )
        .await?;

    Ok(Json(product))
}

/// `DELETE /api/products/{id}` (owning supplier or admin)
///
/// Delists rather than deletes so order history keeps its references.
pub async fn delist_product(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let product = owned_product(&state, &auth, &id).await?;

    state.db.products().set_active(&product.id, false).await?;
    state
        .db
        .activity()
        .record(
            Some(&auth.user_id),
            ActivityKind::ProductDelisted,
            &format!("Delisted {} ({})", product.name, product.sku),
        )
        .await?;

    info!(product_id = %product.id, by = %auth.user_id, "Product delisted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/categories`
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

/// `GET /api/suppliers`
pub async fn list_suppliers(State(state): State<AppState>) -> ApiResult<Json<Vec<Supplier>>> {
    Ok(Json(state.db.users().suppliers().await?))
}

async fn owned_product(state: &AppState, auth: &AuthUser, id: &str) -> ApiResult<Product> {
    auth.require_role(&[UserRole::Supplier, UserRole::Admin])?;

    let product = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product not found: {}", id)))?;

    auth.require_owner_or_admin(&product.supplier_id)?;
    Ok(product)
}

async fn known_category(state: &AppState, category_id: Option<String>) -> ApiResult<Option<String>> {
    let Some(id) = category_id.filter(|id| !id.trim().is_empty()) else {
        return Ok(None);
    };

    match state.db.categories().get_by_id(&id).await? {
        Some(category) => Ok(Some(category.id)),
        None => Err(ApiError::invalid(format!("Unknown category: {}", id))),
    }
}
