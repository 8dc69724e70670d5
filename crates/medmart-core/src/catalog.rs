//! # Catalog
//!
//! Filtering, sorting and pagination over in-memory product lists.
//!
//! The storefront, supplier dashboard and admin views all fetch a product
//! list and then narrow it down the same way:
//!
//! ```text
//! Vec<Product> ──► filter (ProductFilter) ──► sort (ProductSort) ──► paginate ──► Page<Product>
//! ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::Product;
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// Filter
// =============================================================================

/// Criteria a product must meet to be listed. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ProductFilter {
    /// Case-insensitive substring match on name, sku and description.
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub in_stock_only: bool,
    /// Delisted products are hidden unless this is set (supplier/admin views).
    pub include_inactive: bool,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if !self.include_inactive && !product.is_active {
            return false;
        }

        if self.in_stock_only && !product.is_in_stock() {
            return false;
        }

        if let Some(category) = &self.category_id {
            if product.category_id.as_deref() != Some(category.as_str()) {
                return false;
            }
        }

        if let Some(supplier) = &self.supplier_id {
            if &product.supplier_id != supplier {
                return false;
            }
        }

        if self.min_price_cents.is_some_and(|min| product.price_cents < min) {
            return false;
        }

        if self.max_price_cents.is_some_and(|max| product.price_cents > max) {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                product.name.to_lowercase().contains(&needle)
                    || product.sku.to_lowercase().contains(&needle)
                    || product
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            }
        }
    }
}

// =============================================================================
// Sort
// =============================================================================

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

impl FromStr for ProductSort {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(ProductSort::Newest),
            "price_asc" => Ok(ProductSort::PriceAsc),
            "price_desc" => Ok(ProductSort::PriceDesc),
            "name_asc" => Ok(ProductSort::NameAsc),
            _ => Err(ValidationError::NotAllowed {
                field: "sort".to_string(),
                allowed: ["newest", "price_asc", "price_desc", "name_asc"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

impl ProductSort {
    /// Sorts in place. Ties fall back to product id so the order is stable
    /// across requests.
    pub fn sort(&self, products: &mut [Product]) {
        match self {
            ProductSort::Newest => {
                products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)))
            }
            ProductSort::PriceAsc => {
                products.sort_by(|a, b| a.price_cents.cmp(&b.price_cents).then_with(|| a.id.cmp(&b.id)))
            }
            ProductSort::PriceDesc => {
                products.sort_by(|a, b| b.price_cents.cmp(&a.price_cents).then_with(|| a.id.cmp(&b.id)))
            }
            ProductSort::NameAsc => products.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then_with(|| a.id.cmp(&b.id))
            }),
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
    pub total_pages: u32,
}

/// Slices `items` into the requested page.
///
/// `page` is 1-based; 0 is treated as 1. `per_page` is clamped to
/// `1..=MAX_PAGE_SIZE`. A page past the end is empty, not an error.
pub fn paginate<T>(items: Vec<T>, page: u32, per_page: u32) -> Page<T> {
    let page = page.max(1);
    let per_page = per_page.clamp(1, MAX_PAGE_SIZE);
    let total = items.len();
    let total_pages = total.div_ceil(per_page as usize) as u32;

    let start = (page as usize - 1).saturating_mul(per_page as usize);
    let items = items
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();

    Page {
        items,
        page,
        per_page,
        total,
        total_pages,
    }
}

/// Filter, sort and paginate in one pass.
pub fn browse(
    products: Vec<Product>,
    filter: &ProductFilter,
    sort: ProductSort,
    page: Option<u32>,
    per_page: Option<u32>,
) -> Page<Product> {
    let mut matching: Vec<Product> = products.into_iter().filter(|p| filter.matches(p)).collect();
    sort.sort(&mut matching);
    paginate(matching, page.unwrap_or(1), per_page.unwrap_or(DEFAULT_PAGE_SIZE))
}

// =============================================================================
// Unit Tests
// =============================================================================
