//! # Cart
//!
//! Line items and the arithmetic of a shopping cart.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  add_item(P, n) ─────────► P present? qty += n : push (P, n)           │
//! │                                                                         │
//! │  update_quantity(id, n) ─► n < 1 ? remove_item(id) : qty = n           │
//! │                                                                         │
//! │  remove_item(id) ────────► retain(!= id)          (idempotent)         │
//! │                                                                         │
//! │  merge(other) ───────────► add_item for every line of `other`          │
//! │                                                                         │
//! │  total_items = Σ qty        subtotal = Σ price × qty                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This type knows nothing about where a cart is persisted. The cart store in
//! medmart-store decides whether a `Cart` lives in local storage or in the
//! remote per-user rows.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_quantity;

/// An item in the shopping cart.
///
/// ## Serialized Form
/// This is exactly what the anonymous cart stores under the `"cart"` key:
/// ```json
/// { "product": { "id": "...", "priceCents": 1299, ... }, "quantity": 2 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    pub product: Product,
    /// Always ≥ 1 while the item is in a cart.
    pub quantity: i64,
}

impl CartItem {
    pub fn new(product: Product, quantity: i64) -> Self {
        CartItem { product, quantity }
    }

    #[inline]
    pub fn product_id(&self) -> &str {
        &self.product.id
    }

    /// Calculates the line total (unit price × quantity), saturating at
    /// `i64::MAX` cents.
    pub fn line_total(&self) -> Money {
        self.product.price().multiply_quantity(self.quantity)
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by product id (adding same product increases quantity)
/// - Every quantity is ≥ 1 (setting a quantity below 1 removes the item)
/// - No upper bound on quantity; stock is checked at checkout
/// - Items keep the order in which they were first added
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Builds a cart from stored line items.
    ///
    /// Duplicate product ids are folded together and non-positive quantities
    /// are dropped, so a hand-edited or corrupted store still yields a valid cart.
    /// Folded quantities saturate at `i64::MAX`.
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Cart::new();
        for item in items {
            if item.quantity < 1 {
                continue;
            }
            match cart.line_mut(&item.product.id) {
                Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
                None => cart.items.push(item),
            }
        }
        cart
    }

    /// Adds a product to the cart or increases quantity if already present.
    ///
    /// ## Errors
    /// - `quantity` below 1
    /// - the summed quantity would not fit in an `i64`
    ///
    /// On error the cart is left untouched.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> Result<(), ValidationError> {
        validate_quantity(quantity)?;
        self.push_or_increment(product, quantity)
    }

    /// Sets the quantity of an item in the cart.
    ///
    /// ## Behavior
    /// - `quantity < 1`: same as [`Cart::remove_item`]
    /// - product not in cart: no-op
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) {
        if quantity < 1 {
            self.remove_item(product_id);
            return;
        }

        if let Some(item) = self.line_mut(product_id) {
            item.quantity = quantity;
        }
    }

    /// Removes an item from the cart by product ID.
    ///
    /// Returns `true` if an item was removed. Removing an absent id is a no-op.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product.id != product_id);
        self.items.len() != initial_len
    }

    /// Clears all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Unions `other` into this cart: existing lines are incremented, new
    /// lines appended.
    ///
    /// All or nothing: if any summed quantity overflows, this cart is unchanged.
    pub fn merge(&mut self, other: &Cart) -> Result<(), ValidationError> {
        let mut merged = self.clone();
        for item in &other.items {
            merged.push_or_increment(&item.product, item.quantity)?;
        }
        *self = merged;
        Ok(())
    }

    fn push_or_increment(&mut self, product: &Product, quantity: i64) -> Result<(), ValidationError> {
        if let Some(item) = self.line_mut(&product.id) {
            item.quantity = item
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| ValidationError::too_large("quantity"))?;
            return Ok(());
        }
        self.items.push(CartItem::new(product.clone(), quantity));
        Ok(())
    }

    fn line_mut(&mut self, product_id: &str) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.product.id == product_id)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    /// Returns the quantity of a product, if present.
    pub fn quantity_of(&self, product_id: &str) -> Option<i64> {
        self.items
            .iter()
            .find(|i| i.product.id == product_id)
            .map(|i| i.quantity)
    }

    /// Returns the number of distinct products.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the sum of all quantities, saturating at `i64::MAX`.
    pub fn total_items(&self) -> i64 {
        self.items.iter().fold(0i64, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Returns Σ price × quantity over all items.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }
}

impl FromIterator<CartItem> for Cart {
    fn from_iter<T: IntoIterator<Item = CartItem>>(iter: T) -> Self {
        Cart::from_items(iter)
    }
}

/// Cart totals summary for API responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    /// Distinct products.
    pub item_count: usize,
    /// Σ quantity.
    pub total_items: i64,
    pub subtotal_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_items: cart.total_items(),
            subtotal_cents: cart.subtotal().cents(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price_cents: i64) -> Product {
        Product::new(id, "supplier-1", format!("SKU-{}", id), format!("Product {}", id), price_cents)
    }

    #[test]
    fn test_add_same_product_sums_quantities() {
        let mut cart = Cart::new();
        let p1 = product("p1", 100);

        cart.add_item(&p1, 2).unwrap();
        cart.add_item(&p1, 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.quantity_of("p1"), Some(5));
        assert_eq!(cart.subtotal().cents(), 500);
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let mut cart = Cart::new();
        let p1 = product("p1", 100);

        assert!(cart.add_item(&p1, 0).is_err());
        assert!(cart.add_item(&p1, -2).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_to_zero_is_remove() {
        let p1 = product("p1", 100);
        let p2 = product("p2", 250);

        let mut updated = Cart::new();
        updated.add_item(&p1, 2).unwrap();
        updated.add_item(&p2, 1).unwrap();
        let mut removed = updated.clone();

        updated.update_quantity("p1", 0);
        removed.remove_item("p1");

        assert_eq!(updated, removed);
        assert_eq!(updated.quantity_of("p1"), None);
    }

    #[test]
    fn test_update_sets_quantity_directly() {
        let mut cart = Cart::new();
        cart.add_item(&product("p1", 100), 2).unwrap();

        cart.update_quantity("p1", 7);
        assert_eq!(cart.quantity_of("p1"), Some(7));

        // Absent id leaves the cart alone
        cart.update_quantity("missing", 3);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add_item(&product("p1", 100), 1).unwrap();
        let before = cart.clone();

        assert!(!cart.remove_item("nope"));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_totals_match_line_sums() {
        let mut cart = Cart::new();
        cart.add_item(&product("p1", 1299), 3).unwrap();
        cart.add_item(&product("p2", 450), 2).unwrap();
        cart.add_item(&product("p3", 5), 10).unwrap();

        assert_eq!(cart.total_items(), 15);
        assert_eq!(cart.subtotal().cents(), 1299 * 3 + 450 * 2 + 5 * 10);

        let totals = cart.totals();
        assert_eq!(totals.item_count, 3);
        assert_eq!(totals.total_items, 15);
    }

    #[test]
    fn test_merge_increments_and_appends() {
        let mut remote = Cart::new();
        remote.add_item(&product("p1", 100), 1).unwrap();

        let mut local = Cart::new();
        local.add_item(&product("p1", 100), 2).unwrap();
        local.add_item(&product("p2", 200), 4).unwrap();

        remote.merge(&local).unwrap();

        assert_eq!(remote.quantity_of("p1"), Some(3));
        assert_eq!(remote.quantity_of("p2"), Some(4));
        assert_eq!(remote.items()[0].product.id, "p1");
    }

    #[test]
    fn test_add_rejects_quantity_overflow() {
        let mut cart = Cart::new();
        let p1 = product("p1", 100);

        cart.add_item(&p1, i64::MAX).unwrap();
        let err = cart.add_item(&p1, 1).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
        assert_eq!(cart.quantity_of("p1"), Some(i64::MAX));
    }

    #[test]
    fn test_huge_quantity_saturates_totals() {
        let mut cart = Cart::new();
        cart.add_item(&product("p1", 1000), i64::MAX / 100).unwrap();
        cart.add_item(&product("p2", 100), i64::MAX).unwrap();

        assert_eq!(cart.subtotal().cents(), i64::MAX);
        assert_eq!(cart.total_items(), i64::MAX);

        let totals = cart.totals();
        assert_eq!(totals.subtotal_cents, i64::MAX);
        assert_eq!(totals.item_count, 2);
    }

    #[test]
    fn test_merge_overflow_leaves_cart_unchanged() {
        let mut remote = Cart::new();
        remote.add_item(&product("p1", 100), i64::MAX).unwrap();

        let mut local = Cart::new();
        local.add_item(&product("p2", 100), 1).unwrap();
        local.add_item(&product("p1", 100), 1).unwrap();

        let before = remote.clone();
        assert!(remote.merge(&local).is_err());
        assert_eq!(remote, before);
    }

    #[test]
    fn test_from_items_folds_duplicates() {
        let cart = Cart::from_items(vec![
            CartItem::new(product("p1", 100), 1),
            CartItem::new(product("p1", 100), 2),
            CartItem::new(product("p2", 100), 0),
        ]);

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.quantity_of("p1"), Some(3));

        let saturated = Cart::from_items(vec![
            CartItem::new(product("p1", 100), i64::MAX),
            CartItem::new(product("p1", 100), 5),
        ]);
        assert_eq!(saturated.quantity_of("p1"), Some(i64::MAX));
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut cart = Cart::new();
        cart.add_item(&product("p1", 100), 2).unwrap();

        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["quantity"], 2);
        assert_eq!(json[0]["product"]["priceCents"], 100);

        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
