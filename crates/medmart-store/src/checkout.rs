//! # Checkout Submission
//!
//! Turns a completed checkout wizard and the current cart into an order.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  wizard.review()          → OrderDraft       (must be at Review)        │
//! │  session.current()        → buyer            (must be signed in)        │
//! │  cart.refresh() + items() → lines            (must not be empty)        │
//! │  sleep(processing_delay)                                               │
//! │  orders.place(..)         → one transaction  (stock, notifications)     │
//! │  cart.clear_cart(), wizard.reset()                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use tracing::{info, warn};

use medmart_core::checkout::{CheckoutWizard, ShippingPolicy};
use medmart_core::OrderWithItems;
use medmart_db::{NewOrder, OrderRepository};

use crate::cart_store::CartStore;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckoutOptions {
    pub shipping: ShippingPolicy,
    /// Pause before submitting, standing in for payment processing.
    pub processing_delay: Duration,
}

/// Places the order for the signed-in buyer's cart.
///
/// On success the cart is cleared and the wizard starts over. On failure
/// both are left untouched so the buyer can fix the problem and retry.
///
/// ## Errors
/// - `Checkout` if the wizard is not at the review step
/// - `NotAuthenticated` if nobody is signed in
/// - `EmptyCart` if the cart has no lines
/// - `Remote` if the order is rejected (stock, delisted product) or the
///   backend fails
pub async fn place_order(
    wizard: &mut CheckoutWizard,
    cart: &CartStore,
    orders: &OrderRepository,
    options: &CheckoutOptions,
) -> StoreResult<OrderWithItems> {
    let draft = wizard.review()?;

    let auth = cart.session().current();
    let Some(buyer_id) = auth.user_id() else {
        return Err(StoreError::NotAuthenticated);
    };

    // Submit what the server holds, not a stale view
    cart.refresh().await?;
    let items = cart.items().await;
    if items.is_empty() {
        return Err(StoreError::EmptyCart);
    }

    if !options.processing_delay.is_zero() {
        tokio::time::sleep(options.processing_delay).await;
    }

    let new_order = NewOrder {
        buyer_id: buyer_id.to_string(),
        address: draft.address,
        payment: draft.payment,
        lines: items
            .iter()
            .map(|item| (item.product.id.clone(), item.quantity))
            .collect(),
        shipping: options.shipping,
    };

    let placed = orders.place(&new_order).await?;

    info!(
        order_number = %placed.order.order_number,
        buyer_id = %buyer_id,
        total_cents = placed.order.total_cents,
        "Checkout complete"
    );

    // The order stands even if clearing fails; the next refresh shows the leftovers
    if let Err(e) = cart.clear_cart().await {
        warn!(order_id = %placed.order.id, error = %e, "Order placed but cart could not be cleared");
    }
    wizard.reset();

    Ok(placed)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::local::LocalCart;
    use crate::remote::DbRemoteCart;
    use crate::session::SessionHandle;
    use crate::test_support;
    use medmart_core::checkout::{AddressForm, CheckoutStep, PaymentForm};
    use medmart_core::CoreError;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 14).unwrap()
    }

    fn wizard_at_review() -> CheckoutWizard {
        let mut wizard = CheckoutWizard::new();
        wizard
            .submit_address(&AddressForm {
                full_name: "Morgan Patel".to_string(),
                line1: "400 Elm St".to_string(),
                line2: None,
                city: "Denver".to_string(),
                region: "CO".to_string(),
                postal_code: "80202".to_string(),
                country: "US".to_string(),
            })
            .unwrap();
        wizard
            .submit_payment(
                &PaymentForm {
                    cardholder_name: "Morgan Patel".to_string(),
                    card_number: "5555 5555 5555 4444".to_string(),
                    expiry: "11/29".to_string(),
                    cvc: "321".to_string(),
                },
                today(),
            )
            .unwrap();
        wizard
    }

    #[tokio::test]
    async fn test_place_order_clears_cart() {
        let fx = test_support::fixture().await;
        let store = CartStore::new(
            LocalCart::in_memory(),
            Arc::new(DbRemoteCart::new(fx.db.carts())),
            SessionHandle::new(),
        );

        // Added while anonymous, merged on sign-in
        store.add_item(&fx.p1, 3).await.unwrap();
        store.session().sign_in(test_support::session(&fx.buyer.id));
        store.add_item(&fx.p2, 1).await.unwrap();

        let mut wizard = wizard_at_review();
        let placed = place_order(&mut wizard, &store, &fx.db.orders(), &CheckoutOptions::default())
            .await
            .unwrap();

        assert_eq!(placed.items.len(), 2);
        assert_eq!(placed.order.subtotal_cents, 3 * fx.p1.price_cents + fx.p2.price_cents);
        assert_eq!(placed.order.payment_last4, "4444");
        assert_eq!(placed.order.ship_city, "Denver");

        assert!(store.items().await.is_empty());
        assert_eq!(fx.db.carts().count(&fx.buyer.id).await.unwrap(), 0);
        assert_eq!(wizard.step(), CheckoutStep::Address);
    }

    #[tokio::test]
    async fn test_place_order_preconditions() {
        let fx = test_support::fixture().await;
        let store = CartStore::new(
            LocalCart::in_memory(),
            Arc::new(DbRemoteCart::new(fx.db.carts())),
            SessionHandle::new(),
        );
        let orders = fx.db.orders();
        let options = CheckoutOptions::default();

        // Not at review
        let mut fresh = CheckoutWizard::new();
        assert!(matches!(
            place_order(&mut fresh, &store, &orders, &options).await,
            Err(StoreError::Checkout(CoreError::InvalidCheckoutStep { .. }))
        ));

        // Anonymous
        let mut wizard = wizard_at_review();
        store.add_item(&fx.p1, 1).await.unwrap();
        assert!(matches!(
            place_order(&mut wizard, &store, &orders, &options).await,
            Err(StoreError::NotAuthenticated)
        ));

        // Signed in with an empty cart
        store.clear_cart().await.unwrap();
        store.session().sign_in(test_support::session(&fx.buyer.id));
        assert!(matches!(
            place_order(&mut wizard, &store, &orders, &options).await,
            Err(StoreError::EmptyCart)
        ));
        assert_eq!(wizard.step(), CheckoutStep::Review);
    }

    #[tokio::test]
    async fn test_rejected_order_keeps_cart() {
        let fx = test_support::fixture().await;
        let store = CartStore::new(
            LocalCart::in_memory(),
            Arc::new(DbRemoteCart::new(fx.db.carts())),
            SessionHandle::new(),
        );
        store.session().sign_in(test_support::session(&fx.buyer.id));
        store.add_item(&fx.p1, fx.p1.stock + 1).await.unwrap();

        let mut wizard = wizard_at_review();
        let err = place_order(&mut wizard, &store, &fx.db.orders(), &CheckoutOptions::default())
            .await
            .unwrap_err();

        assert!(err.is_remote());
        assert_eq!(store.items().await.len(), 1);
        assert_eq!(wizard.step(), CheckoutStep::Review);
    }

    #[tokio::test]
    async fn test_processing_delay_is_applied() {
        let fx = test_support::fixture().await;
        let store = CartStore::new(
            LocalCart::in_memory(),
            Arc::new(DbRemoteCart::new(fx.db.carts())),
            SessionHandle::new(),
        );
        store.session().sign_in(test_support::session(&fx.buyer.id));
        store.add_item(&fx.p2, 1).await.unwrap();

        let options = CheckoutOptions {
            processing_delay: Duration::from_millis(50),
            ..Default::default()
        };
        let started = std::time::Instant::now();
        let mut wizard = wizard_at_review();
        place_order(&mut wizard, &store, &fx.db.orders(), &options).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
