//! # Remote Cart
//!
//! The seam between the cart store and the server-persisted, per-user cart.
//!
//! Every method is keyed by user id and maps onto one backend call. The
//! store never predicts the result of a write: it writes, then calls
//! [`RemoteCart::fetch`].

use async_trait::async_trait;
use tracing::debug;

use medmart_core::CartItem;
use medmart_db::CartRepository;

use crate::error::StoreResult;

#[async_trait]
pub trait RemoteCart: Send + Sync {
    /// The user's cart lines, with current product data.
    async fn fetch(&self, user_id: &str) -> StoreResult<Vec<CartItem>>;

    /// Adds `quantity` units, incrementing an existing line.
    async fn add(&self, user_id: &str, product_id: &str, quantity: i64) -> StoreResult<()>;

    /// Sets a line's quantity. Callers route `quantity < 1` to `remove`.
    async fn set_quantity(&self, user_id: &str, product_id: &str, quantity: i64) -> StoreResult<()>;

    async fn remove(&self, user_id: &str, product_id: &str) -> StoreResult<()>;

    async fn clear(&self, user_id: &str) -> StoreResult<()>;

    /// Folds `(product_id, quantity)` lines into the user's cart.
    async fn merge(&self, user_id: &str, lines: &[(String, i64)]) -> StoreResult<()>;
}

/// [`RemoteCart`] over the SQLite cart rows.
#[derive(Debug, Clone)]
pub struct DbRemoteCart {
    carts: CartRepository,
}

impl DbRemoteCart {
    pub fn new(carts: CartRepository) -> Self {
        DbRemoteCart { carts }
    }
}

#[async_trait]
impl RemoteCart for DbRemoteCart {
    async fn fetch(&self, user_id: &str) -> StoreResult<Vec<CartItem>> {
        Ok(self.carts.items(user_id).await?)
    }

    async fn add(&self, user_id: &str, product_id: &str, quantity: i64) -> StoreResult<()> {
        self.carts.add(user_id, product_id, quantity).await?;
        Ok(())
    }

    async fn set_quantity(&self, user_id: &str, product_id: &str, quantity: i64) -> StoreResult<()> {
        let changed = self.carts.set_quantity(user_id, product_id, quantity).await?;
        if !changed {
            debug!(user_id = %user_id, product_id = %product_id, "Quantity update for product not in cart");
        }
        Ok(())
    }

    async fn remove(&self, user_id: &str, product_id: &str) -> StoreResult<()> {
        self.carts.remove(user_id, product_id).await?;
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> StoreResult<()> {
        self.carts.clear(user_id).await?;
        Ok(())
    }

    async fn merge(&self, user_id: &str, lines: &[(String, i64)]) -> StoreResult<()> {
        self.carts.merge(user_id, lines).await?;
        Ok(())
    }
}
