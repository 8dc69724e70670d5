//! # Cart Store
//!
//! One reactive view of "the current cart", whoever is signed in.
//!
//! ## Source Selection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Store                                      │
//! │                                                                         │
//! │   AuthState (watch) ──────────────┐                                     │
//! │                                   ▼                                     │
//! │                         ┌───────────────────┐                           │
//! │   add_item ───────────▶ │  ops Mutex        │ one mutation or refresh   │
//! │   update_quantity ────▶ │  (serializes)     │ at a time                 │
//! │   remove_item ────────▶ └─────────┬─────────┘                           │
//! │   clear_cart ─────────▶           │                                     │
//! │                    ┌──────────────┴──────────────┐                      │
//! │                    ▼                             ▼                      │
//! │            ANONYMOUS                     AUTHENTICATED(user)            │
//! │   mutate in memory, rewrite       remote write, then full refetch       │
//! │   local storage key "cart"        (no local prediction)                 │
//! │                    │                             │                      │
//! │                    └──────────────┬──────────────┘                      │
//! │                                   ▼                                     │
//! │                    RwLock<CartState> ──▶ broadcast<CartSnapshot>        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transitions
//! Any auth change makes the store reload from the now-current source. When
//! the source becomes a user's remote cart, the anonymous cart is first
//! merged into it and local storage is cleared, so nothing added before
//! signing in is lost.
//!
//! ## Failure Semantics
//! A failed remote read or write is logged, the in-memory cart degrades to
//! empty, and the error is returned to the caller. There is no retry.
//!
//! A failed sign-in merge also shows an empty cart, but the store stays
//! unloaded: local storage keeps the anonymous lines and the next operation
//! attempts the merge again.

use std::sync::{Arc, Weak};

use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use medmart_core::validation::validate_quantity;
use medmart_core::{Cart, CartItem, CartTotals, Money, Product};

use crate::error::{StoreError, StoreResult};
use crate::local::LocalCart;
use crate::remote::RemoteCart;
use crate::session::{AuthEvent, AuthState, SessionHandle};

const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// What the UI renders: the lines, their totals, and whose cart it is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub totals: CartTotals,
    /// `None` for the anonymous cart.
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Local,
    Remote(String),
}

impl Source {
    fn for_state(auth: &AuthState) -> Self {
        match auth.user_id() {
            Some(user_id) => Source::Remote(user_id.to_string()),
            None => Source::Local,
        }
    }

    fn user_id(&self) -> Option<&str> {
        match self {
            Source::Local => None,
            Source::Remote(user_id) => Some(user_id),
        }
    }
}

#[derive(Debug, Default)]
struct CartState {
    cart: Cart,
    /// `None` until the first load.
    source: Option<Source>,
}

pub struct CartStore {
    local: LocalCart,
    remote: Arc<dyn RemoteCart>,
    session: SessionHandle,
    state: RwLock<CartState>,
    ops: Mutex<()>,
    updates: broadcast::Sender<CartSnapshot>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Creates an empty, unloaded store. Nothing is read until the first
    /// operation or [`refresh`](Self::refresh).
    pub fn new(local: LocalCart, remote: Arc<dyn RemoteCart>, session: SessionHandle) -> Arc<Self> {
        let (updates, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Arc::new(CartStore {
            local,
            remote,
            session,
            state: RwLock::new(CartState::default()),
            ops: Mutex::new(()),
            updates,
        })
    }

    /// Creates the store, loads the current cart and starts following auth
    /// changes.
    ///
    /// A failed initial load is logged; the store starts empty.
    pub async fn start(
        local: LocalCart,
        remote: Arc<dyn RemoteCart>,
        session: SessionHandle,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let store = Self::new(local, remote, session);
        if let Err(e) = store.refresh().await {
            warn!(error = %e, "Initial cart load failed");
        }
        let listener = store.spawn_auth_listener();
        (store, listener)
    }

    /// Follows the session's auth state, reloading on every transition.
    ///
    /// The task ends when the store is dropped.
    pub fn spawn_auth_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<CartStore> = Arc::downgrade(self);
        let mut rx = self.session.subscribe();
        let mut prev = rx.borrow_and_update().clone();

        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let Some(store) = weak.upgrade() else {
                    break;
                };
                let next = rx.borrow_and_update().clone();
                if let Some(event) = AuthEvent::between(&prev, &next) {
                    if let Err(e) = store.on_auth_event(event).await {
                        warn!(event = ?event, error = %e, "Cart reload after auth change failed");
                    }
                }
                prev = next;
            }
            debug!("Cart auth listener stopped");
        })
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Receives a snapshot after every state change.
    pub fn subscribe(&self) -> broadcast::Receiver<CartSnapshot> {
        self.updates.subscribe()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn items(&self) -> Vec<CartItem> {
        self.state.read().await.cart.items().to_vec()
    }

    /// Σ quantity.
    pub async fn total_items(&self) -> i64 {
        self.state.read().await.cart.total_items()
    }

    /// Σ price × quantity.
    pub async fn subtotal(&self) -> Money {
        self.state.read().await.cart.subtotal()
    }

    pub async fn snapshot(&self) -> CartSnapshot {
        let state = self.state.read().await;
        Self::snapshot_of(&state)
    }

    fn snapshot_of(state: &CartState) -> CartSnapshot {
        CartSnapshot {
            items: state.cart.items().to_vec(),
            totals: state.cart.totals(),
            user_id: state.source.as_ref().and_then(Source::user_id).map(str::to_string),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds `quantity` units of `product`, incrementing an existing line.
    pub async fn add_item(&self, product: &Product, quantity: i64) -> StoreResult<()> {
        validate_quantity(quantity)?;
        let _ops = self.ops.lock().await;

        let (source, _) = self.sync_source().await?;
        match source.user_id() {
            None => {
                self.mutate_local(|cart| Ok(cart.add_item(product, quantity)?)).await
            }
            Some(user_id) => {
                // Reject an overflowing sum before it reaches the server
                self.state.read().await.cart.clone().add_item(product, quantity)?;

                debug!(user_id = %user_id, product_id = %product.id, quantity, "Adding to remote cart");
                let written = self.remote.add(user_id, &product.id, quantity).await;
                self.reload_after_write(&source, written).await
            }
        }
    }

    /// Sets a line's quantity. `quantity < 1` removes the line; an absent
    /// product is a no-op.
    pub async fn update_quantity(&self, product_id: &str, quantity: i64) -> StoreResult<()> {
        if quantity < 1 {
            return self.remove_item(product_id).await;
        }
        let _ops = self.ops.lock().await;

        let (source, _) = self.sync_source().await?;
        match source.user_id() {
            None => {
                self.mutate_local(|cart| {
                    cart.update_quantity(product_id, quantity);
                    Ok(())
                })
                .await
            }
            Some(user_id) => {
                let written = self.remote.set_quantity(user_id, product_id, quantity).await;
                self.reload_after_write(&source, written).await
            }
        }
    }

    /// Removes a line. Idempotent.
    pub async fn remove_item(&self, product_id: &str) -> StoreResult<()> {
        let _ops = self.ops.lock().await;

        let (source, _) = self.sync_source().await?;
        match source.user_id() {
            None => {
                self.mutate_local(|cart| {
                    cart.remove_item(product_id);
                    Ok(())
                })
                .await
            }
            Some(user_id) => {
                let written = self.remote.remove(user_id, product_id).await;
                self.reload_after_write(&source, written).await
            }
        }
    }

    /// Empties the cart and its backing storage.
    pub async fn clear_cart(&self) -> StoreResult<()> {
        let _ops = self.ops.lock().await;

        let (source, _) = self.sync_source().await?;
        match source.user_id() {
            None => {
                self.local.clear()?;
                self.replace(Cart::new(), Source::Local).await;
                info!("Cleared local cart");
                Ok(())
            }
            Some(user_id) => {
                let written = self.remote.clear(user_id).await;
                self.reload_after_write(&source, written).await?;
                info!(user_id = %user_id, "Cleared remote cart");
                Ok(())
            }
        }
    }

    /// Reloads from the authoritative source.
    pub async fn refresh(&self) -> StoreResult<()> {
        let _ops = self.ops.lock().await;
        let (source, reloaded) = self.sync_source().await?;
        if !reloaded {
            self.reload(&source).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Internals (callers hold `ops`)
    // =========================================================================

    async fn on_auth_event(&self, event: AuthEvent) -> StoreResult<()> {
        let _ops = self.ops.lock().await;
        debug!(event = ?event, "Auth state changed");

        // A token refresh keeps the source but still reloads
        let (source, reloaded) = self.sync_source().await?;
        if !reloaded {
            self.reload(&source).await?;
        }
        Ok(())
    }

    /// Makes the in-memory state follow the current auth state.
    ///
    /// Returns the current source and whether it was (re)loaded.
    async fn sync_source(&self) -> StoreResult<(Source, bool)> {
        let auth = self.session.current();
        let target = Source::for_state(&auth);
        let prev = self.state.read().await.source.clone();

        if prev.as_ref() == Some(&target) {
            return Ok((target, false));
        }

        info!(
            from = ?prev.as_ref().and_then(Source::user_id),
            to = ?target.user_id(),
            "Switching cart source"
        );

        if let Source::Remote(user_id) = &target {
            if let Err(e) = self.merge_local_into(user_id).await {
                error!(user_id = %user_id, error = %e, "Sign-in merge failed, will retry");
                self.set_state(Cart::new(), None).await;
                return Err(e);
            }
        }

        self.reload(&target).await?;
        Ok((target, true))
    }

    /// Folds the anonymous cart into `user_id`'s remote cart, then clears
    /// local storage. Local storage is kept if the merge fails.
    async fn merge_local_into(&self, user_id: &str) -> StoreResult<()> {
        let local = self.local.load()?;
        if local.is_empty() {
            return Ok(());
        }

        let lines: Vec<(String, i64)> = local
            .items()
            .iter()
            .map(|item| (item.product.id.clone(), item.quantity))
            .collect();

        self.remote.merge(user_id, &lines).await?;
        self.local.clear()?;

        info!(user_id = %user_id, lines = lines.len(), "Merged anonymous cart on sign-in");
        Ok(())
    }

    async fn reload(&self, source: &Source) -> StoreResult<()> {
        let loaded = match source {
            Source::Local => self.local.load(),
            Source::Remote(user_id) => self.remote.fetch(user_id).await.map(Cart::from_items),
        };

        match loaded {
            Ok(cart) => {
                debug!(user_id = ?source.user_id(), lines = cart.item_count(), "Cart reloaded");
                self.replace(cart, source.clone()).await;
                Ok(())
            }
            Err(e) => Err(self.degrade(source, e).await),
        }
    }

    /// Write-then-refetch for the remote cart.
    async fn reload_after_write(&self, source: &Source, written: StoreResult<()>) -> StoreResult<()> {
        match written {
            Ok(()) => self.reload(source).await,
            Err(e) => Err(self.degrade(source, e).await),
        }
    }

    async fn mutate_local<F>(&self, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Cart) -> StoreResult<()>,
    {
        let mut cart = self.state.read().await.cart.clone();
        f(&mut cart)?;
        self.local.save(&cart)?;
        self.replace(cart, Source::Local).await;
        Ok(())
    }

    /// Logs `err`, empties the in-memory cart and hands the error back.
    async fn degrade(&self, source: &Source, err: StoreError) -> StoreError {
        error!(user_id = ?source.user_id(), error = %err, "Cart source failed, showing empty cart");
        self.replace(Cart::new(), source.clone()).await;
        err
    }

    async fn replace(&self, cart: Cart, source: Source) {
        self.set_state(cart, Some(source)).await;
    }

    /// `source: None` marks the store unloaded, so the next operation
    /// re-runs source selection.
    async fn set_state(&self, cart: Cart, source: Option<Source>) {
        let snapshot = {
            let mut state = self.state.write().await;
            state.cart = cart;
            state.source = source;
            Self::snapshot_of(&state)
        };
        // No subscribers is fine
        let _ = self.updates.send(snapshot);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use medmart_db::DbError;

    use super::*;
    use crate::local::{LocalStorage, MemoryStorage};
    use crate::remote::DbRemoteCart;
    use crate::test_support::{self, Fixture};
    use medmart_core::LOCAL_CART_KEY;

    async fn anonymous_store(fx: &Fixture) -> (Arc<CartStore>, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = CartStore::new(
            LocalCart::new(storage.clone()),
            Arc::new(DbRemoteCart::new(fx.db.carts())),
            SessionHandle::new(),
        );
        (store, storage)
    }

    #[tokio::test]
    async fn test_anonymous_add_accumulates_and_persists() {
        let fx = test_support::fixture().await;
        let (store, storage) = anonymous_store(&fx).await;

        store.add_item(&fx.p1, 2).await.unwrap();
        store.add_item(&fx.p1, 3).await.unwrap();

        let items = store.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(store.total_items().await, 5);
        assert_eq!(store.subtotal().await.cents(), 500);

        let raw = storage.get(LOCAL_CART_KEY).unwrap().unwrap();
        let stored: Vec<CartItem> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored[0].quantity, 5);

        // Nothing touched the remote rows
        assert_eq!(fx.db.carts().count(&fx.buyer.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_quantity_zero_removes_and_remove_is_idempotent() {
        let fx = test_support::fixture().await;
        let (store, _) = anonymous_store(&fx).await;

        store.add_item(&fx.p1, 1).await.unwrap();
        store.add_item(&fx.p2, 1).await.unwrap();

        store.update_quantity(&fx.p1.id, 0).await.unwrap();
        let after_update = store.items().await;
        assert_eq!(after_update.len(), 1);

        store.remove_item(&fx.p1.id).await.unwrap();
        assert_eq!(store.items().await, after_update);

        store.update_quantity("not-in-cart", 4).await.unwrap();
        assert_eq!(store.items().await, after_update);

        assert!(store.add_item(&fx.p1, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_clear_cart_removes_storage_key() {
        let fx = test_support::fixture().await;
        let (store, storage) = anonymous_store(&fx).await;

        store.add_item(&fx.p1, 1).await.unwrap();
        store.clear_cart().await.unwrap();

        assert!(store.items().await.is_empty());
        assert_eq!(storage.get(LOCAL_CART_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_in_merges_local_cart() {
        let fx = test_support::fixture().await;
        let (store, storage) = anonymous_store(&fx).await;

        // Left over from an earlier session on another device
        fx.db.carts().add(&fx.buyer.id, &fx.p1.id, 1).await.unwrap();

        store.add_item(&fx.p1, 2).await.unwrap();
        store.add_item(&fx.p2, 1).await.unwrap();

        store.session().sign_in(test_support::session(&fx.buyer.id));
        store.refresh().await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.user_id.as_deref(), Some(fx.buyer.id.as_str()));
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.items[0].product.id, fx.p1.id);
        assert_eq!(snapshot.items[0].quantity, 3);
        assert_eq!(snapshot.items[1].quantity, 1);

        assert_eq!(storage.get(LOCAL_CART_KEY).unwrap(), None);
        assert_eq!(fx.db.carts().count(&fx.buyer.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_authenticated_mutations_write_then_refetch() {
        let fx = test_support::fixture().await;
        let (store, storage) = anonymous_store(&fx).await;
        store.session().sign_in(test_support::session(&fx.buyer.id));

        store.add_item(&fx.p1, 2).await.unwrap();
        assert_eq!(fx.db.carts().items(&fx.buyer.id).await.unwrap()[0].quantity, 2);

        // Another tab writes; the next refetch picks it up
        fx.db.carts().add(&fx.buyer.id, &fx.p2.id, 4).await.unwrap();
        store.update_quantity(&fx.p1.id, 5).await.unwrap();

        let items = store.items().await;
        assert_eq!(items.len(), 2);
        assert_eq!(store.total_items().await, 9);

        store.update_quantity(&fx.p2.id, 0).await.unwrap();
        assert_eq!(store.items().await.len(), 1);

        store.clear_cart().await.unwrap();
        assert!(store.items().await.is_empty());
        assert_eq!(fx.db.carts().count(&fx.buyer.id).await.unwrap(), 0);

        // Local storage was never used
        assert_eq!(storage.get(LOCAL_CART_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_sign_out_switches_back_to_local() {
        let fx = test_support::fixture().await;
        let (store, _) = anonymous_store(&fx).await;
        store.session().sign_in(test_support::session(&fx.buyer.id));
        store.add_item(&fx.p1, 1).await.unwrap();

        store.session().sign_out();
        store.refresh().await.unwrap();

        let snapshot = store.snapshot().await;
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.user_id, None);
        // Server cart persists across sessions
        assert_eq!(fx.db.carts().count(&fx.buyer.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_listener_reloads_on_auth_change() {
        let fx = test_support::fixture().await;
        fx.db.carts().add(&fx.buyer.id, &fx.p2.id, 3).await.unwrap();

        let (store, listener) = CartStore::start(
            LocalCart::in_memory(),
            Arc::new(DbRemoteCart::new(fx.db.carts())),
            SessionHandle::new(),
        )
        .await;
        let mut updates = store.subscribe();

        store.session().sign_in(test_support::session(&fx.buyer.id));

        let snapshot = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let snapshot = updates.recv().await.unwrap();
                if snapshot.user_id.is_some() {
                    break snapshot;
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(snapshot.totals.total_items, 3);
        assert_eq!(snapshot.totals.subtotal_cents, 3 * fx.p2.price_cents);

        drop(store);
        listener.abort();
    }

    struct DownRemote;

    #[async_trait]
    impl RemoteCart for DownRemote {
        async fn fetch(&self, _: &str) -> StoreResult<Vec<CartItem>> {
            Err(DbError::ConnectionFailed("backend unreachable".into()).into())
        }
        async fn add(&self, _: &str, _: &str, _: i64) -> StoreResult<()> {
            Err(DbError::ConnectionFailed("backend unreachable".into()).into())
        }
        async fn set_quantity(&self, _: &str, _: &str, _: i64) -> StoreResult<()> {
            Ok(())
        }
        async fn remove(&self, _: &str, _: &str) -> StoreResult<()> {
            Ok(())
        }
        async fn clear(&self, _: &str) -> StoreResult<()> {
            Ok(())
        }
        async fn merge(&self, _: &str, _: &[(String, i64)]) -> StoreResult<()> {
            Ok(())
        }
    }

    /// Backed by the real rows, but the first `fail_merges` merges fail.
    struct FlakyMergeRemote {
        inner: DbRemoteCart,
        fail_merges: std::sync::atomic::AtomicUsize,
    }

    impl FlakyMergeRemote {
        fn new(fx: &Fixture, fail_merges: usize) -> Self {
            FlakyMergeRemote {
                inner: DbRemoteCart::new(fx.db.carts()),
                fail_merges: std::sync::atomic::AtomicUsize::new(fail_merges),
            }
        }
    }

    #[async_trait]
    impl RemoteCart for FlakyMergeRemote {
        async fn fetch(&self, user_id: &str) -> StoreResult<Vec<CartItem>> {
            self.inner.fetch(user_id).await
        }
        async fn add(&self, user_id: &str, product_id: &str, quantity: i64) -> StoreResult<()> {
            self.inner.add(user_id, product_id, quantity).await
        }
        async fn set_quantity(&self, user_id: &str, product_id: &str, quantity: i64) -> StoreResult<()> {
            self.inner.set_quantity(user_id, product_id, quantity).await
        }
        async fn remove(&self, user_id: &str, product_id: &str) -> StoreResult<()> {
            self.inner.remove(user_id, product_id).await
        }
        async fn clear(&self, user_id: &str) -> StoreResult<()> {
            self.inner.clear(user_id).await
        }
        async fn merge(&self, user_id: &str, lines: &[(String, i64)]) -> StoreResult<()> {
            use std::sync::atomic::Ordering;
            let remaining = self.fail_merges.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_merges.store(remaining - 1, Ordering::SeqCst);
                return Err(DbError::ConnectionFailed("backend unreachable".into()).into());
            }
            self.inner.merge(user_id, lines).await
        }
    }

    #[tokio::test]
    async fn test_failed_sign_in_merge_is_retried() {
        let fx = test_support::fixture().await;
        let storage = Arc::new(MemoryStorage::new());
        let store = CartStore::new(
            LocalCart::new(storage.clone()),
            Arc::new(FlakyMergeRemote::new(&fx, 1)),
            SessionHandle::new(),
        );

        store.add_item(&fx.p1, 2).await.unwrap();
        store.session().sign_in(test_support::session(&fx.buyer.id));

        let err = store.refresh().await.unwrap_err();
        assert!(err.is_remote());
        assert!(store.items().await.is_empty());
        // Anonymous lines are still there to merge
        assert!(storage.get(LOCAL_CART_KEY).unwrap().is_some());

        store.refresh().await.unwrap();
        store.add_item(&fx.p2, 1).await.unwrap();

        let items = store.items().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product.id, fx.p1.id);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(storage.get(LOCAL_CART_KEY).unwrap(), None);
        assert_eq!(fx.db.carts().count(&fx.buyer.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_overflowing_add_is_rejected_before_writing() {
        let fx = test_support::fixture().await;
        let (store, _) = anonymous_store(&fx).await;

        store.add_item(&fx.p1, i64::MAX).await.unwrap();
        let err = store.add_item(&fx.p1, 1).await.unwrap_err();
        assert!(!err.is_remote());
        assert_eq!(store.items().await[0].quantity, i64::MAX);

        store.session().sign_in(test_support::session(&fx.buyer.id));
        store.add_item(&fx.p2, i64::MAX).await.unwrap();
        assert!(store.add_item(&fx.p2, 1).await.is_err());

        let remote = fx.db.carts().items(&fx.buyer.id).await.unwrap();
        let p2 = remote.iter().find(|i| i.product.id == fx.p2.id).unwrap();
        assert_eq!(p2.quantity, i64::MAX);
        assert_eq!(store.subtotal().await.cents(), i64::MAX);
    }

    #[tokio::test]
    async fn test_remote_failure_degrades_to_empty() {
        let session = SessionHandle::new();
        let store = CartStore::new(LocalCart::in_memory(), Arc::new(DownRemote), session.clone());
        let mut updates = store.subscribe();

        session.sign_in(test_support::session("u1"));

        let err = store.refresh().await.unwrap_err();
        assert!(err.is_remote());
        assert!(store.items().await.is_empty());
        assert!(updates.recv().await.unwrap().items.is_empty());

        let product = Product::new("p1", "s1", "SKU-1", "Gloves", 100);
        assert!(store.add_item(&product, 1).await.unwrap_err().is_remote());
        assert_eq!(store.snapshot().await.user_id.as_deref(), Some("u1"));
    }
}
