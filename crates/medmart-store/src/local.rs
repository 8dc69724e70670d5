//! # Local Storage
//!
//! A small string key/value store standing in for browser local storage,
//! and the anonymous cart kept in it.
//!
//! ## File Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  local_storage.json                                                     │
//! │  {                                                                      │
//! │    "cart": "[{\"product\":{...},\"quantity\":2}]"                       │
//! │  }                                                                      │
//! │                                                                         │
//! │  set(k, v) → read map → insert → write local_storage.json.tmp → rename  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Values are opaque strings, exactly like the browser API. The cart is
//! stored under [`LOCAL_CART_KEY`] as a JSON array of cart items.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use medmart_core::{Cart, CartItem, LOCAL_CART_KEY};

use crate::error::StoreResult;

/// String key/value storage.
pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Removes every key.
    fn clear(&self) -> StoreResult<()>;
}

// =============================================================================
// File Storage
// =============================================================================

/// JSON-file backed storage. Every write replaces the file atomically.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStorage {
    /// Opens (or lazily creates) storage at `path`.
    ///
    /// The parent directory is created if missing; the file itself is only
    /// written on the first `set`.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        debug!(path = %path.display(), "Opened local storage");
        Ok(FileStorage {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> StoreResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> StoreResult<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut map = self.read_map()?;
        f(&mut map);
        self.write_map(&map)
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.update(|map| {
            map.remove(key);
        })
    }

    fn clear(&self) -> StoreResult<()> {
        self.update(|map| map.clear())
    }
}

// =============================================================================
// Memory Storage
// =============================================================================

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_map<T>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> T) -> T {
        let mut map = self.map.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut map)
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.with_map(|map| map.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.with_map(|map| map.insert(key.to_string(), value.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.with_map(|map| map.remove(key));
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        self.with_map(|map| map.clear());
        Ok(())
    }
}

// =============================================================================
// Local Cart
// =============================================================================

/// The anonymous cart, persisted under the `"cart"` key.
#[derive(Clone)]
pub struct LocalCart {
    storage: Arc<dyn LocalStorage>,
}

impl LocalCart {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        LocalCart { storage }
    }

    /// Ephemeral cart backed by [`MemoryStorage`].
    pub fn in_memory() -> Self {
        LocalCart::new(Arc::new(MemoryStorage::new()))
    }

    /// Reads the stored cart.
    ///
    /// A missing key is an empty cart. Unreadable contents are logged and
    /// treated as empty so a corrupt entry never blocks the storefront.
    pub fn load(&self) -> StoreResult<Cart> {
        let Some(raw) = self.storage.get(LOCAL_CART_KEY)? else {
            return Ok(Cart::new());
        };

        match serde_json::from_str::<Vec<CartItem>>(&raw) {
            Ok(items) => Ok(Cart::from_items(items)),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable local cart");
                Ok(Cart::new())
            }
        }
    }

    /// Overwrites the stored cart with `cart`.
    pub fn save(&self, cart: &Cart) -> StoreResult<()> {
        let json = serde_json::to_string(cart)?;
        self.storage.set(LOCAL_CART_KEY, &json)?;
        debug!(lines = cart.item_count(), "Saved local cart");
        Ok(())
    }

    /// Deletes the stored cart.
    pub fn clear(&self) -> StoreResult<()> {
        self.storage.remove(LOCAL_CART_KEY)
    }
}

impl std::fmt::Debug for LocalCart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCart").finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
