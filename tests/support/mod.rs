//! Shared collaborators for the integration tests.

#![expect(dead_code, reason = "each test binary uses a different subset")]

use std::{
    path::Path,
    sync::{
        Arc, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use jiff::Timestamp;
use rustc_hash::FxHashMap;

use boutique::{
    cache::{CollectionKind, LocalCache, UserId},
    collections::{RemoteEntry, RemoteError, RemoteStore},
    context::StoreContext,
    fixtures::{DEFAULT_SET, FixtureCatalog, FixtureError},
    orders::ShippingAddress,
    products::ProductId,
    storage::{KeyValueStore, MemoryStore, StorageError},
};

/// Fixed clock for deterministic coupon windows and order dates.
pub fn now() -> Timestamp {
    Timestamp::from_second(1_772_323_200).unwrap_or(Timestamp::UNIX_EPOCH)
}

/// The bundled storefront catalog and coupon book.
pub fn storefront() -> Result<FixtureCatalog, FixtureError> {
    FixtureCatalog::from_set(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures"),
        DEFAULT_SET,
    )
}

/// A fully filled-in shipping address.
pub fn shipping() -> ShippingAddress {
    ShippingAddress {
        full_name: "Ana Lima".to_string(),
        address: "12 Harbour Road".to_string(),
        city: "Porto".to_string(),
        postal_code: "4000-123".to_string(),
        phone: "+351 910 000 000".to_string(),
        country: "Portugal".to_string(),
    }
}

/// Context over the storefront fixtures with the given remote and storage.
pub fn context(
    remote: Arc<dyn RemoteStore>,
    store: Arc<dyn KeyValueStore>,
) -> Result<StoreContext, FixtureError> {
    let catalog = Arc::new(storefront()?);

    Ok(StoreContext::new(remote, catalog.clone(), catalog, store))
}

/// A stateful remote store holding bare product ids, like a real API would.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    collections: RwLock<FxHashMap<String, Vec<RemoteEntry>>>,
    offline: AtomicBool,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as unreachable, or recover.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// `(product, quantity)` pairs currently stored remotely.
    pub fn lines(&self, user: &UserId, kind: CollectionKind) -> Vec<(String, u32)> {
        self.collections
            .read()
            .map(|collections| {
                collections
                    .get(&LocalCache::key(user, kind))
                    .map(|entries| {
                        entries
                            .iter()
                            .map(|entry| {
                                (
                                    entry.product.id().to_string(),
                                    entry.quantity.unwrap_or(1),
                                )
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn with_collection<T>(
        &self,
        user: &UserId,
        kind: CollectionKind,
        f: impl FnOnce(&mut Vec<RemoteEntry>) -> T,
    ) -> Result<T, RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("connection refused".to_string()));
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|_poisoned| RemoteError::Unavailable("poisoned".to_string()))?;

        Ok(f(collections
            .entry(LocalCache::key(user, kind))
            .or_default()))
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn fetch(
        &self,
        user: &UserId,
        kind: CollectionKind,
    ) -> Result<Vec<RemoteEntry>, RemoteError> {
        self.with_collection(user, kind, |entries| entries.clone())
    }

    async fn add(
        &self,
        user: &UserId,
        kind: CollectionKind,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), RemoteError> {
        self.with_collection(user, kind, |entries| {
            match entries
                .iter_mut()
                .find(|entry| entry.product.id() == product)
            {
                Some(entry) if kind == CollectionKind::Cart => {
                    entry.quantity = Some(entry.quantity.unwrap_or(1).saturating_add(quantity));
                }
                Some(_) => {}
                None => {
                    let mut entry = RemoteEntry::bare(product.clone(), Some(quantity));

                    entry.added_at = Some(now());
                    entries.push(entry);
                }
            }
        })
    }

    async fn remove(
        &self,
        user: &UserId,
        kind: CollectionKind,
        product: &ProductId,
    ) -> Result<(), RemoteError> {
        self.with_collection(user, kind, |entries| {
            entries.retain(|entry| entry.product.id() != product);
        })
    }

    async fn update_quantity(
        &self,
        user: &UserId,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), RemoteError> {
        self.with_collection(user, CollectionKind::Cart, |entries| {
            if let Some(entry) = entries
                .iter_mut()
                .find(|entry| entry.product.id() == product)
            {
                entry.quantity = Some(quantity);
            }
        })
    }

    async fn clear(&self, user: &UserId, kind: CollectionKind) -> Result<(), RemoteError> {
        self.with_collection(user, kind, Vec::clear)
    }
}

/// Memory store that refuses writes to keys with a given prefix.
#[derive(Debug)]
pub struct ReadOnlyPrefix {
    inner: MemoryStore,
    prefix: &'static str,
}

impl ReadOnlyPrefix {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            inner: MemoryStore::new(),
            prefix,
        }
    }
}

impl KeyValueStore for ReadOnlyPrefix {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if key.starts_with(self.prefix) {
            return Err(StorageError::Io {
                key: key.to_string(),
                source: std::io::Error::other("disk full"),
            });
        }

        self.inner.set(key, value)
    }
}
