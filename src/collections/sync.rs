//! Commerce Collection Synchronizer
//!
//! Keeps one user's cart or wishlist consistent between the remote store and
//! the local fallback cache. Every mutation is tried remotely first and then
//! re-read from the remote store; any remote failure switches to the local
//! strategy, which applies the same rules against the cache.

use std::{fmt, sync::Arc};

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    cache::{CacheError, LocalCache, UserId},
    pricing::money,
    products::{ImagePolicy, ProductId, ProductRef},
    resolver::ProductResolver,
};

use super::{
    entries::{CartEntry, CollectionEntry, WishlistEntry},
    mutations,
    remote::{RemoteEntry, RemoteError, RemoteStore},
};

/// Errors surfaced by a synchronizer.
///
/// Remote failures are absorbed; only a failing fallback path reaches callers.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local fallback cache could not be read or written.
    #[error("collection sync failed: {0}")]
    Fallback(#[from] CacheError),
}

/// Collection state exposed to the view layer.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionState<E> {
    items: Vec<E>,
    loading: bool,
    error: Option<String>,
}

impl<E> Default for CollectionState<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl<E: CollectionEntry> CollectionState<E> {
    /// Current entries.
    #[must_use]
    pub fn items(&self) -> &[E] {
        &self.items
    }

    /// Whether an operation is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed operation, cleared by the next success.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Sum of entry quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items
            .iter()
            .map(|entry| u64::from(entry.quantity()))
            .sum()
    }

    /// Sum of price × quantity over all entries.
    #[must_use]
    pub fn total_amount(&self) -> Money<'static, Currency> {
        let minor = self.items.iter().fold(0_u64, |acc, entry| {
            acc.saturating_add(
                entry
                    .product()
                    .price
                    .saturating_mul(u64::from(entry.quantity())),
            )
        });

        money(minor)
    }

    /// Whether the collection has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Requested change to a collection.
#[derive(Debug, Clone)]
enum Mutation {
    Fetch,
    Add { product: ProductRef, quantity: u32 },
    Remove(ProductId),
    Update { product: ProductId, quantity: u32 },
    Clear,
}

impl Mutation {
    const fn name(&self) -> &'static str {
        match self {
            Mutation::Fetch => "fetch",
            Mutation::Add { .. } => "add",
            Mutation::Remove(_) => "remove",
            Mutation::Update { .. } => "update",
            Mutation::Clear => "clear",
        }
    }
}

/// Synchronizer for one user's collection of `E` entries.
pub struct CollectionSynchronizer<E: CollectionEntry> {
    user: UserId,
    remote: Arc<dyn RemoteStore>,
    cache: LocalCache,
    resolver: ProductResolver,
    images: ImagePolicy,
    state: CollectionState<E>,
}

/// Cart synchronizer.
pub type CartSynchronizer = CollectionSynchronizer<CartEntry>;

/// Wishlist synchronizer.
pub type WishlistSynchronizer = CollectionSynchronizer<WishlistEntry>;

impl<E: CollectionEntry> fmt::Debug for CollectionSynchronizer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionSynchronizer")
            .field("kind", &E::KIND)
            .field("user", &self.user)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<E: CollectionEntry> CollectionSynchronizer<E> {
    /// Create a synchronizer for `user`. State starts empty until [`fetch`](Self::fetch).
    #[must_use]
    pub fn new(
        user: UserId,
        remote: Arc<dyn RemoteStore>,
        cache: LocalCache,
        resolver: ProductResolver,
        images: ImagePolicy,
    ) -> Self {
        Self {
            user,
            remote,
            cache,
            resolver,
            images,
            state: CollectionState::default(),
        }
    }

    /// Identity owning this collection.
    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &CollectionState<E> {
        &self.state
    }

    /// Load the collection.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fallback`] when the remote store is unreachable and
    /// the local cache cannot be read.
    pub async fn fetch(&mut self) -> Result<&CollectionState<E>, SyncError> {
        self.apply(Mutation::Fetch).await
    }

    /// Remove a product. Removing a product that is not present is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fallback`] when the fallback path fails.
    pub async fn remove(&mut self, product: &ProductId) -> Result<&CollectionState<E>, SyncError> {
        self.apply(Mutation::Remove(product.clone())).await
    }

    /// Empty the collection remotely and locally.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fallback`] when the fallback path fails.
    pub async fn clear(&mut self) -> Result<&CollectionState<E>, SyncError> {
        self.apply(Mutation::Clear).await
    }

    async fn add_units(
        &mut self,
        product: ProductRef,
        quantity: u32,
    ) -> Result<&CollectionState<E>, SyncError> {
        if quantity == 0 {
            debug!(product = %product.id(), "ignoring add of zero units");

            return Ok(&self.state);
        }

        self.apply(Mutation::Add { product, quantity }).await
    }

    async fn apply(&mut self, mutation: Mutation) -> Result<&CollectionState<E>, SyncError> {
        let operation = mutation.name();

        self.state.loading = true;

        let outcome = match self.apply_remote(&mutation).await {
            Ok(items) => Ok(items),
            Err(remote_error) => {
                warn!(
                    user = %self.user,
                    collection = %E::KIND,
                    operation,
                    error = %remote_error,
                    "remote store failed; falling back to local cache"
                );

                self.apply_local(mutation).await
            }
        };

        self.state.loading = false;

        match outcome {
            Ok(items) => {
                self.state.items = items;
                self.state.error = None;

                Ok(&self.state)
            }
            Err(cache_error) => {
                error!(
                    user = %self.user,
                    collection = %E::KIND,
                    operation,
                    error = %cache_error,
                    "local fallback failed"
                );

                let error = SyncError::from(cache_error);

                self.state.error = Some(error.to_string());

                Err(error)
            }
        }
    }

    async fn apply_remote(&self, mutation: &Mutation) -> Result<Vec<E>, RemoteError> {
        let kind = E::KIND;
        let user = &self.user;

        match mutation {
            Mutation::Fetch => {}
            Mutation::Add { product, quantity } => {
                self.remote.add(user, kind, product.id(), *quantity).await?;
            }
            Mutation::Remove(product) => self.remote.remove(user, kind, product).await?,
            Mutation::Update { product, quantity } => {
                self.remote.update_quantity(user, product, *quantity).await?;
            }
            Mutation::Clear => self.remote.clear(user, kind).await?,
        }

        let entries = self.remote.fetch(user, kind).await?;
        let items = self.hydrate(entries).await;

        if let Err(cache_error) = self.cache.save(user, kind, &items) {
            warn!(
                %user,
                collection = %kind,
                error = %cache_error,
                "failed to mirror remote state into local cache"
            );
        }

        info!(
            %user,
            collection = %kind,
            operation = mutation.name(),
            len = items.len(),
            "synced with remote store"
        );

        Ok(items)
    }

    async fn apply_local(&self, mutation: Mutation) -> Result<Vec<E>, CacheError> {
        let kind = E::KIND;
        let mut items: Vec<E> = self.cache.load(&self.user, kind)?;

        match mutation {
            Mutation::Fetch => return Ok(items),
            Mutation::Add { product, quantity } => {
                let snapshot = match mutations::find(&items, product.id()) {
                    Some(existing) => existing.product().clone(),
                    None => {
                        let mut snapshot = self.resolver.batch().hydrate(product).await;

                        self.images.apply(&mut snapshot);

                        snapshot
                    }
                };

                mutations::add(&mut items, snapshot, quantity, Timestamp::now());
            }
            Mutation::Remove(product) => {
                mutations::remove(&mut items, &product);
            }
            Mutation::Update { product, quantity } => {
                mutations::update(&mut items, &product, quantity);
            }
            Mutation::Clear => items.clear(),
        }

        self.cache.save(&self.user, kind, &items)?;

        debug!(
            user = %self.user,
            collection = %kind,
            len = items.len(),
            "applied mutation to local cache"
        );

        Ok(items)
    }

    /// Turn remote entries into exposed entries: hydrate bare ids in one batch,
    /// normalize images and fold duplicate products together.
    async fn hydrate(&self, entries: Vec<RemoteEntry>) -> Vec<E> {
        let mut batch = self.resolver.batch();
        let mut items = Vec::with_capacity(entries.len());

        for entry in entries {
            let quantity = entry.quantity.unwrap_or(1);
            let added_at = entry.added_at.unwrap_or_else(Timestamp::now);
            let mut product = batch.hydrate(entry.product).await;

            self.images.apply(&mut product);

            mutations::add(&mut items, product, quantity, added_at);
        }

        items
    }
}

impl CollectionSynchronizer<CartEntry> {
    /// Add units of a product, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fallback`] when the fallback path fails.
    pub async fn add(
        &mut self,
        product: impl Into<ProductRef>,
        quantity: u32,
    ) -> Result<&CollectionState<CartEntry>, SyncError> {
        self.add_units(product.into(), quantity).await
    }

    /// Set a line's quantity. Quantities below one remove the line.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fallback`] when the fallback path fails.
    pub async fn update(
        &mut self,
        product: &ProductId,
        quantity: u32,
    ) -> Result<&CollectionState<CartEntry>, SyncError> {
        if quantity < 1 {
            return self.remove(product).await;
        }

        self.apply(Mutation::Update {
            product: product.clone(),
            quantity,
        })
        .await
    }
}

impl CollectionSynchronizer<WishlistEntry> {
    /// Wishlist a product. Already wishlisted products are left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fallback`] when the fallback path fails.
    pub async fn add(
        &mut self,
        product: impl Into<ProductRef>,
    ) -> Result<&CollectionState<WishlistEntry>, SyncError> {
        self.add_units(product.into(), 1).await
    }

    /// Whether a product is wishlisted.
    #[must_use]
    pub fn contains(&self, product: &ProductId) -> bool {
        mutations::find(self.state.items(), product).is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::{
        cache::CollectionKind,
        collections::remote::MockRemoteStore,
        products::{PLACEHOLDER_IMAGE, ProductSnapshot},
        resolver::{CatalogProduct, MockProductCatalog},
        storage::{KeyValueStore, MemoryStore, StorageError},
    };

    use super::*;

    fn catalog() -> MockProductCatalog {
        let mut catalog = MockProductCatalog::new();

        catalog.expect_get_product().returning(|id| {
            Ok(CatalogProduct {
                name: Some(format!("Name of {id}")),
                price: Some(10_00),
                image: Some(format!("/img/{id}.jpg")),
                category: Some("tops".to_string()),
                ..CatalogProduct::default()
            })
        });

        catalog
    }

    fn cart(remote: MockRemoteStore, store: Arc<dyn KeyValueStore>) -> CartSynchronizer {
        CartSynchronizer::new(
            UserId::new("u-1"),
            Arc::new(remote),
            LocalCache::new(store),
            ProductResolver::new(Arc::new(catalog())),
            ImagePolicy::new("https://cdn.example.com", PLACEHOLDER_IMAGE),
        )
    }

    fn offline_remote() -> MockRemoteStore {
        let mut remote = MockRemoteStore::new();

        remote
            .expect_fetch()
            .returning(|_, _| Err(RemoteError::Unavailable("down".into())));
        remote
            .expect_add()
            .returning(|_, _, _, _| Err(RemoteError::Unavailable("down".into())));
        remote
            .expect_remove()
            .returning(|_, _, _| Err(RemoteError::Unavailable("down".into())));
        remote
            .expect_update_quantity()
            .returning(|_, _, _| Err(RemoteError::Unavailable("down".into())));
        remote
            .expect_clear()
            .returning(|_, _| Err(RemoteError::Unavailable("down".into())));

        remote
    }

    #[tokio::test]
    async fn fetch_hydrates_bare_ids_and_normalizes_images() -> TestResult {
        let mut remote = MockRemoteStore::new();

        remote
            .expect_fetch()
            .with(eq(UserId::new("u-1")), eq(CollectionKind::Cart))
            .once()
            .returning(|_, _| {
                Ok(vec![
                    RemoteEntry::bare("p-1", Some(2)),
                    RemoteEntry::bare("p-2", Some(1)),
                ])
            });

        let mut cart = cart(remote, Arc::new(MemoryStore::new()));
        let state = cart.fetch().await?;

        assert_eq!(state.items().len(), 2);

        for entry in state.items() {
            assert!(entry.product.name.starts_with("Name of"));
            assert!(entry.product.image.starts_with("https://cdn.example.com/img/"));
        }

        assert_eq!(state.total_items(), 3);
        assert_eq!(state.total_amount(), money(30_00));

        Ok(())
    }

    #[tokio::test]
    async fn remote_duplicates_are_folded_together() -> TestResult {
        let mut remote = MockRemoteStore::new();

        remote.expect_fetch().returning(|_, _| {
            Ok(vec![
                RemoteEntry::bare("p-1", Some(2)),
                RemoteEntry::bare("p-1", Some(1)),
            ])
        });

        let mut cart = cart(remote, Arc::new(MemoryStore::new()));
        let state = cart.fetch().await?;

        assert_eq!(state.items().len(), 1);
        assert_eq!(state.total_items(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn successful_mutation_refetches_and_mirrors_into_cache() -> TestResult {
        let mut remote = MockRemoteStore::new();

        remote
            .expect_add()
            .with(
                eq(UserId::new("u-1")),
                eq(CollectionKind::Cart),
                eq(ProductId::new("p-1")),
                eq(2),
            )
            .once()
            .returning(|_, _, _, _| Ok(()));
        remote
            .expect_fetch()
            .once()
            .returning(|_, _| Ok(vec![RemoteEntry::bare("p-1", Some(2))]));

        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut cart = cart(remote, store.clone());

        cart.add(ProductId::new("p-1"), 2).await?;

        let cached: Vec<CartEntry> =
            LocalCache::new(store).load(&UserId::new("u-1"), CollectionKind::Cart)?;

        assert_eq!(cached, cart.state().items());

        Ok(())
    }

    #[tokio::test]
    async fn fallback_merges_repeated_adds() -> TestResult {
        let mut cart = cart(offline_remote(), Arc::new(MemoryStore::new()));

        cart.add(ProductId::new("p-1"), 1).await?;
        let state = cart.add(ProductId::new("p-1"), 2).await?;

        assert_eq!(state.items().len(), 1);
        assert_eq!(state.total_items(), 3);
        assert!(state.error().is_none());
        assert!(!state.is_loading());

        Ok(())
    }

    #[tokio::test]
    async fn fallback_update_and_remove() -> TestResult {
        let mut cart = cart(offline_remote(), Arc::new(MemoryStore::new()));

        cart.add(ProductId::new("p-1"), 1).await?;
        cart.add(ProductId::new("p-2"), 1).await?;

        assert_eq!(cart.update(&ProductId::new("p-1"), 5).await?.total_items(), 6);
        assert_eq!(cart.update(&ProductId::new("p-2"), 0).await?.items().len(), 1);
        assert_eq!(cart.remove(&ProductId::new("p-404")).await?.items().len(), 1);
        assert!(cart.clear().await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn add_of_zero_units_touches_nothing() -> TestResult {
        let mut remote = MockRemoteStore::new();

        remote.expect_add().never();
        remote.expect_fetch().never();

        let mut cart = cart(remote, Arc::new(MemoryStore::new()));

        assert!(cart.add(ProductId::new("p-1"), 0).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn snapshot_adds_skip_the_catalog() -> TestResult {
        let mut catalog = MockProductCatalog::new();

        catalog.expect_get_product().never();

        let mut cart = CartSynchronizer::new(
            UserId::guest(),
            Arc::new(offline_remote()),
            LocalCache::new(Arc::new(MemoryStore::new())),
            ProductResolver::new(Arc::new(catalog)),
            ImagePolicy::default(),
        );

        let snapshot = ProductSnapshot {
            price: 42_00,
            ..ProductSnapshot::placeholder(&ProductId::new("p-7"))
        };

        let state = cart.add(snapshot, 1).await?;

        assert_eq!(state.total_amount(), money(42_00));

        Ok(())
    }

    /// Memory store whose writes and reads can be broken mid-test.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: AtomicBool,
        corrupt_reads: AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.corrupt_reads.load(Ordering::SeqCst) {
                return Ok(Some("{not json".to_string()));
            }

            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Poisoned);
            }

            self.inner.set(key, value)
        }
    }

    #[tokio::test]
    async fn failing_fallback_write_keeps_previous_items() -> TestResult {
        let store = Arc::new(FlakyStore::default());
        let mut cart = cart(offline_remote(), store.clone());

        cart.add(ProductId::new("p-1"), 2).await?;

        let before = cart.state().items().to_vec();

        store.fail_writes.store(true, Ordering::SeqCst);

        let added = cart.add(ProductId::new("p-2"), 1).await;

        assert!(
            matches!(added, Err(SyncError::Fallback(CacheError::Storage(_)))),
            "expected Fallback, got {added:?}"
        );
        assert_eq!(cart.state().items(), before.as_slice());
        assert_eq!(cart.state().total_items(), 2);
        assert!(cart.state().error().is_some());
        assert!(!cart.state().is_loading());

        let updated = cart.update(&ProductId::new("p-1"), 5).await;

        assert!(
            matches!(updated, Err(SyncError::Fallback(_))),
            "expected Fallback, got {updated:?}"
        );
        assert_eq!(cart.state().items(), before.as_slice());

        store.fail_writes.store(false, Ordering::SeqCst);

        cart.add(ProductId::new("p-2"), 1).await?;

        assert_eq!(cart.state().items().len(), 2);
        assert!(cart.state().error().is_none());

        Ok(())
    }

    #[tokio::test]
    async fn corrupt_cache_keeps_previous_items() -> TestResult {
        let store = Arc::new(FlakyStore::default());
        let mut cart = cart(offline_remote(), store.clone());

        cart.add(ProductId::new("p-1"), 3).await?;

        let before = cart.state().items().to_vec();

        store.corrupt_reads.store(true, Ordering::SeqCst);

        let fetched = cart.fetch().await;

        assert!(
            matches!(fetched, Err(SyncError::Fallback(CacheError::Corrupt { .. }))),
            "expected corrupt cache, got {fetched:?}"
        );
        assert_eq!(cart.state().items(), before.as_slice());
        assert!(cart.state().error().is_some());

        let removed = cart.remove(&ProductId::new("p-1")).await;

        assert!(
            matches!(removed, Err(SyncError::Fallback(CacheError::Corrupt { .. }))),
            "expected corrupt cache, got {removed:?}"
        );
        assert_eq!(cart.state().total_items(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn wishlist_add_is_set_like() -> TestResult {
        let mut wishlist = WishlistSynchronizer::new(
            UserId::new("u-1"),
            Arc::new(offline_remote()),
            LocalCache::new(Arc::new(MemoryStore::new())),
            ProductResolver::new(Arc::new(catalog())),
            ImagePolicy::default(),
        );

        wishlist.add(ProductId::new("p-1")).await?;
        wishlist.add(ProductId::new("p-1")).await?;

        assert_eq!(wishlist.state().items().len(), 1);
        assert_eq!(wishlist.state().total_items(), 1);
        assert!(wishlist.contains(&ProductId::new("p-1")));

        Ok(())
    }
}
