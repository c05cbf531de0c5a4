//! Store Context
//!
//! Wires the collaborators of the engine together once so callers can hand
//! out synchronizers, an order assembler and the order history per user.

use std::{fmt, sync::Arc};

use thiserror::Error;
use tracing::info;

use crate::{
    cache::{LocalCache, UserId},
    collections::{
        CartSynchronizer, OfflineStore, RemoteError, RemoteStore, WishlistSynchronizer,
    },
    config::StorefrontConfig,
    coupons::CouponService,
    fixtures::{FixtureCatalog, FixtureError},
    http::HttpCommerceClient,
    orders::{OrderAssembler, OrderHistory},
    pricing::PricingPolicy,
    products::ImagePolicy,
    resolver::{ProductCatalog, ProductResolver},
    storage::{FileStore, KeyValueStore, StorageError},
};

/// Errors raised while building a [`StoreContext`].
#[derive(Debug, Error)]
pub enum ContextError {
    /// The local data directory could not be opened.
    #[error("failed to open local storage: {0}")]
    Storage(#[from] StorageError),

    /// Offline fixtures could not be loaded.
    #[error("failed to load fixtures: {0}")]
    Fixtures(#[from] FixtureError),

    /// The HTTP client could not be configured.
    #[error("failed to configure commerce API client: {0}")]
    Remote(#[from] RemoteError),
}

/// Shared collaborators of the commerce engine.
#[derive(Clone)]
pub struct StoreContext {
    /// Canonical cart and wishlist store
    pub remote: Arc<dyn RemoteStore>,

    /// Product lookups for hydration
    pub catalog: Arc<dyn ProductCatalog>,

    /// Coupon validation and redemption
    pub coupons: Arc<dyn CouponService>,

    /// Local fallback cache and order history
    pub cache: LocalCache,

    /// Image normalization rules
    pub images: ImagePolicy,

    /// Tax and shipping rules
    pub policy: PricingPolicy,
}

impl fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreContext")
            .field("images", &self.images)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl StoreContext {
    /// Context over explicit collaborators with default image and pricing rules.
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        catalog: Arc<dyn ProductCatalog>,
        coupons: Arc<dyn CouponService>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            remote,
            catalog,
            coupons,
            cache: LocalCache::new(store),
            images: ImagePolicy::default(),
            policy: PricingPolicy::default(),
        }
    }

    /// Build a context from configuration.
    ///
    /// With an API base URL every collaborator talks to the HTTP API.
    /// Without one the remote store is always unavailable, so collections
    /// live in the local cache, and the catalog and coupons come from fixtures.
    ///
    /// # Errors
    ///
    /// Returns an error when the data directory, fixtures or HTTP client
    /// cannot be set up.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, ContextError> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.storage.data_dir)?);

        let mut context = match config.remote.api_base_url.as_deref() {
            Some(base_url) if !config.remote.is_offline() => {
                let client = Arc::new(HttpCommerceClient::new(
                    base_url,
                    config.remote.timeout(),
                )?);

                info!(%base_url, "using remote commerce API");

                Self::new(client.clone(), client.clone(), client, store)
            }
            _ => {
                let fixtures = Arc::new(FixtureCatalog::from_set(
                    &config.storage.fixtures_dir,
                    &config.storage.fixture_set,
                )?);

                info!(
                    fixtures = %config.storage.fixtures_dir.display(),
                    set = %config.storage.fixture_set,
                    "running offline"
                );

                Self::new(Arc::new(OfflineStore), fixtures.clone(), fixtures, store)
            }
        };

        context.images = config.images.policy();
        context.policy = config.pricing.policy();

        Ok(context)
    }

    /// Replace the image rules.
    #[must_use]
    pub fn with_images(mut self, images: ImagePolicy) -> Self {
        self.images = images;

        self
    }

    /// Replace the pricing rules.
    #[must_use]
    pub fn with_policy(mut self, policy: PricingPolicy) -> Self {
        self.policy = policy;

        self
    }

    /// Resolver over the context's catalog.
    #[must_use]
    pub fn resolver(&self) -> ProductResolver {
        ProductResolver::new(Arc::clone(&self.catalog))
    }

    /// Cart synchronizer for `user`. Call `fetch` before reading its state.
    #[must_use]
    pub fn cart(&self, user: &UserId) -> CartSynchronizer {
        CartSynchronizer::new(
            user.clone(),
            Arc::clone(&self.remote),
            self.cache.clone(),
            self.resolver(),
            self.images.clone(),
        )
    }

    /// Wishlist synchronizer for `user`. Call `fetch` before reading its state.
    #[must_use]
    pub fn wishlist(&self, user: &UserId) -> WishlistSynchronizer {
        WishlistSynchronizer::new(
            user.clone(),
            Arc::clone(&self.remote),
            self.cache.clone(),
            self.resolver(),
            self.images.clone(),
        )
    }

    /// Order assembler using the context's pricing rules.
    #[must_use]
    pub fn assembler(&self) -> OrderAssembler {
        OrderAssembler::new(self.cache.clone(), Arc::clone(&self.coupons)).with_policy(self.policy)
    }

    /// Order history reader.
    #[must_use]
    pub fn history(&self) -> OrderHistory {
        OrderHistory::new(self.cache.clone())
    }
}
