//! Product Reference Resolver
//!
//! Turns bare product identifiers into [`ProductSnapshot`]s. Resolution never
//! fails: anything the catalog cannot answer is replaced with a placeholder so
//! rendering and pricing can carry on.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::products::{ProductId, ProductRef, ProductSnapshot};

/// Errors returned by a product catalog lookup.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog has no product with this id.
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// The catalog answered with a record missing required fields.
    #[error("malformed catalog record for {0}: {1}")]
    Malformed(ProductId, String),

    /// The catalog could not be reached.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Product record as returned by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    /// Catalog identifier
    pub id: Option<ProductId>,

    /// Display name
    pub name: Option<String>,

    /// Selling price in minor units
    pub price: Option<u64>,

    /// Pre-discount price in minor units
    pub original_price: Option<u64>,

    /// Primary image
    pub image: Option<String>,

    /// Gallery images; the first is used when `image` is absent
    #[serde(default)]
    pub images: Vec<String>,

    /// Brand name
    pub brand: Option<String>,

    /// Category name
    pub category: Option<String>,
}

impl CatalogProduct {
    /// Convert the catalog record into a snapshot for the requested id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Malformed`] when the record has no name or
    /// belongs to a different product.
    pub fn into_snapshot(self, requested: &ProductId) -> Result<ProductSnapshot, CatalogError> {
        if let Some(id) = self.id.as_ref().filter(|id| *id != requested) {
            return Err(CatalogError::Malformed(
                requested.clone(),
                format!("record is for product {id}"),
            ));
        }

        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| CatalogError::Malformed(requested.clone(), "missing name".into()))?;

        let image = self
            .image
            .filter(|image| !image.is_empty())
            .or_else(|| self.images.into_iter().next())
            .unwrap_or_default();

        Ok(ProductSnapshot {
            id: requested.clone(),
            name,
            price: self.price.unwrap_or(0),
            original_price: self.original_price,
            image,
            brand: self.brand.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
        })
    }
}

/// Catalog lookup used by the resolver.
#[automock]
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch a single product record.
    async fn get_product(&self, id: &ProductId) -> Result<CatalogProduct, CatalogError>;
}

/// Resolves product ids against a catalog, falling back to placeholders.
#[derive(Clone)]
pub struct ProductResolver {
    catalog: Arc<dyn ProductCatalog>,
}

impl fmt::Debug for ProductResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductResolver").finish_non_exhaustive()
    }
}

impl ProductResolver {
    /// Create a resolver backed by the given catalog.
    #[must_use]
    pub fn new(catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { catalog }
    }

    /// Resolve a single id. Never fails.
    pub async fn resolve(&self, id: &ProductId) -> ProductSnapshot {
        let resolved = match self.catalog.get_product(id).await {
            Ok(record) => record.into_snapshot(id),
            Err(error) => Err(error),
        };

        resolved.unwrap_or_else(|error| {
            warn!(product = %id, %error, "product lookup failed; using placeholder");

            ProductSnapshot::placeholder(id)
        })
    }

    /// Start a resolution batch that looks each id up at most once.
    #[must_use]
    pub fn batch(&self) -> ResolutionBatch<'_> {
        ResolutionBatch {
            resolver: self,
            memo: FxHashMap::default(),
        }
    }

    /// Hydrate a list of references in one batch, preserving order.
    pub async fn hydrate_all(&self, refs: Vec<ProductRef>) -> Vec<ProductSnapshot> {
        let mut batch = self.batch();
        let mut snapshots = Vec::with_capacity(refs.len());

        for product in refs {
            snapshots.push(batch.hydrate(product).await);
        }

        snapshots
    }
}

/// Memoized resolution scope.
///
/// Every distinct id is looked up once per batch, however many entries
/// reference it.
#[derive(Debug)]
pub struct ResolutionBatch<'r> {
    resolver: &'r ProductResolver,
    memo: FxHashMap<ProductId, ProductSnapshot>,
}

impl ResolutionBatch<'_> {
    /// Resolve an id, reusing an earlier answer from this batch.
    pub async fn resolve(&mut self, id: &ProductId) -> ProductSnapshot {
        if let Some(snapshot) = self.memo.get(id) {
            debug!(product = %id, "resolved from batch memo");

            return snapshot.clone();
        }

        let snapshot = self.resolver.resolve(id).await;

        self.memo.insert(id.clone(), snapshot.clone());

        snapshot
    }

    /// Hydrate a reference: snapshots pass through, bare ids are resolved.
    pub async fn hydrate(&mut self, product: ProductRef) -> ProductSnapshot {
        match product {
            ProductRef::Snapshot(snapshot) => snapshot,
            ProductRef::Id(id) => self.resolve(&id).await,
        }
    }

    /// Number of distinct ids resolved so far.
    #[must_use]
    pub fn resolved(&self) -> usize {
        self.memo.len()
    }
}
