//! Remote commerce store contract

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cache::{CollectionKind, UserId},
    products::{ProductId, ProductRef},
};

/// Errors from the remote store. Never surfaced past a synchronizer.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The store could not be reached.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// The store answered but refused the request.
    #[error("remote store rejected request: {message}")]
    Rejected {
        /// HTTP status, when there was one
        status: Option<u16>,

        /// Message supplied by the store
        message: String,
    },

    /// Transport failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Collection entry as stored remotely; its product may be a bare id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    /// Product reference
    pub product: ProductRef,

    /// Units (cart only)
    #[serde(default)]
    pub quantity: Option<u32>,

    /// When the entry was created remotely
    #[serde(default)]
    pub added_at: Option<Timestamp>,
}

impl RemoteEntry {
    /// Entry referencing a product by id only.
    pub fn bare(id: impl Into<ProductId>, quantity: Option<u32>) -> Self {
        Self {
            product: ProductRef::Id(id.into()),
            quantity,
            added_at: None,
        }
    }
}

/// Canonical, persistent store for carts and wishlists.
#[automock]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read a user's collection.
    async fn fetch(
        &self,
        user: &UserId,
        kind: CollectionKind,
    ) -> Result<Vec<RemoteEntry>, RemoteError>;

    /// Add units of a product to a collection.
    async fn add(
        &self,
        user: &UserId,
        kind: CollectionKind,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), RemoteError>;

    /// Remove a product from a collection.
    async fn remove(
        &self,
        user: &UserId,
        kind: CollectionKind,
        product: &ProductId,
    ) -> Result<(), RemoteError>;

    /// Set the quantity of a cart line.
    async fn update_quantity(
        &self,
        user: &UserId,
        product: &ProductId,
        quantity: u32,
    ) -> Result<(), RemoteError>;

    /// Empty a collection.
    async fn clear(&self, user: &UserId, kind: CollectionKind) -> Result<(), RemoteError>;
}

/// Remote store for a device with no connectivity: every call is unavailable,
/// so synchronizers always take the local fallback path.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineStore;

impl OfflineStore {
    fn unavailable<T>() -> Result<T, RemoteError> {
        Err(RemoteError::Unavailable("offline".to_string()))
    }
}

#[async_trait]
impl RemoteStore for OfflineStore {
    async fn fetch(
        &self,
        _user: &UserId,
        _kind: CollectionKind,
    ) -> Result<Vec<RemoteEntry>, RemoteError> {
        Self::unavailable()
    }

    async fn add(
        &self,
        _user: &UserId,
        _kind: CollectionKind,
        _product: &ProductId,
        _quantity: u32,
    ) -> Result<(), RemoteError> {
        Self::unavailable()
    }

    async fn remove(
        &self,
        _user: &UserId,
        _kind: CollectionKind,
        _product: &ProductId,
    ) -> Result<(), RemoteError> {
        Self::unavailable()
    }

    async fn update_quantity(
        &self,
        _user: &UserId,
        _product: &ProductId,
        _quantity: u32,
    ) -> Result<(), RemoteError> {
        Self::unavailable()
    }

    async fn clear(&self, _user: &UserId, _kind: CollectionKind) -> Result<(), RemoteError> {
        Self::unavailable()
    }
}
