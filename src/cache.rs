//! Local Fallback Cache
//!
//! Per-user, per-collection JSON lists on top of a [`KeyValueStore`]. Used by
//! the synchronizers when the remote store is unreachable and as the system of
//! record for order history.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

use crate::storage::{KeyValueStore, StorageError};

const GUEST: &str = "guest";

/// Identity owning a cart, wishlist and order history.
///
/// The guest identity is distinct from every signed-in id, including one
/// spelled `guest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub struct UserId(Option<String>);

impl UserId {
    /// Identity of a signed-in user. Blank ids fall back to the guest identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self::from(Some(id.into()))
    }

    /// Identity used while nobody is signed in.
    #[must_use]
    pub fn guest() -> Self {
        Self(None)
    }

    /// Whether this is the guest identity.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0.is_none()
    }

    /// Borrow the raw identifier, `guest` for the guest identity.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_deref().unwrap_or(GUEST)
    }
}

impl From<Option<String>> for UserId {
    fn from(id: Option<String>) -> Self {
        Self(id.filter(|id| !id.trim().is_empty()))
    }
}

impl From<UserId> for Option<String> {
    fn from(user: UserId) -> Self {
        user.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collections kept per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Shopping cart
    Cart,

    /// Wishlist
    Wishlist,

    /// Order history
    Orders,
}

impl CollectionKind {
    /// Stable name used in storage keys and remote paths.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
            Self::Orders => "orders",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the fallback cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A stored value could not be decoded.
    #[error("cached {key} is corrupt")]
    Corrupt {
        /// Storage key holding the value
        key: String,

        /// Decoding error
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("failed to encode {key}")]
    Encode {
        /// Storage key being written
        key: String,

        /// Encoding error
        #[source]
        source: serde_json::Error,
    },
}

/// Durable per-user collection cache.
#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCache").finish_non_exhaustive()
    }
}

impl LocalCache {
    /// Create a cache over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Storage key for a user's collection, e.g. `cart_guest`.
    ///
    /// Signed-in ids are written as `u-` plus the id with every byte outside
    /// `[A-Za-z0-9.-]` escaped as `_XX`, so distinct ids never share a key.
    #[must_use]
    pub fn key(user: &UserId, kind: CollectionKind) -> String {
        let Some(id) = user.0.as_deref() else {
            return format!("{kind}_{GUEST}");
        };

        let mut key = format!("{kind}_u-");

        for byte in id.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.') {
                key.push(char::from(byte));
            } else {
                key.push('_');

                for nibble in [byte >> 4, byte & 0x0F] {
                    key.extend(
                        char::from_digit(u32::from(nibble), 16).map(|c| c.to_ascii_uppercase()),
                    );
                }
            }
        }

        key
    }

    /// Load a collection. A collection never written reads as empty.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] when the store fails or the value is corrupt.
    pub fn load<T: DeserializeOwned>(
        &self,
        user: &UserId,
        kind: CollectionKind,
    ) -> Result<Vec<T>, CacheError> {
        let key = Self::key(user, kind);

        let Some(raw) = self.store.get(&key)? else {
            debug!(%key, "cache miss; treating collection as empty");

            return Ok(Vec::new());
        };

        serde_json::from_str(&raw).map_err(|source| CacheError::Corrupt { key, source })
    }

    /// Replace a collection.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] when encoding or the store fails.
    pub fn save<T: Serialize>(
        &self,
        user: &UserId,
        kind: CollectionKind,
        items: &[T],
    ) -> Result<(), CacheError> {
        let key = Self::key(user, kind);
        let raw = serde_json::to_string(items).map_err(|source| CacheError::Encode {
            key: key.clone(),
            source,
        })?;

        self.store.set(&key, &raw)?;

        debug!(%key, len = items.len(), "cache written");

        Ok(())
    }
}
