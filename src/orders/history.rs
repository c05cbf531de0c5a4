//! Order history

use tracing::debug;

use crate::cache::{CacheError, CollectionKind, LocalCache, UserId};

use super::{OrderId, OrderSnapshot};

/// A user's placed orders, newest first, kept in the local cache.
#[derive(Debug, Clone)]
pub struct OrderHistory {
    cache: LocalCache,
}

impl OrderHistory {
    /// History backed by `cache`.
    #[must_use]
    pub fn new(cache: LocalCache) -> Self {
        Self { cache }
    }

    /// All of a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] when the history cannot be read.
    pub fn list(&self, user: &UserId) -> Result<Vec<OrderSnapshot>, CacheError> {
        self.cache.load(user, CollectionKind::Orders)
    }

    /// Look up one order.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] when the history cannot be read.
    pub fn find(&self, user: &UserId, id: &OrderId) -> Result<Option<OrderSnapshot>, CacheError> {
        Ok(self
            .list(user)?
            .into_iter()
            .find(|order| &order.order_id == id))
    }

    /// Prepend a freshly placed order.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] when the history cannot be read or written.
    pub fn record(&self, order: &OrderSnapshot) -> Result<(), CacheError> {
        let mut orders = self.list(&order.user)?;

        orders.insert(0, order.clone());

        self.cache.save(&order.user, CollectionKind::Orders, &orders)?;

        debug!(order_id = %order.order_id, user = %order.user, len = orders.len(), "order recorded");

        Ok(())
    }
}
