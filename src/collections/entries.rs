//! Collection Entries

use std::fmt::Debug;

use jiff::Timestamp;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    cache::CollectionKind,
    products::{ProductId, ProductSnapshot},
};

/// Entry kept by a synchronized collection.
///
/// Cart and wishlist entries share one set of mutation rules; they differ only
/// in how quantities behave.
pub trait CollectionEntry:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Collection this entry type belongs to.
    const KIND: CollectionKind;

    /// Create a fresh entry.
    fn new(product: ProductSnapshot, quantity: u32, added_at: Timestamp) -> Self;

    /// Hydrated product.
    fn product(&self) -> &ProductSnapshot;

    /// Number of units; quantity-less entries count as one.
    fn quantity(&self) -> u32;

    /// When the entry was first added.
    fn added_at(&self) -> Timestamp;

    /// Fold a repeated add of the same product into this entry.
    fn merge(&mut self, quantity: u32);

    /// Overwrite the quantity. Quantity-less entries ignore this.
    fn set_quantity(&mut self, quantity: u32);

    /// Identifier of the entry's product.
    fn product_id(&self) -> &ProductId {
        &self.product().id
    }
}

/// Cart line: a product snapshot and how many units of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    /// Hydrated product
    pub product: ProductSnapshot,

    /// Units, always at least one
    pub quantity: u32,

    /// When the product was first added
    pub added_at: Timestamp,
}

impl CartEntry {
    /// Price of all units of this line in minor units.
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.product.price.saturating_mul(u64::from(self.quantity))
    }
}

impl CollectionEntry for CartEntry {
    const KIND: CollectionKind = CollectionKind::Cart;

    fn new(product: ProductSnapshot, quantity: u32, added_at: Timestamp) -> Self {
        Self {
            product,
            quantity,
            added_at,
        }
    }

    fn product(&self) -> &ProductSnapshot {
        &self.product
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }

    fn added_at(&self) -> Timestamp {
        self.added_at
    }

    fn merge(&mut self, quantity: u32) {
        self.quantity = self.quantity.saturating_add(quantity);
    }

    fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }
}

/// Wishlisted product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    /// Hydrated product
    #[serde(flatten)]
    pub product: ProductSnapshot,

    /// When the product was wishlisted
    pub added_at: Timestamp,
}

impl CollectionEntry for WishlistEntry {
    const KIND: CollectionKind = CollectionKind::Wishlist;

    fn new(product: ProductSnapshot, _quantity: u32, added_at: Timestamp) -> Self {
        Self { product, added_at }
    }

    fn product(&self) -> &ProductSnapshot {
        &self.product
    }

    fn quantity(&self) -> u32 {
        1
    }

    fn added_at(&self) -> Timestamp {
        self.added_at
    }

    fn merge(&mut self, _quantity: u32) {}

    fn set_quantity(&mut self, _quantity: u32) {}
}
