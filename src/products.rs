//! Products

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder shown for products whose image is missing or could not be resolved.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/300x400?text=Image+Unavailable";

/// Product identifier as issued by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short, human-friendly form of the id (its last six characters).
    #[must_use]
    pub fn short(&self) -> String {
        let tail: Vec<char> = self.0.chars().rev().take(6).collect();

        tail.into_iter().rev().collect()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Value copy of the catalog fields of a product.
///
/// Snapshots are copied into cart, wishlist and order entries so that later
/// catalog changes never reach back into them. Prices are in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    /// Catalog identifier
    pub id: ProductId,

    /// Display name
    pub name: String,

    /// Selling price in minor units
    #[serde(default)]
    pub price: u64,

    /// Pre-discount price in minor units, when the product is marked down
    #[serde(default)]
    pub original_price: Option<u64>,

    /// Image reference, normalized before it is exposed
    #[serde(default)]
    pub image: String,

    /// Brand name
    #[serde(default)]
    pub brand: String,

    /// Category name, used for coupon exclusions
    #[serde(default)]
    pub category: String,
}

impl ProductSnapshot {
    /// Synthesized stand-in for a product the catalog could not provide.
    #[must_use]
    pub fn placeholder(id: &ProductId) -> Self {
        Self {
            name: format!("Product {}", id.short()),
            id: id.clone(),
            price: 0,
            original_price: None,
            image: PLACEHOLDER_IMAGE.to_string(),
            brand: String::new(),
            category: String::new(),
        }
    }

    /// Per-unit markdown, zero when the product is not discounted.
    #[must_use]
    pub fn unit_savings(&self) -> u64 {
        self.original_price
            .map_or(0, |original| original.saturating_sub(self.price))
    }
}

/// A product as referenced by a remote collection entry.
///
/// The remote store may hand back either a bare id or an already populated
/// snapshot; bare ids are hydrated before anything is exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    /// Already resolved product
    Snapshot(ProductSnapshot),

    /// Bare identifier awaiting hydration
    Id(ProductId),
}

impl ProductRef {
    /// Identifier of the referenced product.
    #[must_use]
    pub fn id(&self) -> &ProductId {
        match self {
            ProductRef::Snapshot(snapshot) => &snapshot.id,
            ProductRef::Id(id) => id,
        }
    }

    /// Whether the reference still needs hydrating.
    #[must_use]
    pub fn is_bare(&self) -> bool {
        matches!(self, ProductRef::Id(_))
    }
}

impl From<ProductSnapshot> for ProductRef {
    fn from(snapshot: ProductSnapshot) -> Self {
        ProductRef::Snapshot(snapshot)
    }
}

impl From<ProductId> for ProductRef {
    fn from(id: ProductId) -> Self {
        ProductRef::Id(id)
    }
}

/// Rules for turning stored image references into displayable URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePolicy {
    base_url: String,
    placeholder: String,
}

impl ImagePolicy {
    /// Create a policy qualifying relative paths against `base_url`.
    pub fn new(base_url: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            placeholder: placeholder.into(),
        }
    }

    /// Normalize an image reference.
    ///
    /// Empty references become the placeholder, absolute references are kept
    /// and anything else is joined onto the base URL.
    #[must_use]
    pub fn normalize(&self, image: &str) -> String {
        let image = image.trim();

        if image.is_empty() {
            return self.placeholder.clone();
        }

        if is_absolute(image) {
            return image.to_string();
        }

        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            image.trim_start_matches('/')
        )
    }

    /// Normalize the image of a snapshot in place.
    pub fn apply(&self, product: &mut ProductSnapshot) {
        product.image = self.normalize(&product.image);
    }
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self::new("http://localhost:5000", PLACEHOLDER_IMAGE)
    }
}

fn is_absolute(image: &str) -> bool {
    ["http://", "https://", "//", "data:"]
        .iter()
        .any(|prefix| image.starts_with(prefix))
}
