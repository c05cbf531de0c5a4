//! Fixtures
//!
//! YAML-backed product catalog and coupon service. Used by tests and by the
//! command line when it runs without a remote API.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use crate::{
    collections::RemoteError,
    coupons::{Coupon, CouponService, normalize_code},
    fixtures::{coupons::CouponsFixture, products::ProductsFixture},
    products::ProductId,
    resolver::{CatalogError, CatalogProduct, ProductCatalog},
};

pub mod coupons;
pub mod products;

/// Fixture set loaded when none is named.
pub const DEFAULT_SET: &str = "storefront";

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,

        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Price not in the store currency
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),
}

/// In-memory catalog and coupon book loaded from YAML.
#[derive(Debug, Default)]
pub struct FixtureCatalog {
    products: FxHashMap<ProductId, CatalogProduct>,
    coupons: RwLock<FxHashMap<String, Coupon>>,
}

impl FixtureCatalog {
    /// Empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `products/<set>.yml` and `coupons/<set>.yml` from `base_path`.
    /// A missing coupons file leaves the coupon book empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or parsed, or holds an invalid value.
    pub fn from_set(base_path: impl AsRef<Path>, set: &str) -> Result<Self, FixtureError> {
        let base_path = base_path.as_ref();
        let mut catalog = Self::new();

        catalog.load_products(&base_path.join("products").join(format!("{set}.yml")))?;

        let coupons_path = base_path.join("coupons").join(format!("{set}.yml"));

        if coupons_path.exists() {
            catalog.load_coupons(&coupons_path)?;
        }

        debug!(
            set,
            products = catalog.products.len(),
            "fixture catalog loaded"
        );

        Ok(catalog)
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a price is invalid.
    pub fn load_products(&mut self, path: &Path) -> Result<&mut Self, FixtureError> {
        let fixture: ProductsFixture = serde_norway::from_str(&read(path)?)?;

        for (id, product_fixture) in fixture.products {
            let product = product_fixture.try_into_catalog(&id)?;

            self.products.insert(ProductId::new(id), product);
        }

        Ok(self)
    }

    /// Load coupons from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a discount is invalid.
    pub fn load_coupons(&mut self, path: &Path) -> Result<&mut Self, FixtureError> {
        let fixture: CouponsFixture = serde_norway::from_str(&read(path)?)?;

        let coupons = self
            .coupons
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        for (code, coupon_fixture) in fixture.coupons {
            let coupon = coupon_fixture.try_into_coupon(&code)?;

            coupons.insert(coupon.code.clone(), coupon);
        }

        Ok(self)
    }

    /// Add or replace a product.
    pub fn insert_product(&mut self, product: CatalogProduct) -> &mut Self {
        if let Some(id) = product.id.clone() {
            self.products.insert(id, product);
        }

        self
    }

    /// Add or replace a coupon.
    pub fn insert_coupon(&mut self, coupon: Coupon) -> &mut Self {
        self.coupons
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(coupon.code.clone(), coupon);

        self
    }

    /// Number of products loaded.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// Product ids, sorted.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.products.keys().cloned().collect();

        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        ids
    }

    /// Current state of a coupon, including redemptions recorded so far.
    #[must_use]
    pub fn coupon(&self, code: &str) -> Option<Coupon> {
        self.coupons
            .read()
            .ok()
            .and_then(|coupons| coupons.get(&normalize_code(code)).cloned())
    }
}

fn read(path: &Path) -> Result<String, FixtureError> {
    fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl ProductCatalog for FixtureCatalog {
    async fn get_product(&self, id: &ProductId) -> Result<CatalogProduct, CatalogError> {
        self.products
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }
}

#[async_trait]
impl CouponService for FixtureCatalog {
    async fn validate(&self, code: &str) -> Result<Option<Coupon>, RemoteError> {
        let coupons = self
            .coupons
            .read()
            .map_err(|_poisoned| RemoteError::Unavailable("coupon book poisoned".to_string()))?;

        Ok(coupons.get(&normalize_code(code)).cloned())
    }

    async fn record_usage(&self, code: &str) -> Result<(), RemoteError> {
        let mut coupons = self
            .coupons
            .write()
            .map_err(|_poisoned| RemoteError::Unavailable("coupon book poisoned".to_string()))?;

        let coupon = coupons
            .get_mut(&normalize_code(code))
            .ok_or_else(|| RemoteError::Rejected {
                status: Some(404),
                message: format!("unknown coupon {code}"),
            })?;

        coupon.used_count = coupon.used_count.saturating_add(1);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use testresult::TestResult;

    use crate::coupons::CouponDiscount;

    use super::*;

    fn write_fixture(base: &Path, category: &str, name: &str, contents: &str) -> TestResult {
        let dir = base.join(category);

        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{name}.yml")), contents)?;

        Ok(())
    }

    fn repo_fixtures() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    #[test]
    fn loads_the_bundled_storefront_set() -> TestResult {
        let catalog = FixtureCatalog::from_set(repo_fixtures(), DEFAULT_SET)?;

        assert!(catalog.product_count() > 0);
        assert!(catalog.coupon("save20").is_some());
        assert!(catalog.coupon("flat50").is_some());

        Ok(())
    }

    #[tokio::test]
    async fn serves_products_and_reports_unknown_ids() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "products",
            "mini",
            "products:\n  tee-001:\n    name: Tee\n    price: 25.00 USD\n    category: tops\n",
        )?;

        let catalog = FixtureCatalog::from_set(dir.path(), "mini")?;

        let tee = catalog.get_product(&ProductId::new("tee-001")).await?;

        assert_eq!(tee.name.as_deref(), Some("Tee"));
        assert_eq!(tee.price, Some(25_00));

        let missing = catalog.get_product(&ProductId::new("nope")).await;

        assert!(
            matches!(missing, Err(CatalogError::NotFound(_))),
            "expected NotFound, got {missing:?}"
        );

        Ok(())
    }

    #[test]
    fn missing_products_file_is_an_io_error() -> TestResult {
        let dir = tempfile::tempdir()?;

        let result = FixtureCatalog::from_set(dir.path(), "absent");

        assert!(
            matches!(result, Err(FixtureError::Io { .. })),
            "expected Io, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn rejects_prices_in_another_currency() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "products",
            "gbp",
            "products:\n  scarf:\n    name: Scarf\n    price: 10.00 GBP\n",
        )?;

        let result = FixtureCatalog::from_set(dir.path(), "gbp");

        assert!(
            matches!(result, Err(FixtureError::CurrencyMismatch(_, _))),
            "expected CurrencyMismatch, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn records_coupon_usage() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(dir.path(), "products", "mini", "products: {}\n")?;
        write_fixture(
            dir.path(),
            "coupons",
            "mini",
            "coupons:\n  save10:\n    type: percentage\n    value: 10%\n    valid_from: \"2026-01-01T00:00:00Z\"\n    valid_until: \"2026-12-31T00:00:00Z\"\n",
        )?;

        let catalog = FixtureCatalog::from_set(dir.path(), "mini")?;

        let coupon = catalog.validate("Save10").await?;

        assert_eq!(
            coupon.map(|c| c.discount),
            Some(CouponDiscount::Percentage(rust_decimal::Decimal::from(10)))
        );

        catalog.record_usage("SAVE10").await?;

        assert_eq!(catalog.coupon("save10").map(|c| c.used_count), Some(1));

        let unknown = catalog.record_usage("NOPE").await;

        assert!(
            matches!(unknown, Err(RemoteError::Rejected { .. })),
            "expected Rejected, got {unknown:?}"
        );

        Ok(())
    }
}
