//! Product Fixtures

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::iso::{self, Currency};
use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    pricing::store_currency,
    products::ProductId,
    resolver::CatalogProduct,
};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Map of product id -> product fixture
    pub products: FxHashMap<String, ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product name
    pub name: String,

    /// Selling price (e.g., "25.00 USD")
    pub price: String,

    /// Pre-markdown price (e.g., "30.00 USD")
    #[serde(default)]
    pub original_price: Option<String>,

    /// Image path or URL
    #[serde(default)]
    pub image: Option<String>,

    /// Brand name
    #[serde(default)]
    pub brand: Option<String>,

    /// Category name
    #[serde(default)]
    pub category: Option<String>,
}

impl ProductFixture {
    /// Convert to a catalog record for `id`
    ///
    /// # Errors
    ///
    /// Returns an error if a price is malformed or not in the store currency.
    pub fn try_into_catalog(self, id: &str) -> Result<CatalogProduct, FixtureError> {
        let original_price = self
            .original_price
            .as_deref()
            .map(parse_store_price)
            .transpose()?;

        Ok(CatalogProduct {
            id: Some(ProductId::new(id)),
            name: Some(self.name),
            price: Some(parse_store_price(&self.price)?),
            original_price,
            image: self.image,
            images: Vec::new(),
            brand: self.brand,
            category: self.category,
        })
    }
}

/// Parse price string (e.g., "2.99 USD") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is not a non-negative decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(u64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    }

    let amount = parts
        .first()
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|value| value.round_dp(0).to_u64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency_code = parts
        .get(1)
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = match *currency_code {
        "GBP" => iso::GBP,
        "USD" => iso::USD,
        "EUR" => iso::EUR,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    Ok((minor_units, currency))
}

/// Parse a price that must be in the store currency, returning minor units
///
/// # Errors
///
/// Returns an error if the price is malformed or in another currency.
pub fn parse_store_price(s: &str) -> Result<u64, FixtureError> {
    let (minor_units, currency) = parse_price(s)?;

    if currency != store_currency() {
        return Err(FixtureError::CurrencyMismatch(
            store_currency().iso_alpha_code.to_string(),
            currency.iso_alpha_code.to_string(),
        ));
    }

    Ok(minor_units)
}
