//! Boutique
//!
//! Client-side commerce state engine for a storefront: cart and wishlist
//! synchronization with a local fallback cache, product hydration, coupon
//! pricing and order checkout.

pub mod cache;
pub mod collections;
pub mod config;
pub mod context;
pub mod coupons;
pub mod fixtures;
pub mod http;
pub mod observability;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod resolver;
pub mod storage;
