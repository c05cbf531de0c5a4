//! Boutique prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cache::{CacheError, CollectionKind, LocalCache, UserId},
    collections::{
        CartEntry, CartSynchronizer, CollectionEntry, CollectionState, OfflineStore, RemoteEntry,
        RemoteError, RemoteStore, SyncError, WishlistEntry, WishlistSynchronizer,
    },
    context::{ContextError, StoreContext},
    coupons::{Coupon, CouponDiscount, CouponError, CouponService, IneligibleReason, apply_coupon},
    fixtures::FixtureCatalog,
    http::HttpCommerceClient,
    orders::{
        CheckoutError, CheckoutRequest, ItemSnapshot, OrderAssembler, OrderHistory, OrderId,
        OrderSnapshot, OrderStatus, PaymentMethod, ShippingAddress,
    },
    pricing::{PricingError, PricingPolicy, PricingResult, price_cart},
    products::{ImagePolicy, ProductId, ProductRef, ProductSnapshot},
    receipt::Receipt,
    resolver::{CatalogError, CatalogProduct, ProductCatalog, ProductResolver},
    storage::{FileStore, KeyValueStore, MemoryStore, StorageError},
};
