//! Order Assembler

use std::{fmt, sync::Arc};

use jiff::{SignedDuration, Timestamp};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    cache::{CacheError, LocalCache},
    collections::CartSynchronizer,
    coupons::{Coupon, CouponService},
    pricing::{PricingError, PricingPolicy, minor_units},
};

use super::{
    AppliedCoupon, ItemSnapshot, OrderHistory, OrderId, OrderSnapshot, OrderStatus, PaymentMethod,
    ShippingAddress,
};

/// Delivery estimate from the moment an order is placed.
pub const DELIVERY_ESTIMATE: SignedDuration = SignedDuration::from_secs(72 * 60 * 60);

/// Errors that prevent an order from being placed. No order exists after any of them.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("your cart is empty")]
    EmptyCart,

    /// Required address fields are blank.
    #[error("please complete your shipping address (missing: {})", missing.join(", "))]
    IncompleteShipping {
        /// Names of the blank fields
        missing: Vec<&'static str>,
    },

    /// The cart could not be priced.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The order could not be saved.
    #[error("could not save order: {0}")]
    Persist(#[from] CacheError),

    /// The delivery estimate fell outside the supported time range.
    #[error("could not compute delivery date: {0}")]
    Clock(#[from] jiff::Error),
}

/// Everything the customer supplies at checkout besides the cart.
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    /// Delivery address
    pub shipping: ShippingAddress,

    /// Coupon accepted earlier via [`apply_coupon`](crate::coupons::apply_coupon)
    pub coupon: Option<Coupon>,

    /// Chosen payment method
    pub payment_method: PaymentMethod,
}

/// Turns a cart into a persisted, immutable order.
#[derive(Clone)]
pub struct OrderAssembler {
    history: OrderHistory,
    coupons: Arc<dyn CouponService>,
    policy: PricingPolicy,
}

impl fmt::Debug for OrderAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderAssembler")
            .field("history", &self.history)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl OrderAssembler {
    /// Assembler persisting into `cache` and reporting redemptions to `coupons`.
    #[must_use]
    pub fn new(cache: LocalCache, coupons: Arc<dyn CouponService>) -> Self {
        Self {
            history: OrderHistory::new(cache),
            coupons,
            policy: PricingPolicy::default(),
        }
    }

    /// Price orders with a different policy.
    #[must_use]
    pub fn with_policy(mut self, policy: PricingPolicy) -> Self {
        self.policy = policy;

        self
    }

    /// Place an order for the cart's current contents.
    ///
    /// # Errors
    ///
    /// See [`checkout_at`](Self::checkout_at).
    pub async fn checkout(
        &self,
        cart: &mut CartSynchronizer,
        request: CheckoutRequest,
    ) -> Result<OrderSnapshot, CheckoutError> {
        self.checkout_at(cart, request, Timestamp::now()).await
    }

    /// Place an order as of `now`.
    ///
    /// The cart is only cleared once the order is saved. Failing to record the
    /// coupon redemption or to clear the cart afterwards is logged and does
    /// not undo the order.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`] when the cart has no entries.
    /// - [`CheckoutError::IncompleteShipping`] when a required address field is blank.
    /// - [`CheckoutError::Pricing`] when the totals overflow.
    /// - [`CheckoutError::Clock`] when the delivery estimate is out of range.
    /// - [`CheckoutError::Persist`] when the order cannot be saved; the cart is left intact.
    pub async fn checkout_at(
        &self,
        cart: &mut CartSynchronizer,
        request: CheckoutRequest,
        now: Timestamp,
    ) -> Result<OrderSnapshot, CheckoutError> {
        let entries = cart.state().items();

        if entries.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let missing = request.shipping.missing_fields();

        if !missing.is_empty() {
            return Err(CheckoutError::IncompleteShipping { missing });
        }

        let pricing = self.policy.price(entries, request.coupon.as_ref(), now)?;
        let estimated_delivery = now.checked_add(DELIVERY_ESTIMATE)?;

        let coupon = request
            .coupon
            .filter(|_coupon| pricing.has_coupon_discount())
            .map(|coupon| AppliedCoupon {
                code: coupon.code,
                terms: coupon.discount,
                discount: minor_units(&pricing.coupon_discount),
            });

        let order = OrderSnapshot {
            order_id: OrderId::generate(now),
            user: cart.user().clone(),
            items: entries.iter().map(ItemSnapshot::from).collect(),
            shipping_address: request.shipping,
            total_amount: minor_units(&pricing.subtotal),
            tax: minor_units(&pricing.tax),
            shipping: minor_units(&pricing.shipping),
            discount: minor_units(&pricing.coupon_discount),
            final_amount: minor_units(&pricing.final_amount),
            coupon,
            payment_method: request.payment_method,
            status: OrderStatus::Processing,
            order_date: now,
            estimated_delivery,
        };

        self.history.record(&order)?;

        info!(
            order_id = %order.order_id,
            user = %order.user,
            items = order.items.len(),
            final_amount = order.final_amount,
            "order placed"
        );

        if let Some(applied) = &order.coupon {
            if let Err(usage_error) = self.coupons.record_usage(&applied.code).await {
                warn!(
                    order_id = %order.order_id,
                    code = %applied.code,
                    error = %usage_error,
                    "failed to record coupon usage"
                );
            }
        }

        if let Err(clear_error) = cart.clear().await {
            error!(
                order_id = %order.order_id,
                error = %clear_error,
                "order saved but cart could not be cleared"
            );
        }

        Ok(order)
    }
}
