use std::io::Write;

use boutique::{
    cache::UserId,
    collections::CartEntry,
    context::StoreContext,
    coupons::{Coupon, apply_coupon},
    orders::{CheckoutRequest, PaymentMethod, ShippingAddress},
    receipt::Receipt,
};
use clap::Args;
use jiff::Timestamp;

use super::{CliError, cart::write_quote};

#[derive(Debug, Args)]
pub(crate) struct QuoteArgs {
    /// Coupon code to apply
    #[arg(long)]
    coupon: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Recipient name
    #[arg(long, default_value = "")]
    full_name: String,

    /// Street address
    #[arg(long, default_value = "")]
    address: String,

    /// City
    #[arg(long, default_value = "")]
    city: String,

    /// Postal or ZIP code
    #[arg(long, default_value = "")]
    postal_code: String,

    /// Contact phone number
    #[arg(long, default_value = "")]
    phone: String,

    /// Country
    #[arg(long, default_value = "")]
    country: String,

    /// Coupon code to apply
    #[arg(long)]
    coupon: Option<String>,

    /// Payment method (card, cod)
    #[arg(long, value_enum, default_value_t = PaymentMethod::Card)]
    payment: PaymentMethod,
}

async fn coupon_for(
    context: &StoreContext,
    code: Option<&str>,
    entries: &[CartEntry],
) -> Result<Option<Coupon>, CliError> {
    let Some(code) = code else {
        return Ok(None);
    };

    let coupon = apply_coupon(context.coupons.as_ref(), code, entries, Timestamp::now()).await?;

    Ok(Some(coupon))
}

pub(crate) async fn quote(
    args: &QuoteArgs,
    context: &StoreContext,
    user: &UserId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut cart = context.cart(user);

    cart.fetch().await?;

    let entries = cart.state().items();

    if entries.is_empty() {
        writeln!(out, "Your cart is empty.")?;

        return Ok(());
    }

    let coupon = coupon_for(context, args.coupon.as_deref(), entries).await?;

    write_quote(out, entries, &context.policy, coupon.as_ref())
}

pub(crate) async fn run(
    args: CheckoutArgs,
    context: &StoreContext,
    user: &UserId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut cart = context.cart(user);

    cart.fetch().await?;

    let coupon = coupon_for(context, args.coupon.as_deref(), cart.state().items()).await?;

    let request = CheckoutRequest {
        shipping: ShippingAddress {
            full_name: args.full_name,
            address: args.address,
            city: args.city,
            postal_code: args.postal_code,
            phone: args.phone,
            country: args.country,
        },
        coupon,
        payment_method: args.payment,
    };

    let order = context.assembler().checkout(&mut cart, request).await?;

    Receipt::from_order(&order).write_to(&mut *out)?;

    writeln!(out, "Order {} placed.", order.order_id)?;

    Ok(())
}
