use std::io::Write;

use boutique::{
    cache::UserId, collections::CartEntry, context::StoreContext, coupons::Coupon,
    pricing::PricingPolicy, products::ProductId, receipt::Receipt,
};
use clap::{Args, Subcommand};
use jiff::Timestamp;

use super::CliError;

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// List the cart with its totals
    Show,

    /// Add units of a product
    Add {
        /// Product id
        product: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1u32)]
        quantity: u32,
    },

    /// Remove a product
    Remove {
        /// Product id
        product: String,
    },

    /// Set a product's quantity; zero removes it
    Update {
        /// Product id
        product: String,

        /// New quantity
        quantity: u32,
    },

    /// Empty the cart
    Clear,
}

pub(crate) async fn run(
    command: CartCommand,
    context: &StoreContext,
    user: &UserId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut cart = context.cart(user);

    cart.fetch().await?;

    match command.command {
        CartSubcommand::Show => {}
        CartSubcommand::Add { product, quantity } => {
            cart.add(ProductId::new(product), quantity).await?;
        }
        CartSubcommand::Remove { product } => {
            cart.remove(&ProductId::new(product)).await?;
        }
        CartSubcommand::Update { product, quantity } => {
            cart.update(&ProductId::new(product), quantity).await?;
        }
        CartSubcommand::Clear => {
            cart.clear().await?;
        }
    }

    let state = cart.state();

    if state.is_empty() {
        writeln!(out, "Your cart is empty.")?;

        return Ok(());
    }

    write_quote(out, state.items(), &context.policy, None)?;

    writeln!(
        out,
        "{} item(s) in cart for {}",
        state.total_items(),
        cart.user()
    )?;

    Ok(())
}

pub(crate) fn write_quote(
    out: &mut impl Write,
    entries: &[CartEntry],
    policy: &PricingPolicy,
    coupon: Option<&Coupon>,
) -> Result<(), CliError> {
    let pricing = policy.price(entries, coupon, Timestamp::now())?;
    let receipt = Receipt::quote(entries, &pricing, coupon.map(|coupon| coupon.code.as_str()));

    receipt.write_to(out)?;

    Ok(())
}
