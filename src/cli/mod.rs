use std::io;

use boutique::{
    cache::{CacheError, UserId},
    collections::SyncError,
    config::StorefrontConfig,
    context::{ContextError, StoreContext},
    coupons::CouponError,
    orders::{CheckoutError, OrderId},
    pricing::PricingError,
    receipt::ReceiptError,
};
use clap::{Parser, Subcommand};
use thiserror::Error;

mod cart;
mod checkout;
mod orders;
mod wishlist;

#[derive(Debug, Parser)]
#[command(name = "boutique", about = "Storefront cart, wishlist and checkout", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: StorefrontConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show and change the cart
    Cart(cart::CartCommand),

    /// Show and change the wishlist
    Wishlist(wishlist::WishlistCommand),

    /// Price the cart, optionally with a coupon
    Quote(checkout::QuoteArgs),

    /// Place an order for the cart
    Checkout(checkout::CheckoutArgs),

    /// Browse placed orders
    Orders(orders::OrdersCommand),
}

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("failed to read order history: {0}")]
    History(#[from] CacheError),

    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("no order {0}")]
    OrderNotFound(OrderId),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), CliError> {
        let context = StoreContext::from_config(&self.config)?;
        let user = self.config.user.map_or_else(UserId::guest, UserId::new);
        let mut out = io::stdout();

        match self.command {
            Commands::Cart(command) => cart::run(command, &context, &user, &mut out).await,
            Commands::Wishlist(command) => {
                wishlist::run(command, &context, &user, &mut out).await
            }
            Commands::Quote(args) => checkout::quote(&args, &context, &user, &mut out).await,
            Commands::Checkout(args) => checkout::run(args, &context, &user, &mut out).await,
            Commands::Orders(command) => orders::run(command, &context, &user, &mut out),
        }
    }
}
