use std::io::Write;

use boutique::{cache::UserId, context::StoreContext, pricing::money, products::ProductId};
use clap::{Args, Subcommand};
use tabled::{builder::Builder, settings::Style};

use super::CliError;

#[derive(Debug, Args)]
pub(crate) struct WishlistCommand {
    #[command(subcommand)]
    command: WishlistSubcommand,
}

#[derive(Debug, Subcommand)]
enum WishlistSubcommand {
    /// List wishlisted products
    Show,

    /// Wishlist a product
    Add {
        /// Product id
        product: String,
    },

    /// Remove a product from the wishlist
    Remove {
        /// Product id
        product: String,
    },

    /// Empty the wishlist
    Clear,
}

pub(crate) async fn run(
    command: WishlistCommand,
    context: &StoreContext,
    user: &UserId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut wishlist = context.wishlist(user);

    wishlist.fetch().await?;

    match command.command {
        WishlistSubcommand::Show => {}
        WishlistSubcommand::Add { product } => {
            wishlist.add(ProductId::new(product)).await?;
        }
        WishlistSubcommand::Remove { product } => {
            wishlist.remove(&ProductId::new(product)).await?;
        }
        WishlistSubcommand::Clear => {
            wishlist.clear().await?;
        }
    }

    let items = wishlist.state().items();

    if items.is_empty() {
        writeln!(out, "Your wishlist is empty.")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["Id", "Item", "Brand", "Price", "Added"]);

    for entry in items {
        builder.push_record([
            entry.product.id.to_string(),
            entry.product.name.clone(),
            entry.product.brand.clone(),
            money(entry.product.price).to_string(),
            entry.added_at.strftime("%Y-%m-%d").to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());

    writeln!(out, "{table}")?;

    Ok(())
}
