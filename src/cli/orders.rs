use std::io::Write;

use boutique::{
    cache::UserId, context::StoreContext, orders::OrderId, pricing::money, receipt::Receipt,
};
use clap::{Args, Subcommand};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

use super::CliError;

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// List placed orders, newest first
    List,

    /// Show one order
    Show {
        /// Order id
        order_id: String,
    },
}

pub(crate) fn run(
    command: OrdersCommand,
    context: &StoreContext,
    user: &UserId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let history = context.history();

    match command.command {
        OrdersSubcommand::List => {
            let orders = history.list(user)?;

            if orders.is_empty() {
                writeln!(out, "No orders yet.")?;

                return Ok(());
            }

            let mut builder = Builder::default();

            builder.push_record(["Order", "Placed", "Status", "Units", "Total"]);

            for order in &orders {
                builder.push_record([
                    order.order_id.to_string(),
                    order.order_date.strftime("%Y-%m-%d").to_string(),
                    order.status.to_string(),
                    order.total_units().to_string(),
                    money(order.final_amount).to_string(),
                ]);
            }

            let mut table = builder.build();

            table.with(Style::modern_rounded());
            table.modify(Columns::new(3..5), Alignment::right());

            writeln!(out, "{table}")?;
        }
        OrdersSubcommand::Show { order_id } => {
            let order_id = OrderId::new(order_id);

            let order = history
                .find(user, &order_id)?
                .ok_or(CliError::OrderNotFound(order_id))?;

            Receipt::from_order(&order).write_to(out)?;
        }
    }

    Ok(())
}
