//! Collection mutation rules
//!
//! Shared by the local fallback path and by the normalization of remote
//! state, so both paths agree on merge and removal semantics.

use jiff::Timestamp;

use crate::products::{ProductId, ProductSnapshot};

use super::entries::CollectionEntry;

/// Find the entry for a product.
pub(crate) fn find<'a, E: CollectionEntry>(items: &'a [E], id: &ProductId) -> Option<&'a E> {
    items.iter().find(|entry| entry.product_id() == id)
}

/// Add units of a product, merging into an existing entry.
///
/// Adding zero units is a no-op.
pub(crate) fn add<E: CollectionEntry>(
    items: &mut Vec<E>,
    product: ProductSnapshot,
    quantity: u32,
    added_at: Timestamp,
) {
    if quantity == 0 {
        return;
    }

    match items
        .iter_mut()
        .find(|entry| entry.product_id() == &product.id)
    {
        Some(existing) => existing.merge(quantity),
        None => items.push(E::new(product, quantity, added_at)),
    }
}

/// Remove a product's entry. Returns whether anything was removed.
pub(crate) fn remove<E: CollectionEntry>(items: &mut Vec<E>, id: &ProductId) -> bool {
    let before = items.len();

    items.retain(|entry| entry.product_id() != id);

    items.len() != before
}

/// Set a product's quantity; anything below one removes the entry.
pub(crate) fn update<E: CollectionEntry>(items: &mut Vec<E>, id: &ProductId, quantity: u32) {
    if quantity < 1 {
        remove(items, id);

        return;
    }

    if let Some(existing) = items.iter_mut().find(|entry| entry.product_id() == id) {
        existing.set_quantity(quantity);
    }
}
