//! Commerce collections
//!
//! Cart and wishlist state kept in sync with a remote store, with the local
//! fallback cache taking over whenever the remote store fails.

mod entries;
mod mutations;
mod remote;
mod sync;

pub use entries::{CartEntry, CollectionEntry, WishlistEntry};
pub use remote::{MockRemoteStore, OfflineStore, RemoteEntry, RemoteError, RemoteStore};
pub use sync::{
    CartSynchronizer, CollectionState, CollectionSynchronizer, SyncError, WishlistSynchronizer,
};
