//! Per-user scoped carts over the shared key-value substrate.
//!
//! Every user owns a product cart and a category cart, each stored as one
//! JSON array under `cart_<kind>_<user>`. Mutations read the whole array,
//! change it, and write it back.

pub mod errors;
pub mod keys;
pub mod migration;
pub mod notify;
pub mod store;

pub use errors::CartError;
pub use keys::partition_key;
pub use migration::MigrationReport;
pub use notify::{CartCounts, CartObserver, DisplaySurface, LogNotifier, Notifier, SubscriptionId};
pub use store::{CartDebugInfo, ScopedCartStore};
