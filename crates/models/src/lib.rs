//! Typed records exchanged with the backend and persisted in local storage.
//!
//! Serialized field names follow the wire/storage contract, not Rust naming.

pub mod errors;
pub mod identity;
pub mod cart;
pub mod auth;
pub mod email_log;

pub use cart::{CartKind, CategoryLine, NewProduct, ProductLine};
pub use identity::Identity;
