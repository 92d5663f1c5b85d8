//! Service layer: per-user carts, session handling and the email log view.
//! - Separates business logic from the key-value substrate and the HTTP backend.
//! - Reuses validation and entity definitions in `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod runtime;
#[cfg(test)]
pub mod test_support;
pub mod storage;
pub mod kv;
pub mod identity;
pub mod cart;
pub mod session;
pub mod email_log;
