//! Login and logout around the scoped cart store.

pub mod errors;
pub mod service;

pub use errors::SessionError;
pub use service::{SessionService, LOGIN_PATH};
