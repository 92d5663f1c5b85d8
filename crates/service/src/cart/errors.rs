use models::{errors::ModelError, CartKind};
use thiserror::Error;

use crate::errors::ServiceError;

/// Business errors for cart workflows
#[derive(Debug, Error)]
pub enum CartError {
    #[error("you must be signed in to add {0} to the cart")]
    AuthRequired(CartKind),
    #[error("only {available} units of {code} are available in stock")]
    StockExceeded { code: String, available: u32 },
    #[error("category {code} is already in your cart")]
    DuplicateCategory { code: String },
    #[error("stored {kind} cart under {key} is malformed: {source}")]
    Decode {
        kind: CartKind,
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode {kind} cart: {source}")]
    Encode {
        kind: CartKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid cart line: {0}")]
    Invalid(#[from] ModelError),
    #[error(transparent)]
    Storage(#[from] ServiceError),
}

impl CartError {
    /// Conditions shown to the user and safe to retry after correcting input.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            CartError::AuthRequired(_) | CartError::StockExceeded { .. } | CartError::DuplicateCategory { .. }
        )
    }
}
