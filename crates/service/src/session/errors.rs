use models::errors::ModelError;
use thiserror::Error;

use crate::cart::CartError;
use crate::errors::ServiceError;

/// Business errors for login/logout workflows
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("validation failed: {0}")]
    Invalid(#[from] ModelError),
    /// The server refused the credentials; carries its `detail` text.
    #[error("{0}")]
    Rejected(String),
    #[error("could not reach the server: {0}")]
    Unreachable(String),
    #[error("could not validate credentials")]
    Unverified,
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Storage(#[from] ServiceError),
}

impl SessionError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            SessionError::Invalid(_) => 1001,
            SessionError::Rejected(_) => 1004,
            SessionError::Unverified => 1005,
            SessionError::Unreachable(_) => 1100,
            SessionError::Cart(_) => 1150,
            SessionError::Storage(_) => 1200,
        }
    }
}
