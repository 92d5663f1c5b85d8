use thiserror::Error;

pub mod env;
pub mod http;
pub mod utils;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("http status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("parse error: {0}")]
    Parse(String),
}

impl CoreError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
