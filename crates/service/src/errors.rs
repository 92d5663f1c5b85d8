use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn storage(e: impl std::fmt::Display) -> Self { Self::Storage(e.to_string()) }
}
