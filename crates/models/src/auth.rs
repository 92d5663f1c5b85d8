use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Body of `POST /accesos/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.password.is_empty() {
            return Err(ModelError::Validation("password required".into()));
        }
        Ok(())
    }
}

/// Successful login answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}
