//! Resolving "who is signed in" from a bearer credential.

use async_trait::async_trait;
use common::{http::ApiClient, CoreError};
use models::Identity;
use tracing::{debug, instrument};

pub const ME_PATH: &str = "/api/v1/accesos/me";

/// Identity provider abstraction; the backend `/me` endpoint in production.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self, token: &str) -> Result<Identity, CoreError>;
}

/// Resolves identities through `GET /api/v1/accesos/me`.
#[derive(Clone, Debug)]
pub struct HttpIdentityProvider {
    client: ApiClient,
}

impl HttpIdentityProvider {
    pub fn new(client: ApiClient) -> Self { Self { client } }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[instrument(skip(self, token))]
    async fn current_user(&self, token: &str) -> Result<Identity, CoreError> {
        let identity: Identity = self.client.get_json(ME_PATH, Some(token), &[]).await?;
        debug!(user = %identity.partition_id(), "identity resolved");
        Ok(identity)
    }
}

/// Fixed token table for tests and offline runs
pub mod mock {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default, Clone)]
    pub struct StaticIdentityProvider {
        users: HashMap<String, Identity>,
    }

    impl StaticIdentityProvider {
        pub fn new<I, T>(users: I) -> Self
        where
            I: IntoIterator<Item = (T, Identity)>,
            T: Into<String>,
        {
            Self { users: users.into_iter().map(|(t, u)| (t.into(), u)).collect() }
        }
    }

    #[async_trait]
    impl IdentityProvider for StaticIdentityProvider {
        async fn current_user(&self, token: &str) -> Result<Identity, CoreError> {
            self.users
                .get(token)
                .cloned()
                .ok_or_else(|| CoreError::Status { status: 401, detail: "Could not validate credentials".into() })
        }
    }
}
