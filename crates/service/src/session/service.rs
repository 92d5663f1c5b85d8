use std::sync::Arc;

use common::{http::ApiClient, CoreError};
use models::{
    auth::{LoginRequest, TokenResponse},
    Identity,
};
use tracing::{info, instrument, warn};

use super::errors::SessionError;
use crate::cart::ScopedCartStore;
use crate::identity::IdentityProvider;
use crate::kv::{KeyValueStore, TOKEN_KEY};

pub const LOGIN_PATH: &str = "/api/v1/accesos/login";

/// Credential exchange plus the cart bookkeeping that goes with it.
pub struct SessionService {
    client: ApiClient,
    kv: Arc<dyn KeyValueStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl SessionService {
    pub fn new(client: ApiClient, kv: Arc<dyn KeyValueStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { client, kv, identity }
    }

    /// Exchange credentials for a bearer token and sign `store` in.
    ///
    /// The token is stored under `token`, then checked against `/me`. A token
    /// the server will not confirm is removed again and `Unverified` returned.
    /// On success the identity is installed and legacy carts are migrated.
    #[instrument(skip(self, store, password))]
    pub async fn login(
        &self,
        store: &mut ScopedCartStore,
        email: &str,
        password: &str,
    ) -> Result<Identity, SessionError> {
        let input = LoginRequest { email: email.trim().to_string(), password: password.to_string() };
        input.validate()?;

        let token: TokenResponse = self
            .client
            .post_json(LOGIN_PATH, &input)
            .await
            .map_err(|e| match e {
                CoreError::Status { detail, .. } if !detail.trim().is_empty() => SessionError::Rejected(detail),
                CoreError::Status { .. } | CoreError::Parse(_) => SessionError::Rejected("login failed".into()),
                CoreError::Network(msg) => SessionError::Unreachable(msg),
            })?;
        self.kv.set(TOKEN_KEY, token.access_token.clone()).await?;

        let user = match self.identity.current_user(&token.access_token).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "token not accepted by /me; discarding it");
                self.kv.remove(TOKEN_KEY).await?;
                return Err(SessionError::Unverified);
            }
        };

        store.set_current_user(Some(user.clone()));
        let report = store.migrate_legacy_carts().await?;
        if let Err(e) = store.refresh_display_count().await {
            warn!(error = %e, "cart display refresh failed");
        }
        info!(
            user = %user.partition_id(),
            migrated = report.migrated.len(),
            discarded = report.discarded.len(),
            "user_logged_in"
        );
        Ok(user)
    }

    /// Ask for confirmation, then wipe the user's carts and the stored token.
    ///
    /// Returns `false` when the user declined; nothing is touched then.
    #[instrument(skip(self, store))]
    pub async fn logout(&self, store: &mut ScopedCartStore) -> Result<bool, SessionError> {
        if !store.notifier().confirm("Do you want to sign out?") {
            return Ok(false);
        }
        let user = store.current_user().map(|u| u.partition_id().to_string());
        store.clear_all_for_current_user().await?;
        self.kv.remove(TOKEN_KEY).await?;
        info!(user = user.as_deref().unwrap_or("-"), "user_logged_out");
        Ok(true)
    }
}
