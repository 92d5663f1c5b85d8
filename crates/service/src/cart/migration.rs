use models::CartKind;
use tracing::{info, instrument, warn};

use super::errors::CartError;
use super::keys::partition_key;
use super::store::ScopedCartStore;

/// What `migrate_legacy_carts` did with each shared cart it found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Legacy carts copied into the user's partition.
    pub migrated: Vec<CartKind>,
    /// Legacy carts dropped because the user already had a cart of that kind.
    pub discarded: Vec<CartKind>,
}

impl MigrationReport {
    pub fn is_empty(&self) -> bool { self.migrated.is_empty() && self.discarded.is_empty() }
}

impl ScopedCartStore {
    /// Move the shared pre-partition carts (`cart`, `categorias_cart`) into the
    /// current user's partition.
    ///
    /// An existing partitioned cart wins and the legacy value is dropped. The
    /// legacy key is removed either way, so a second run finds nothing to do.
    /// Without a signed-in user nothing is touched.
    #[instrument(skip(self))]
    pub async fn migrate_legacy_carts(&mut self) -> Result<MigrationReport, CartError> {
        let mut report = MigrationReport::default();
        let Some(user) = self.current_user.clone() else {
            return Ok(report);
        };

        for kind in CartKind::ALL {
            let legacy = kind.legacy_key();
            let Some(raw) = self.kv.get(legacy).await? else { continue };

            let target = partition_key(kind, &user);
            if self.kv.contains(&target).await? {
                warn!(%legacy, %target, "user already has a cart; discarding legacy cart");
                report.discarded.push(kind);
            } else {
                self.kv.set(&target, raw).await?;
                info!(%legacy, %target, "legacy cart migrated");
                report.migrated.push(kind);
            }
            self.kv.remove(legacy).await?;
        }

        if !report.is_empty() {
            self.changed().await;
        }
        Ok(report)
    }
}
