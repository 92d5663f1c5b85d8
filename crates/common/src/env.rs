//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::{debug, warn};

/// Ensure the directory holding the local storage file exists.
pub async fn ensure_env(data_file: &str) -> anyhow::Result<()> {
    let parent = match Path::new(data_file).parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => {
            debug!(%data_file, "data file has no parent directory; nothing to create");
            return Ok(());
        }
    };
    if tokio::fs::metadata(parent).await.is_err() {
        warn!(dir = %parent.display(), "data directory missing; creating it");
    }
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
    Ok(())
}
