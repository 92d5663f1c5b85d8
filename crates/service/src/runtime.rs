//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` to keep binary crates importing
//! `service::runtime::ensure_env` without depending directly on `common`.

/// Ensure the directory of the local storage file exists.
pub async fn ensure_env(data_file: &str) -> anyhow::Result<()> {
    common::env::ensure_env(data_file).await
}

/// HTTP client for the backend described by `cfg`.
pub fn api_client(cfg: &configs::ApiConfig) -> anyhow::Result<common::http::ApiClient> {
    common::http::ApiClient::new(cfg.base_url.clone(), cfg.timeout())
        .map_err(|e| anyhow::anyhow!("cannot build HTTP client for {}: {e}", cfg.base_url))
}
