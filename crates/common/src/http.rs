//! Thin JSON-over-HTTP client shared by the service layer.
//!
//! Wraps a `reqwest::Client` bound to a base URL. Non-2xx answers become
//! `CoreError::Status` carrying the server's `detail` field when present.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::CoreError;

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for `base_url`. `timeout` of `None` means requests may wait forever.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, CoreError> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder.build().map_err(|e| CoreError::Network(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    /// Join a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path`, optionally with a bearer token and query parameters, and decode the body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&str>,
        query: &[(&str, String)],
    ) -> Result<T, CoreError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let mut req = self.http.get(&url);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        if !query.is_empty() {
            req = req.query(query);
        }
        Self::send(req).await
    }

    /// POST a JSON body to `path` and decode the response body.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CoreError> {
        let url = self.url(path);
        debug!(%url, "POST");
        Self::send(self.http.post(&url).json(body)).await
    }

    async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, CoreError> {
        let resp = req.send().await.map_err(|e| CoreError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = error_detail(resp).await;
            return Err(CoreError::Status { status: status.as_u16(), detail });
        }
        resp.json::<T>().await.map_err(|e| CoreError::Parse(e.to_string()))
    }
}

/// Extract a readable message from an error body: `detail` if JSON, raw text otherwise.
async fn error_detail(resp: Response) -> String {
    let reason = resp.status().canonical_reason().unwrap_or("error").to_string();
    let text = resp.text().await.unwrap_or_default();
    if text.trim().is_empty() {
        return reason;
    }
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(body) => match body.get("detail") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => text,
        },
        Err(_) => text,
    }
}
