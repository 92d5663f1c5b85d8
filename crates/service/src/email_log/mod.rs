//! Read-only view over the server's email-send audit log.

pub mod render;

use common::{http::ApiClient, CoreError};
use models::email_log::{EmailLogCount, EmailLogEntry, EmailLogQuery};
use tracing::{debug, instrument, warn};

pub use render::{render_result, render_table};

pub const EMAIL_LOG_PATH: &str = "/api/v1/requisiciones/email-log";
pub const EMAIL_LOG_COUNT_PATH: &str = "/api/v1/requisiciones/email-log/count";

#[derive(Clone, Debug)]
pub struct EmailLogClient {
    client: ApiClient,
}

impl EmailLogClient {
    pub fn new(client: ApiClient) -> Self { Self { client } }

    /// One page of log rows matching `query`. A body that is not an array is a parse error.
    #[instrument(skip(self))]
    pub async fn fetch(&self, query: &EmailLogQuery) -> Result<Vec<EmailLogEntry>, CoreError> {
        let rows: Vec<EmailLogEntry> = self.client.get_json(EMAIL_LOG_PATH, None, &query.list_params()).await?;
        debug!(rows = rows.len(), "email log fetched");
        Ok(rows)
    }

    /// Number of rows matching the filters of `query`; paging is ignored.
    #[instrument(skip(self))]
    pub async fn count(&self, query: &EmailLogQuery) -> Result<u64, CoreError> {
        let count: EmailLogCount = self.client.get_json(EMAIL_LOG_COUNT_PATH, None, &query.filter_params()).await?;
        Ok(count.total)
    }

    /// Fetch and render; failures come back as the inline error paragraph.
    pub async fn load_and_render(&self, query: &EmailLogQuery) -> String {
        let result = self.fetch(query).await;
        if let Err(e) = &result {
            warn!(error = %e, "email log unavailable");
        }
        match render_result(&result) {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "email log template failed");
                render::RENDER_FAILED.to_string()
            }
        }
    }
}
