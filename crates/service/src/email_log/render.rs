//! HTML rendering of the email audit log.
//!
//! Markup lives in askama templates under `templates/email_log/`; every
//! interpolated value is HTML-escaped by the template engine.

use askama::Template;
use common::CoreError;
use models::email_log::EmailLogEntry;

const COLOR_SENT: &str = "green";
const COLOR_FAILED: &str = "red";

/// Fallback paragraph when a template fails to render.
pub const RENDER_FAILED: &str = "<p class=\"error\">Error al cargar historial</p>";

/// One table row, already flattened to display text.
struct RowView {
    sent_at: String,
    recipient: String,
    subject: String,
    status: String,
    error: String,
    color: &'static str,
}

impl From<&EmailLogEntry> for RowView {
    fn from(entry: &EmailLogEntry) -> Self {
        Self {
            sent_at: entry.display_sent_at(),
            recipient: entry.destinatario.clone().unwrap_or_default(),
            subject: entry.asunto.clone().unwrap_or_default(),
            status: entry.estado.clone().unwrap_or_default(),
            error: entry.error.clone().unwrap_or_default(),
            color: if entry.is_sent() { COLOR_SENT } else { COLOR_FAILED },
        }
    }
}

#[derive(Template)]
#[template(path = "email_log/table.html")]
struct LogTable {
    rows: Vec<RowView>,
}

#[derive(Template)]
#[template(path = "email_log/empty.html")]
struct EmptyLog;

#[derive(Template)]
#[template(path = "email_log/error.html")]
struct LogError<'a> {
    message: &'a str,
}

/// Table of log rows, or the "no records" paragraph for an empty slice.
pub fn render_table(entries: &[EmailLogEntry]) -> Result<String, askama::Error> {
    if entries.is_empty() {
        return EmptyLog.render();
    }
    LogTable { rows: entries.iter().map(RowView::from).collect() }.render()
}

/// Error paragraph shown in place of the table.
pub fn render_error(err: &CoreError) -> Result<String, askama::Error> {
    let message = err.to_string();
    LogError { message: &message }.render()
}

pub fn render_result(result: &Result<Vec<EmailLogEntry>, CoreError>) -> Result<String, askama::Error> {
    match result {
        Ok(entries) => render_table(entries),
        Err(e) => render_error(e),
    }
}
