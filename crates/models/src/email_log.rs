use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// `estado` value the backend writes for a delivered message.
pub const STATUS_SENT: &str = "enviado";

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 500;

/// One row of the email-send audit log.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmailLogEntry {
    #[serde(default)]
    pub idlog: Option<i64>,
    #[serde(default)]
    pub idrequisicion: Option<i64>,
    #[serde(default)]
    pub codrequisicion: Option<String>,
    #[serde(default)]
    pub fecha_envio: Option<String>,
    #[serde(default)]
    pub destinatario: Option<String>,
    #[serde(default)]
    pub asunto: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl EmailLogEntry {
    pub fn is_sent(&self) -> bool {
        self.estado.as_deref() == Some(STATUS_SENT)
    }

    /// Parsed send timestamp; accepts RFC 3339 and naive ISO-8601.
    pub fn sent_at(&self) -> Option<NaiveDateTime> {
        let raw = self.fecha_envio.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_local());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
    }

    /// `YYYY-MM-DD HH:MM:SS`, or the raw value with `T` replaced and cut to 19 chars.
    pub fn display_sent_at(&self) -> String {
        if let Some(dt) = self.sent_at() {
            return dt.format("%Y-%m-%d %H:%M:%S").to_string();
        }
        match self.fecha_envio.as_deref() {
            Some(raw) => raw.replacen('T', " ", 1).chars().take(19).collect(),
            None => String::new(),
        }
    }
}

/// Answer of the count endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailLogCount {
    pub total: u64,
}

/// Filters accepted by the email-log listing endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailLogQuery {
    pub destinatario: Option<String>,
    pub idrequisicion: Option<String>,
    pub estado: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub q: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl EmailLogQuery {
    /// Clamp paging the same way the server does: limit in `1..=500`, default 100.
    pub fn normalize(&self) -> (u32, u32) {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        (limit, self.offset.unwrap_or(0))
    }

    /// Filter parameters only (what the count endpoint takes).
    pub fn filter_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let mut push = |name: &'static str, value: &Option<String>| {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                params.push((name, v.to_string()));
            }
        };
        push("destinatario", &self.destinatario);
        push("idrequisicion", &self.idrequisicion);
        push("estado", &self.estado);
        push("q", &self.q);
        if let Some(d) = self.from {
            params.push(("from_", d.format("%Y-%m-%d").to_string()));
        }
        if let Some(d) = self.to {
            params.push(("to", d.format("%Y-%m-%d").to_string()));
        }
        params
    }

    /// Filters plus normalized paging (what the listing endpoint takes).
    pub fn list_params(&self) -> Vec<(&'static str, String)> {
        let mut params = self.filter_params();
        let (limit, offset) = self.normalize();
        params.push(("limit", limit.to_string()));
        params.push(("offset", offset.to_string()));
        params
    }
}
