use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote backend the client talks to.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout; `None` or 0 means requests wait indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: default_base_url(), request_timeout_secs: None }
    }
}

/// Local key-value substrate (the on-disk stand-in for browser storage).
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self { Self { data_file: default_data_file() } }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { format: default_log_format() } }
}

fn default_base_url() -> String { "http://127.0.0.1:8000".into() }
fn default_data_file() -> String { "data/local_storage.json".into() }
fn default_log_format() -> String { "compact".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Defaults plus env overrides, for when no config file is present.
    pub fn from_env() -> Result<Self> {
        let mut cfg = AppConfig::default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.api.normalize_from_env();
        self.api.validate()?;
        self.storage.normalize_from_env();
        self.storage.validate()?;
        self.logging.normalize_from_env();
        self.logging.validate()?;
        Ok(())
    }
}

impl ApiConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(url) = std::env::var("API_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if self.request_timeout_secs == Some(0) {
            self.request_timeout_secs = None;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(anyhow!("api.base_url is empty; set it in config.toml or API_BASE_URL"));
        }
        let lower = self.base_url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("api.base_url must start with http:// or https://"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.request_timeout_secs.map(std::time::Duration::from_secs)
    }
}

impl StorageConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(path) = std::env::var("CART_DATA_FILE") {
            if !path.trim().is_empty() {
                self.data_file = path;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_file.trim().is_empty() {
            return Err(anyhow!("storage.data_file is empty"));
        }
        Ok(())
    }
}

impl LoggingConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            if !format.trim().is_empty() {
                self.format = format;
            }
        }
        self.format = self.format.trim().to_ascii_lowercase();
    }

    pub fn validate(&self) -> Result<()> {
        match self.format.as_str() {
            "compact" | "json" => Ok(()),
            other => Err(anyhow!("logging.format must be compact or json, got {other}")),
        }
    }
}
