//! Configuration loading
//!
//! Resolution order, highest priority first:
//! 1. Command-line argument (handled by the binary)
//! 2. Environment variable (`SNEHBAND_*`)
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing TOML file is not an error: a warning is logged and defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:5780";

/// Default QR render service
pub const DEFAULT_QR_SERVICE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file; defaults to the platform data directory
    pub database: Option<PathBuf>,
    pub server: ServerConfig,
    pub smtp: SmtpConfig,
    pub cdn: CdnConfig,
    pub auth: AuthConfig,
    pub pdf: PdfConfig,
    pub qr: QrConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// SMTP relay credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender mailbox, e.g. `Snehband <noreply@example.org>`
    pub from: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            username: None,
            password: None,
            from: None,
        }
    }
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        is_set(&self.host) && is_set(&self.from)
    }
}

/// Image CDN credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CdnConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub folder: String,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            cloud_name: None,
            api_key: None,
            api_secret: None,
            folder: "snehband".to_string(),
        }
    }
}

impl CdnConfig {
    pub fn is_configured(&self) -> bool {
        is_set(&self.cloud_name) && is_set(&self.api_key) && is_set(&self.api_secret)
    }
}

/// Identity assertion by the OAuth proxy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Accounts created with the `admin` role on first sign-in
    pub admin_emails: Vec<String>,
    pub identity_header: String,
    pub name_header: String,
    /// When set, requests must carry `x-proxy-secret` with this value
    pub proxy_secret: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_emails: Vec::new(),
            identity_header: "x-forwarded-email".to_string(),
            name_header: "x-forwarded-user".to_string(),
            proxy_secret: None,
        }
    }
}

impl AuthConfig {
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email.trim()))
    }
}

/// Fonts embedded into exported PDFs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub latin_font: Option<PathBuf>,
    pub devanagari_font: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    pub service_url: String,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_QR_SERVICE_URL.to_string(),
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        let mut config = match path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                let config = Self::from_toml_str(&content)?;
                info!("Loaded configuration from {}", path.display());
                config
            }
            Some(path) => {
                warn!(
                    "Config file not found at {}, using defaults",
                    path.display()
                );
                Self::default()
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                Self::default()
            }
        };

        config.apply_env();
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Apply `SNEHBAND_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SNEHBAND_SMTP_HOST") {
            self.smtp.host = Some(v);
        }
        if let Some(v) = get("SNEHBAND_SMTP_PORT") {
            match v.trim().parse() {
                Ok(port) => self.smtp.port = port,
                Err(_) => warn!("Ignoring invalid SNEHBAND_SMTP_PORT: {}", v),
            }
        }
        if let Some(v) = get("SNEHBAND_SMTP_USERNAME") {
            self.smtp.username = Some(v);
        }
        if let Some(v) = get("SNEHBAND_SMTP_PASSWORD") {
            self.smtp.password = Some(v);
        }
        if let Some(v) = get("SNEHBAND_SMTP_FROM") {
            self.smtp.from = Some(v);
        }
        if let Some(v) = get("SNEHBAND_CDN_CLOUD_NAME") {
            self.cdn.cloud_name = Some(v);
        }
        if let Some(v) = get("SNEHBAND_CDN_API_KEY") {
            self.cdn.api_key = Some(v);
        }
        if let Some(v) = get("SNEHBAND_CDN_API_SECRET") {
            self.cdn.api_secret = Some(v);
        }
        if let Some(v) = get("SNEHBAND_ADMIN_EMAILS") {
            self.auth.admin_emails = v
                .split(',')
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect();
        }
        if let Some(v) = get("SNEHBAND_PROXY_SECRET") {
            self.auth.proxy_secret = Some(v);
        }
    }

    /// Database file, falling back to the platform data directory
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(default_database_path)
    }
}

/// `~/.config/snehband/config.toml` (platform equivalent elsewhere)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("snehband").join("config.toml"))
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("snehband"))
        .unwrap_or_else(|| PathBuf::from("./snehband_data"))
        .join("snehband.db")
}
