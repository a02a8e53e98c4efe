//! Service configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::DaemonError;

/// Which storage backend to run against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// LMDB records with file-backed photo artifacts.
    Lmdb,
    /// In-memory records with inline photo blobs (simplified path).
    Memory,
}

/// Configuration for the geoproof service.
///
/// Can be loaded from a TOML file via [`ServiceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). CLI flags and env vars override
/// file values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Port for the HTTP API.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Data directory for record storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory for photo artifacts. Defaults to `<data_dir>/uploads`.
    #[serde(default)]
    pub uploads_dir: Option<PathBuf>,

    /// Storage backend.
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// External URL to forward committed records to, if any.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// CORS origin to allow; absent or "*" means any.
    #[serde(default)]
    pub allowed_origin: Option<String>,

    /// Deployment environment label ("development", "production", ...).
    #[serde(default = "default_env")]
    pub env: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_port() -> u16 {
    3000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./geoproof_data")
}

fn default_backend() -> StorageBackend {
    StorageBackend::Lmdb
}

fn default_env() -> String {
    "development".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, DaemonError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| DaemonError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, DaemonError> {
        toml::from_str(s).map_err(|e| DaemonError::Config(e.to_string()))
    }

    /// Resolve the effective uploads directory.
    pub fn effective_uploads_dir(&self) -> PathBuf {
        self.uploads_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("uploads"))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_dir: default_data_dir(),
            uploads_dir: None,
            backend: default_backend(),
            webhook_url: None,
            allowed_origin: None,
            env: default_env(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.port, 3000);
        assert_eq!(config.backend, StorageBackend::Lmdb);
        assert_eq!(config.env, "development");
        assert_eq!(
            config.effective_uploads_dir(),
            PathBuf::from("./geoproof_data/uploads")
        );
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            port = 8080
            backend = "memory"
            webhook_url = "https://hooks.example.com/verify"
        "#;
        let config = ServiceConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend, StorageBackend::Memory);
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://hooks.example.com/verify")
        );
        assert_eq!(config.log_level, "info"); // default
    }

    #[test]
    fn explicit_uploads_dir_wins() {
        let toml = r#"uploads_dir = "/var/lib/geoproof/photos""#;
        let config = ServiceConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(
            config.effective_uploads_dir(),
            PathBuf::from("/var/lib/geoproof/photos")
        );
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = ServiceConfig::from_toml_file(std::path::Path::new("/nonexistent/geoproof.toml"));
        assert!(matches!(result, Err(DaemonError::Config(_))));
    }
}
