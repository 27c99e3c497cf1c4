//! Configuration for the filegate server.
//!
//! Settings load from `filegate.toml`; every section and field is optional
//! and falls back to a development default:
//!
//! - [`Config`] - Root configuration struct
//! - [`ServerConfig`] - HTTP bind address
//! - [`StoreConfig`] - Grant store backend and location
//! - [`UrlConfig`] - Base URL and path prefix for generated links
//! - [`UploadConfig`] - Pending upload lifetime
//!
//! R2 credentials are deliberately not part of the file; they come from the
//! environment through [`R2Config`](crate::remote::R2Config).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::grants::GrantStore;
use crate::paths;
use crate::url::UrlBuilder;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// filegate.toml configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub urls: UrlConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_HOST.to_string(),
            port: constants::DEFAULT_PORT,
        }
    }
}

/// Which grant store backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redb,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database path for the redb backend; `~/` is expanded. Defaults to
    /// `$FILEGATE_HOME/grants.redb`.
    pub path: Option<String>,
}

impl StoreConfig {
    /// Resolve the database path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => paths::expand_home(path),
            None => paths::get_db_path(),
        }
    }

    /// Open the configured grant store.
    ///
    /// # Errors
    ///
    /// Returns an error if the redb database cannot be opened.
    pub fn open(&self) -> Result<GrantStore> {
        match self.backend {
            StoreBackend::Memory => Ok(GrantStore::memory()),
            StoreBackend::Redb => {
                let path = self.db_path()?;
                GrantStore::file(&path).with_context(|| {
                    format!("Failed to open grant store: {}", path.display())
                })
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlConfig {
    pub base_url: String,
    pub path_prefix: String,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            base_url: format!(
                "http://{}:{}",
                constants::DEFAULT_HOST,
                constants::DEFAULT_PORT
            ),
            path_prefix: constants::DEFAULT_PATH_PREFIX.to_string(),
        }
    }
}

impl UrlConfig {
    pub fn builder(&self) -> UrlBuilder {
        UrlBuilder::new(&self.base_url, &self.path_prefix)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Default lifetime of a pending upload ticket.
    pub pending_ttl_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            pending_ttl_secs: constants::DEFAULT_PENDING_TTL_SECS,
        }
    }
}

impl Config {
    /// Load configuration from the given path, or `filegate.toml` in the
    /// current directory. A missing default file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file cannot be read, or if
    /// any file contains invalid TOML.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default = Path::new(constants::CONFIG_FILE);
                if default.exists() {
                    Self::load_from(default)
                } else {
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - Fields have invalid types
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this structure.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate configuration.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns an error listing every fatal problem:
    /// - Empty base URL
    /// - Zero or oversized pending upload TTL
    /// - Port 0
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.urls.base_url.trim().is_empty() {
            errors.push("urls.base_url cannot be empty".to_string());
        } else if !self.urls.base_url.starts_with("http://")
            && !self.urls.base_url.starts_with("https://")
        {
            warnings.push(format!(
                "urls.base_url '{}' has no http(s) scheme; generated links may not resolve",
                self.urls.base_url
            ));
        }

        if self.urls.base_url.ends_with("//") {
            warnings.push(
                "urls.base_url ends with '//'; only one trailing slash is removed".to_string(),
            );
        }

        if self.uploads.pending_ttl_secs == 0 {
            errors.push("uploads.pending_ttl_secs must be greater than 0".to_string());
        } else if self.uploads.pending_ttl_secs > constants::MAX_PENDING_TTL_SECS {
            errors.push(format!(
                "uploads.pending_ttl_secs cannot exceed {}",
                constants::MAX_PENDING_TTL_SECS
            ));
        }

        if self.server.port == 0 {
            errors.push("server.port cannot be 0".to_string());
        }

        if self.store.backend == StoreBackend::Memory {
            warnings.push("store.backend = \"memory\": records are lost on restart".to_string());
        }

        if errors.is_empty() {
            Ok(ValidationResult { warnings })
        } else {
            anyhow::bail!("Invalid configuration:\n  - {}", errors.join("\n  - "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, constants::DEFAULT_PORT);
        assert_eq!(config.store.backend, StoreBackend::Redb);
        assert_eq!(config.urls.path_prefix, "/files");
        assert_eq!(config.uploads.pending_ttl_secs, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [store]
            backend = "memory"

            [urls]
            base_url = "https://cdn.example.com/"
            path_prefix = "storage"

            [uploads]
            pending_ttl_secs = 600
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.uploads.pending_ttl_secs, 600);
        assert_eq!(
            config.urls.builder().endpoint("get"),
            "https://cdn.example.com/storage/get"
        );

        let result = config.validate().unwrap();
        assert!(result.has_warnings());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = Config::parse(
            r#"
            [urls]
            base_url = ""

            [uploads]
            pending_ttl_secs = 0
            "#,
        )
        .unwrap();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("base_url"));
        assert!(err.contains("pending_ttl_secs"));
    }

    #[test]
    fn test_unknown_backend_is_parse_error() {
        assert!(Config::parse("[store]\nbackend = \"postgres\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9000").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        assert!(Config::load(Some(Path::new("/nonexistent/filegate.toml"))).is_err());
    }

    #[test]
    fn test_store_path_override() {
        let store = StoreConfig {
            backend: StoreBackend::Redb,
            path: Some("/var/lib/filegate/grants.redb".to_string()),
        };
        assert_eq!(
            store.db_path().unwrap(),
            PathBuf::from("/var/lib/filegate/grants.redb")
        );
    }

    #[test]
    fn test_open_redb_store() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = StoreConfig {
            backend: StoreBackend::Redb,
            path: Some(tmp.path().join("nested/grants.redb").display().to_string()),
        };
        assert!(store.open().is_ok());
        assert!(tmp.path().join("nested/grants.redb").exists());
    }
}
