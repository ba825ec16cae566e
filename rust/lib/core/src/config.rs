//! Store configuration.
//!
//! Loaded from a TOML file, then optionally overridden by command-line
//! style arguments:
//!
//! ```toml
//! [storage]
//! data_dir = "/var/lib/app"
//!
//! [models.posts]
//! timestamps = true
//!
//! [models.events]
//! timestamps = { created_at = true, touched_at = { update = true } }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ServiceError;

/// Where rows are persisted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Base directory for data files.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Path to the redb database file.
    /// Defaults to `{data_dir}/data.redb` if not specified.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

/// Per-model settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    /// Raw timestamps declaration. Kept untyped here: it is validated when a
    /// row of this model is saved, not when the file is read.
    #[serde(default)]
    pub timestamps: serde_json::Value,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    /// Models keyed by table name.
    #[serde(default)]
    pub models: BTreeMap<String, ModelConfig>,
}

impl StoreConfig {
    /// Load config from disk, or return default if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ServiceError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Internal(format!("read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse config from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ServiceError> {
        toml::from_str(content)
            .map_err(|e| ServiceError::Internal(format!("parse config: {}", e)))
    }

    /// Build configuration from command-line arguments.
    ///
    /// Supported flags:
    /// - `--config=PATH` (loaded first, other flags override it)
    /// - `--data-dir=PATH`
    /// - `--db=PATH`
    pub fn from_args(args: &[String]) -> Result<Self, ServiceError> {
        let mut config = match args.iter().find_map(|a| a.strip_prefix("--config=")) {
            Some(path) => Self::load(Path::new(path))?,
            None => Self::default(),
        };

        for arg in args {
            if let Some(val) = arg.strip_prefix("--data-dir=") {
                config.storage.data_dir = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--db=") {
                config.storage.db_path = Some(PathBuf::from(val));
            }
        }

        Ok(config)
    }

    /// Resolve the redb database path, falling back to `{data_dir}/data.redb`.
    pub fn resolve_db_path(&self) -> PathBuf {
        self.storage.db_path.clone().unwrap_or_else(|| {
            self.storage
                .data_dir
                .as_ref()
                .map(|d| d.join("data.redb"))
                .unwrap_or_else(|| PathBuf::from("data.redb"))
        })
    }
}
