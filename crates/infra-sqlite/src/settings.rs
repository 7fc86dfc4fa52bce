// SQLite Settings (serde + config)

use config::{Config, ConfigBuilder, Environment};
use serde::{Deserialize, Serialize};
use std::path::Path;
use unitas_core::error::{RepositoryError, Result};

const ENV_PREFIX: &str = "UNITAS_SQLITE";

/// Connection settings of the SQLite backend
///
/// Every field has a default; environment variables such as
/// `UNITAS_SQLITE__DATABASE_URL` override file values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteSettings {
    pub database_url: String,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
    /// Write-ahead logging journal
    pub wal: bool,
}

impl Default for SqliteSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://unitas.db".to_string(),
            max_connections: 10,
            busy_timeout_ms: 5_000,
            wal: true,
        }
    }
}

impl SqliteSettings {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `UNITAS_SQLITE__*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::load(Config::builder())
    }

    /// Settings file (any format the `config` crate detects by extension),
    /// then environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(Config::builder().add_source(config::File::from(path.as_ref())))
    }

    fn load(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| RepositoryError::Config(e.to_string()))
    }
}
