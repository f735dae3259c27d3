//! Configuration management for nrts-seed.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::BootstrapRecord;
use crate::seeder::{SeedPlan, DEFAULT_COMPLETION_MARKER};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "nrts-seed";

/// Default embedded database file name.
const DATABASE_FILE_NAME: &str = "seed.db";

/// Environment variable prefix.
const ENV_PREFIX: &str = "NRTS_SEED_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `NRTS_SEED_`, sections split on `__`)
/// 2. TOML config file at `~/.config/nrts-seed/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document store configuration.
    pub store: StoreConfig,
    /// Seed record configuration.
    pub seed: SeedConfig,
}

/// Which document store backend to seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// A `MongoDB` server.
    #[default]
    Mongodb,
    /// An embedded `SQLite` database file.
    Sqlite,
    /// A process-local map, discarded on exit.
    Memory,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mongodb => write!(f, "mongodb"),
            Self::Sqlite => write!(f, "sqlite"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Document store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend to connect to.
    pub backend: StoreBackend,
    /// `MongoDB` connection string.
    pub uri: String,
    /// Database name.
    pub database: String,
    /// Path to the embedded database file.
    /// Defaults to `~/.local/share/nrts-seed/seed.db`
    pub sqlite_path: Option<PathBuf>,
    /// How long to wait for a `MongoDB` server in milliseconds.
    pub server_selection_timeout_ms: u64,
}

/// Seed record configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Collection that holds the seed record.
    pub collection: String,
    /// Label used in status lines.
    pub label: String,
    /// Last line printed after a successful seed.
    pub completion_marker: String,
    /// JSON file with the record to seed. The built-in test application
    /// is used when unset.
    pub record_file: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Mongodb,
            uri: "mongodb://localhost:27017".to_string(),
            database: "nrts-dev".to_string(),
            sqlite_path: None,
            server_selection_timeout_ms: 5_000,
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            collection: "applications".to_string(),
            label: "Test application".to_string(),
            completion_marker: DEFAULT_COMPLETION_MARKER.to_string(),
            record_file: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// Values are not validated here; call [`Config::validate`] once any
    /// command-line overrides have been applied.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        Ok(figment.extract()?)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.store.database.trim().is_empty() {
            return Err(validation("store.database must not be empty"));
        }
        if self.store.database.contains(['/', '\\', '.', ' ', '"', '$']) {
            return Err(validation(format!(
                "store.database '{}' contains characters not allowed in database names",
                self.store.database
            )));
        }

        let collection = &self.seed.collection;
        if collection.trim().is_empty() {
            return Err(validation("seed.collection must not be empty"));
        }
        if collection.contains('$') || collection.starts_with("system.") {
            return Err(validation(format!(
                "seed.collection '{collection}' is not a valid collection name"
            )));
        }

        let marker = &self.seed.completion_marker;
        if marker.trim().is_empty() || marker.contains(['\n', '\r']) {
            return Err(validation(
                "seed.completion_marker must be a single non-empty line",
            ));
        }

        if self.store.server_selection_timeout_ms == 0 {
            return Err(validation(
                "store.server_selection_timeout_ms must be greater than 0",
            ));
        }

        if self.store.backend == StoreBackend::Mongodb {
            let uri = regex::Regex::new(r"^mongodb(\+srv)?://\S+$")
                .map_err(|err| validation(err.to_string()))?;
            if !uri.is_match(&self.store.uri) {
                return Err(validation(format!(
                    "store.uri '{}' must start with mongodb:// or mongodb+srv://",
                    self.store.uri
                )));
            }
        }

        Ok(())
    }

    /// Get the embedded database path, resolving defaults if not set.
    #[must_use]
    pub fn sqlite_path(&self) -> PathBuf {
        self.store
            .sqlite_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the server selection timeout as a Duration.
    #[must_use]
    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_millis(self.store.server_selection_timeout_ms)
    }

    /// Resolve the record to seed: the configured file, or the built-in
    /// test application.
    ///
    /// # Errors
    ///
    /// Returns an error if the record file cannot be read or is invalid.
    pub fn seed_record(&self) -> Result<BootstrapRecord> {
        match &self.seed.record_file {
            Some(path) => BootstrapRecord::from_json_file(path),
            None => Ok(BootstrapRecord::test_application()),
        }
    }

    /// Build the seed plan described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the seed record cannot be resolved.
    pub fn seed_plan(&self) -> Result<SeedPlan> {
        Ok(SeedPlan::new(
            self.seed.collection.clone(),
            self.seed.label.clone(),
            self.seed_record()?,
        )
        .with_completion_marker(self.seed.completion_marker.clone()))
    }
}

fn validation(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.store.backend, StoreBackend::Mongodb);
        assert_eq!(config.store.uri, "mongodb://localhost:27017");
        assert_eq!(config.store.database, "nrts-dev");
        assert_eq!(config.seed.collection, "applications");
        assert_eq!(config.seed.label, "Test application");
        assert_eq!(
            config.seed.completion_marker,
            "MongoDB initialization complete"
        );
        assert!(config.seed.record_file.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_collection() {
        let mut config = Config::default();
        config.seed.collection = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("seed.collection"));
    }

    #[test]
    fn test_validate_system_collection() {
        let mut config = Config::default();
        config.seed.collection = "system.users".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_database_name() {
        let mut config = Config::default();
        config.store.database = "nrts.dev".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("store.database"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.store.server_selection_timeout_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("server_selection_timeout_ms"));
    }

    #[test]
    fn test_validate_bad_uri() {
        let mut config = Config::default();
        config.store.uri = "http://localhost:27017".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("store.uri"));
    }

    #[test]
    fn test_uri_ignored_for_sqlite() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Sqlite;
        config.store.uri = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_srv_uri() {
        let mut config = Config::default();
        config.store.uri = "mongodb+srv://cluster.example.net".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sqlite_path_default() {
        let path = Config::default().sqlite_path();
        assert!(path.to_string_lossy().contains("seed.db"));
    }

    #[test]
    fn test_sqlite_path_custom() {
        let mut config = Config::default();
        config.store.sqlite_path = Some(PathBuf::from("/custom/seed.db"));
        assert_eq!(config.sqlite_path(), PathBuf::from("/custom/seed.db"));
    }

    #[test]
    fn test_server_selection_timeout() {
        assert_eq!(
            Config::default().server_selection_timeout(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_seed_record_default() {
        let record = Config::default().seed_record().unwrap();
        assert_eq!(record, BootstrapRecord::test_application());
    }

    #[test]
    fn test_seed_plan_uses_config() {
        let mut config = Config::default();
        config.seed.collection = "fixtures".to_string();
        config.seed.label = "Fixture".to_string();

        let plan = config.seed_plan().unwrap();
        assert_eq!(plan.collection, "fixtures");
        assert_eq!(plan.label, "Fixture");
    }

    #[test]
    fn test_completion_marker_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[seed]\ncompletion_marker = \"seed done\"\n").unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.seed_plan().unwrap().completion_marker, "seed done");
    }

    #[test]
    fn test_validate_multiline_marker() {
        let mut config = Config::default();
        config.seed.completion_marker = "done\nreally".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("seed.completion_marker"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("nrts-seed"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[store]
backend = "sqlite"
database = "nrts-test"

[seed]
collection = "fixtures"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.database, "nrts-test");
        assert_eq!(config.seed.collection, "fixtures");
        assert_eq!(config.seed.label, "Test application");
    }

    #[test]
    fn test_load_invalid_toml_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store]\nbackend = \"cassandra\"\n").unwrap();

        let result = Config::load_from(Some(path));
        assert!(matches!(result, Err(Error::ConfigLoad(_))));
    }

    #[test]
    fn test_load_defers_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store]\nuri = \"http://localhost\"\n").unwrap();

        let mut config = Config::load_from(Some(path)).unwrap();
        assert!(config.validate().is_err());

        config.store.backend = StoreBackend::Sqlite;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_backend_display() {
        assert_eq!(StoreBackend::Mongodb.to_string(), "mongodb");
        assert_eq!(StoreBackend::Sqlite.to_string(), "sqlite");
        assert_eq!(StoreBackend::Memory.to_string(), "memory");
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("\"backend\":\"mongodb\""));
        assert!(json.contains("applications"));
    }
}
