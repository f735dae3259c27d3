//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::config::{Config, StoreBackend};

/// Store selection shared by commands that talk to a store.
#[derive(Debug, Clone, Default, Args)]
pub struct StoreArgs {
    /// Override the configured store backend
    #[arg(short, long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Override the configured MongoDB connection string
    #[arg(long, value_name = "URI")]
    pub uri: Option<String>,

    /// Override the configured database name
    #[arg(long)]
    pub database: Option<String>,

    /// Override the configured collection
    #[arg(long)]
    pub collection: Option<String>,
}

impl StoreArgs {
    /// Apply these overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(backend) = self.backend {
            config.store.backend = backend.into();
        }
        if let Some(uri) = &self.uri {
            config.store.uri.clone_from(uri);
        }
        if let Some(database) = &self.database {
            config.store.database.clone_from(database);
        }
        if let Some(collection) = &self.collection {
            config.seed.collection.clone_from(collection);
        }
    }
}

/// Run command arguments.
#[derive(Debug, Clone, Default, Args)]
pub struct RunCommand {
    /// JSON file with the record to seed instead of the built-in one
    #[arg(short, long, value_name = "FILE")]
    pub record: Option<PathBuf>,

    /// Store selection
    #[command(flatten)]
    pub store: StoreArgs,
}

/// Check command arguments.
#[derive(Debug, Clone, Default, Args)]
pub struct CheckCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// JSON file with the record to look for
    #[arg(short, long, value_name = "FILE")]
    pub record: Option<PathBuf>,

    /// Store selection
    #[command(flatten)]
    pub store: StoreArgs,
}

/// Show command arguments.
#[derive(Debug, Clone, Default, Args)]
pub struct ShowCommand {
    /// JSON file with the record to show
    #[arg(short, long, value_name = "FILE")]
    pub record: Option<PathBuf>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Store backend argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// A MongoDB server
    Mongodb,
    /// An embedded SQLite file
    Sqlite,
    /// A process-local store
    Memory,
}

impl From<BackendArg> for StoreBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Mongodb => Self::Mongodb,
            BackendArg::Sqlite => Self::Sqlite,
            BackendArg::Memory => Self::Memory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_arg_conversion() {
        assert_eq!(StoreBackend::from(BackendArg::Mongodb), StoreBackend::Mongodb);
        assert_eq!(StoreBackend::from(BackendArg::Sqlite), StoreBackend::Sqlite);
        assert_eq!(StoreBackend::from(BackendArg::Memory), StoreBackend::Memory);
    }

    #[test]
    fn test_store_args_apply() {
        let mut config = Config::default();
        let args = StoreArgs {
            backend: Some(BackendArg::Sqlite),
            uri: None,
            database: Some("nrts-test".to_string()),
            collection: Some("fixtures".to_string()),
        };

        args.apply(&mut config);

        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.uri, "mongodb://localhost:27017");
        assert_eq!(config.store.database, "nrts-test");
        assert_eq!(config.seed.collection, "fixtures");
    }

    #[test]
    fn test_backend_override_makes_uri_irrelevant() {
        let mut config = Config::default();
        config.store.uri = "not-a-uri".to_string();
        let args = StoreArgs {
            backend: Some(BackendArg::Memory),
            ..StoreArgs::default()
        };

        args.apply(&mut config);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_args_default_changes_nothing() {
        let mut config = Config::default();
        StoreArgs::default().apply(&mut config);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
