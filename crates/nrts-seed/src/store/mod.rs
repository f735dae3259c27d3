//! Document store abstraction.
//!
//! The seeder talks to its store only through [`DocumentStore`], so the
//! production `MongoDB` collection, an embedded `SQLite` file and an in-memory
//! map can be swapped freely. Every backend must reject a second document
//! with the same identifier using [`Error::DuplicateKeyConflict`].
//!
//! [`Error::DuplicateKeyConflict`]: crate::Error::DuplicateKeyConflict

pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;
pub mod sqlite;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{Config, StoreBackend};
use crate::error::Result;
use crate::record::{BootstrapRecord, RecordId};

pub use memory::MemoryStore;
#[cfg(feature = "mongodb")]
pub use mongo::MongoStore;
pub use sqlite::SqliteStore;

/// A collection-oriented document store holding bootstrap records.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// The name of this backend (for logging and errors).
    fn name(&self) -> &'static str;

    /// Look up a record by its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the store cannot be reached.
    async fn find_by_id(&self, collection: &str, id: &RecordId)
        -> Result<Option<BootstrapRecord>>;

    /// Insert a record as a new document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::DuplicateKeyConflict`] if a document with the
    /// same identifier exists, [`crate::Error::StoreUnavailable`] if the store
    /// cannot be reached, and [`crate::Error::WriteFailure`] otherwise.
    async fn insert(&self, collection: &str, record: &BootstrapRecord) -> Result<()>;

    /// Count documents carrying the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the store cannot be reached.
    async fn count_by_id(&self, collection: &str, id: &RecordId) -> Result<u64>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &RecordId,
    ) -> Result<Option<BootstrapRecord>> {
        (**self).find_by_id(collection, id).await
    }

    async fn insert(&self, collection: &str, record: &BootstrapRecord) -> Result<()> {
        (**self).insert(collection, record).await
    }

    async fn count_by_id(&self, collection: &str, id: &RecordId) -> Result<u64> {
        (**self).count_by_id(collection, id).await
    }
}

/// Open the store backend selected by `config`.
///
/// # Errors
///
/// Returns [`crate::Error::StoreUnavailable`] if the store cannot be reached,
/// or [`crate::Error::ConfigValidation`] if the backend was not compiled in.
pub async fn open(config: &Config) -> Result<Box<dyn DocumentStore>> {
    debug!("Opening {} store", config.store.backend);
    match config.store.backend {
        StoreBackend::Memory => Ok(Box::new(MemoryStore::new())),
        StoreBackend::Sqlite => Ok(Box::new(SqliteStore::open(config.sqlite_path())?)),
        #[cfg(feature = "mongodb")]
        StoreBackend::Mongodb => {
            let store = MongoStore::connect(
                &config.store.uri,
                &config.store.database,
                config.server_selection_timeout(),
            )
            .await?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "mongodb"))]
        StoreBackend::Mongodb => Err(crate::Error::ConfigValidation {
            message: "this build does not include the mongodb backend".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeder::{SeedOutcome, SeedPlan, Seeder};

    #[tokio::test]
    async fn test_open_memory_backend() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Memory;

        let store = open(&config).await.unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn test_boxed_store_seeds() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Memory;

        let seeder = Seeder::new(open(&config).await.unwrap(), SeedPlan::default());
        assert_eq!(seeder.ensure_seeded().await.unwrap(), SeedOutcome::Created);
        assert_eq!(
            seeder.ensure_seeded().await.unwrap(),
            SeedOutcome::AlreadyExists
        );
    }
}
