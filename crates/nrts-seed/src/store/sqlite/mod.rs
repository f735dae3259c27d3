//! Embedded `SQLite` document store.
//!
//! Documents are stored as JSON bodies keyed by `(collection, id)`, which
//! lets the seeder run locally without a `MongoDB` server while keeping the
//! same uniqueness guarantee.

pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info};

use super::DocumentStore;
use crate::error::{Error, Result};
use crate::record::{BootstrapRecord, RecordId};

const STORE_NAME: &str = "sqlite";

/// Document store backed by a single `SQLite` database file.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the database cannot be opened,
    /// or a schema error if initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening document database at {}", path.display());
        let unavailable = |err: rusqlite::Error| {
            Error::store_unavailable(STORE_NAME, format!("{}: {err}", path.display()))
        };
        let conn = Connection::open(&path).map_err(unavailable)?;

        // The first statement reads the file header, so a file that is not a
        // database fails here.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(unavailable)?;
        schema::initialize_schema(&conn)?;

        info!("Document database opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|err| Error::store_unavailable(STORE_NAME, err.to_string()))?;

        schema::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::store_unavailable(STORE_NAME, "connection lock poisoned"))
    }
}

/// Classify a failed read.
fn read_error(err: rusqlite::Error) -> Error {
    Error::store_unavailable(STORE_NAME, err.to_string())
}

/// Classify a failed insert.
///
/// Only a primary key violation is a duplicate; NOT NULL, CHECK and trigger
/// aborts share the primary code but are ordinary write failures.
fn write_error(collection: &str, id: &RecordId, err: rusqlite::Error) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            Error::duplicate_key(collection, id.as_str())
        }
        rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
            ErrorCode::CannotOpen
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::SystemIoFailure => Error::store_unavailable(STORE_NAME, err.to_string()),
            _ => Error::write_failure(collection, err.to_string()),
        },
        _ => Error::write_failure(collection, err.to_string()),
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn name(&self) -> &'static str {
        STORE_NAME
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &RecordId,
    ) -> Result<Option<BootstrapRecord>> {
        let body: Option<String> = self
            .conn()?
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(read_error)?;

        body.map(|body| {
            serde_json::from_str(&body).map_err(|err| Error::MalformedDocument {
                id: id.to_string(),
                message: err.to_string(),
            })
        })
        .transpose()
    }

    async fn insert(&self, collection: &str, record: &BootstrapRecord) -> Result<()> {
        let body = serde_json::to_string(record)?;
        self.conn()?
            .execute(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
                params![collection, record.id.as_str(), body],
            )
            .map_err(|err| write_error(collection, &record.id, err))?;

        debug!("Inserted document {} into {}", record.id, collection);
        Ok(())
    }

    async fn count_by_id(&self, collection: &str, id: &RecordId) -> Result<u64> {
        let count: i64 = self
            .conn()?
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id.as_str()],
                |row| row.get(0),
            )
            .map_err(read_error)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
