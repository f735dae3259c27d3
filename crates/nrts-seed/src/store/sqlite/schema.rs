//! `SQLite` schema for the embedded document store.
//!
//! The layout version lives in `PRAGMA user_version`. A file written by a
//! newer layout is refused rather than reinterpreted.

use rusqlite::Connection;

use crate::error::{Error, Result};

/// Layout version written by this build.
pub const SCHEMA_VERSION: i32 = 1;

/// One row per document. The composite primary key is what stops a
/// collection from holding two documents with the same identifier.
pub const CREATE_DOCUMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (collection, id)
)
";

/// Create the documents table and stamp the layout version.
///
/// # Errors
///
/// Returns [`Error::UnsupportedSchema`] if the file carries a newer layout
/// version, or [`Error::Database`] if a statement fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    let version = schema_version(conn)?;
    if version > SCHEMA_VERSION {
        return Err(Error::UnsupportedSchema {
            message: format!(
                "database layout version {version} is newer than supported version {SCHEMA_VERSION}"
            ),
        });
    }

    conn.execute(CREATE_DOCUMENTS_TABLE, [])?;
    if version < SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    Ok(())
}

/// 0 for a fresh file.
fn schema_version(conn: &Connection) -> Result<i32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_db() -> Connection {
        Connection::open_in_memory().expect("failed to create in-memory database")
    }

    #[test]
    fn test_initialize_creates_documents_table() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='documents'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_initialize_twice() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_layout_rejected() {
        let conn = create_test_db();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();

        let err = initialize_schema(&conn).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSchema { .. }));
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_documents_table_has_unique_key() {
        assert!(CREATE_DOCUMENTS_TABLE.contains("PRIMARY KEY (collection, id)"));
    }
}
