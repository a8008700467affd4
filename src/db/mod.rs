// Database layer: SQLite storage for document metadata and cleaned text.
//
// rusqlite with the "bundled" feature, so there's no system SQLite
// dependency. The file lives wherever SEDIMENT_DB_PATH points
// (defaults to ./sediment.db).

pub mod import;
pub mod models;
pub mod queries;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the database and run migrations.
///
/// Called by `sediment init`; other commands use [`open`].
pub fn initialize(db_path: &str) -> Result<Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    schema::create_tables(&conn)?;

    Ok(conn)
}

/// Open an existing database (fails if it doesn't exist yet).
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        anyhow::bail!(
            "Database not found at {}. Run `sediment init` first.",
            db_path
        );
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    // Pick up migrations added since the file was created.
    schema::create_tables(&conn)?;

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_requires_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.db");
        let err = open(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("sediment init"));
    }

    #[test]
    fn test_initialize_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sediment.db");
        let path = path.to_str().unwrap();
        initialize(path).unwrap();
        let conn = open(path).unwrap();
        assert_eq!(queries::document_count(&conn).unwrap(), 0);
    }
}
