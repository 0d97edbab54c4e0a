use crate::core::error;
use crate::core::schemas;
use rusqlite::{Connection, OpenFlags};

pub fn db_connect(db_path: &str) -> Result<Connection, error::FeedpackError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(error::FeedpackError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::FeedpackError::RusqliteError)?;
    Ok(conn)
}

/// Open an existing database for reading only. No pragma that writes is
/// issued, and a missing file is an error rather than created.
pub fn db_connect_read_only(db_path: &str) -> Result<Connection, error::FeedpackError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(db_path, flags)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(conn)
}

/// Connect to a named shared-cache in-memory database. The database lives as
/// long as at least one connection to the same URI stays open.
pub fn db_connect_memory(uri: &str) -> Result<Connection, error::FeedpackError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(uri, flags)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(conn)
}

/// Create the package and comment collections if missing and stamp the schema
/// version. Databases written by a newer schema are refused.
pub fn initialize_store_schema(conn: &Connection) -> Result<(), error::FeedpackError> {
    check_store_schema(conn)?;
    let found: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;

    conn.execute(schemas::PACKAGE_DB_SCHEMA, [])?;
    conn.execute(schemas::COMMENT_DB_SCHEMA, [])?;
    conn.execute(schemas::COMMENT_DB_INDEX_PAGE_URL, [])?;

    if found < schemas::STORE_SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", schemas::STORE_SCHEMA_VERSION)?;
    }
    Ok(())
}

/// Refuse databases stamped by a newer schema without touching anything.
pub fn check_store_schema(conn: &Connection) -> Result<(), error::FeedpackError> {
    let found: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if found > schemas::STORE_SCHEMA_VERSION {
        return Err(error::FeedpackError::SchemaVersion {
            found,
            supported: schemas::STORE_SCHEMA_VERSION,
        });
    }
    Ok(())
}

pub fn initialize_cache_schema(conn: &Connection) -> Result<(), error::FeedpackError> {
    conn.execute(schemas::CACHE_DB_SCHEMA, [])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_schema_is_stamped_and_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_store_schema(&conn).unwrap();
        initialize_store_schema(&conn).unwrap();
        let version: i64 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, schemas::STORE_SCHEMA_VERSION);
    }

    #[test]
    fn newer_schema_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", 7).unwrap();
        let err = initialize_store_schema(&conn).unwrap_err();
        assert!(matches!(
            err,
            error::FeedpackError::SchemaVersion { found: 7, .. }
        ));
    }

    #[test]
    fn read_only_connection_refuses_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ro.db");
        let path = path.to_string_lossy();
        initialize_store_schema(&db_connect(&path).unwrap()).unwrap();

        let conn = db_connect_read_only(&path).unwrap();
        check_store_schema(&conn).unwrap();
        assert!(conn.execute("INSERT INTO package(id) VALUES('p1')", []).is_err());
    }

    #[test]
    fn read_only_connection_does_not_create_files() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("absent.db");
        assert!(db_connect_read_only(&path.to_string_lossy()).is_err());
        assert!(!path.exists());
    }
}
