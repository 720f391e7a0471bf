pub mod schema;

use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;

static SQLITE_VEC_INIT: Once = Once::new();

/// Path that selects a private in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Whether `path` names an in-memory database rather than a file.
pub fn is_memory_path(path: &Path) -> bool {
    path.as_os_str() == MEMORY_PATH
}

/// Open the read-write connection, configure it and apply the schema.
///
/// Creates missing parent directories for file-backed databases.
pub fn open_writer(path: &Path, busy_timeout: Duration) -> Result<Connection, OpenError> {
    load_sqlite_vec();

    let conn = if is_memory_path(path) {
        Connection::open_in_memory()?
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        // WAL lets the reader pool proceed while a write transaction is open
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn
    };

    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(busy_timeout)?;

    schema::apply_schema(&conn)?;

    tracing::debug!(path = %path.display(), "schema applied");
    Ok(conn)
}

/// Open a read-only connection to an existing database file.
pub fn open_reader(path: &Path, busy_timeout: Duration) -> Result<Connection, OpenError> {
    load_sqlite_vec();

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}

/// Failure while acquiring or preparing a connection.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Snapshot of database health used by diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub sqlite_vec_version: String,
    pub journal_mode: String,
    pub integrity_ok: bool,
    pub integrity_details: String,
    pub entry_count: u64,
    pub finding_count: u64,
    pub summary_count: u64,
    pub metric_count: u64,
    pub embedding_count: u64,
}

/// Run `PRAGMA integrity_check` and gather row counts for every table.
pub fn check_database_health(conn: &Connection) -> rusqlite::Result<HealthReport> {
    let sqlite_vec_version: String = conn.query_row("SELECT vec_version()", [], |r| r.get(0))?;
    let journal_mode: String = conn.pragma_query_value(None, "journal_mode", |r| r.get(0))?;

    let integrity_details: String =
        conn.pragma_query_value(None, "integrity_check", |r| r.get(0))?;
    let integrity_ok = integrity_details == "ok";

    let count = |table: &str| -> rusqlite::Result<u64> {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
        Ok(n as u64)
    };

    Ok(HealthReport {
        sqlite_vec_version,
        journal_mode,
        integrity_ok,
        integrity_details,
        entry_count: count("entries")?,
        finding_count: count("findings")?,
        summary_count: count("summaries")?,
        metric_count: count("metrics")?,
        embedding_count: count("vec_embeddings")?,
    })
}

/// Open an in-memory database for testing.
#[cfg(test)]
pub fn open_memory_database() -> Connection {
    open_writer(Path::new(MEMORY_PATH), Duration::from_millis(5000))
        .expect("in-memory database should open")
}
