pub mod migrations;
pub mod schema;

use rusqlite::Connection;
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;

use crate::error::{Error, Result};

static SQLITE_VEC_INIT: Once = Once::new();

/// Concurrent writers wait this long for the write lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Open (or create) the Cortex database at the given path, with all extensions
/// loaded and schema initialized for vectors of `dimensions` components.
pub fn open_database(path: impl AsRef<Path>, dimensions: usize) -> Result<Connection> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    load_sqlite_vec();

    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;

    prepare(&conn, dimensions)?;

    tracing::info!(path = %path.display(), dimensions, "database initialized");
    Ok(conn)
}

/// Open a private in-memory database (tests, dry runs).
pub fn open_in_memory(dimensions: usize) -> Result<Connection> {
    load_sqlite_vec();
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    prepare(&conn, dimensions)?;
    Ok(conn)
}

fn prepare(conn: &Connection, dimensions: usize) -> Result<()> {
    if dimensions == 0 {
        return Err(Error::Config("embedding dimensions must be greater than zero".into()));
    }

    schema::init_schema(conn, dimensions)?;
    migrations::run_migrations(conn)?;

    match migrations::get_embedding_dimensions(conn)? {
        Some(stored) if stored != dimensions => Err(Error::Config(format!(
            "vector index was created for {stored}-dimensional embeddings, \
             but the active provider produces {dimensions}"
        ))),
        _ => Ok(()),
    }
}
