use crate::error::Result;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::debug;

const SCHEMA_VERSION: i64 = 1;

/// SQLite-backed table of held files.
///
/// No connection is kept between calls: every operation opens its own
/// connection and runs in a single transaction, so concurrent processes are
/// serialized by SQLite's file locking alone.
#[derive(Debug, Clone)]
pub struct TrackingStore {
    path: PathBuf,
}

impl TrackingStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = TrackingStore {
            path: path.as_ref().to_path_buf(),
        };
        let conn = store.connect()?;
        migrate_schema(&conn)?;
        debug!("Tracking store ready at {}", store.path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        configure_pragmas(&conn)?;
        Ok(conn)
    }
}

fn configure_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )
}

/// Create the table if absent and stamp the schema version.
fn migrate_schema(conn: &Connection) -> rusqlite::Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    conn.execute_batch(include_str!("schema.sql"))?;

    if version < SCHEMA_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;
        debug!(
            "Tracking schema upgraded from version {} to {}",
            version, SCHEMA_VERSION
        );
    }
    Ok(())
}
