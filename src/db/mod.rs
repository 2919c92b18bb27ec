// Database layer: SQLite storage for notes, cited contexts and people.
//
// One file holds everything. `marginalia init` creates it; `serve` and
// `notes` refuse to run until it exists, so a typo in MARGINALIA_DB_PATH
// doesn't silently start an empty site.

pub mod models;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteDatabase;
pub use traits::Database;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create the database file (and its directory) if needed, then make sure
/// every table exists.
pub fn initialize(db_path: &str) -> Result<Connection> {
    let parent = Path::new(db_path).parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = parent {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create {} for the notes database", dir.display()))?;
    }
    connect(db_path)
}

/// Open a database that `marginalia init` already created.
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).is_file() {
        anyhow::bail!("No notes database at {db_path}. Run `marginalia init` first.");
    }
    connect(db_path)
}

/// WAL keeps page reads from waiting on a publish in progress.
fn connect(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("Cannot open notes database {db_path}"))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    schema::create_tables(&conn)?;
    Ok(conn)
}

/// `initialize`, wrapped for the web server.
pub fn initialize_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    Ok(Arc::new(SqliteDatabase::new(initialize(db_path)?)))
}

/// `open`, wrapped for the web server.
pub fn open_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    Ok(Arc::new(SqliteDatabase::new(open(db_path)?)))
}
