use rusqlite::Connection;
use std::path::Path;

use crate::errors::Result;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// Owns the single SQLite connection of a run.
///
/// The notifier is a single-writer batch job, so the connection is held
/// for the lifetime of the invocation and handed out mutably.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) the database file. Does not create tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Provides a mutable connection to the closure.
    pub fn with_conn<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        f(&mut self.conn)
    }
}

/// Applies the schema. Safe to call on every run.
pub fn init_db(db: &mut Database) -> Result<()> {
    db.with_conn(|conn| {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    })?;
    log::debug!("Database schema applied");
    Ok(())
}

/// True once `init_db` has created the given table.
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}
