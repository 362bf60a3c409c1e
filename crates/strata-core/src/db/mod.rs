//! SQLite database utilities.
//!
//! Runtime defaults are intentionally conservative:
//! - `journal_mode = WAL` to allow concurrent readers while a writer reconciles
//! - `busy_timeout = 5s` to reduce transient lock failures under contention
//! - `foreign_keys = ON` to protect relational integrity in bookkeeping tables

pub mod migrations;
pub mod registry;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

/// Busy timeout used when no configuration overrides it.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) a strata database, apply runtime pragmas, and migrate the
/// bookkeeping schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_database(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create database directory {}", parent.display()))?;
    }

    let mut conn =
        Connection::open(path).with_context(|| format!("open database {}", path.display()))?;

    configure_connection(&conn, busy_timeout).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply strata migrations")?;

    Ok(conn)
}

/// An in-memory database with the bookkeeping schema applied.
///
/// # Errors
///
/// Returns an error if migrating fails.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    migrations::migrate(&mut conn).context("apply strata migrations")?;
    Ok(conn)
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}
