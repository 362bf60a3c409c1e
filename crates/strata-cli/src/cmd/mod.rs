pub mod at;
pub mod history;
pub mod register;
pub mod set;
pub mod tables;

use anyhow::{Context as _, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use strata_core::config::{StrataConfig, resolve_config};
use strata_core::db::{open_database, registry::load_entity};
use strata_core::{EntitySchema, Timestamp, Value};

/// Resolved configuration and database location for one invocation.
pub struct Context {
    pub config: StrataConfig,
    pub db_path: PathBuf,
}

impl Context {
    pub fn load(project_root: &Path, db_flag: Option<&Path>) -> Result<Self> {
        let config = resolve_config(project_root)?;
        let db_path = db_flag.map_or_else(
            || config.database.resolve_path(project_root),
            |path| project_root.join(path),
        );
        Ok(Self { config, db_path })
    }

    pub fn open(&self) -> Result<Connection> {
        open_database(&self.db_path, self.config.database.busy_timeout())
    }
}

/// Load a registered table or fail with a pointer to `strata register`.
pub fn require_entity(conn: &Connection, table: &str) -> Result<EntitySchema> {
    match load_entity(conn, table)? {
        Some(schema) => Ok(schema),
        None => bail!("table not registered: {table}\n  Run `strata register {table} --key <col>` first."),
    }
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp> {
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .with_context(|| format!("invalid timestamp '{raw}' (expected YYYY-MM-DD[ HH:MM:SS])"))
}

/// Order `col=val` assignments by `columns`, requiring each exactly once.
pub fn cells_for(columns: &[String], assignments: &[String], what: &str) -> Result<Vec<Value>> {
    let mut parsed = Vec::with_capacity(assignments.len());
    for raw in assignments {
        let Some((name, value)) = raw.split_once('=') else {
            bail!("invalid {what} assignment '{raw}' (expected column=value)");
        };
        if !columns.iter().any(|c| c == name) {
            bail!("unknown {what} column '{name}' (expected one of: {})", columns.join(", "));
        }
        if parsed.iter().any(|(n, _)| *n == name) {
            bail!("{what} column '{name}' given twice");
        }
        parsed.push((name, Value::parse_literal(value)));
    }

    columns
        .iter()
        .map(|column| {
            parsed
                .iter()
                .find(|(name, _)| *name == column.as_str())
                .map(|(_, value)| value.clone())
                .with_context(|| format!("missing {what} column '{column}'"))
        })
        .collect()
}
