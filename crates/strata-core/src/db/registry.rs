//! Registration of entity tables.
//!
//! Registering is the one place entity DDL is emitted: the table with its
//! period `CHECK`, the timeline index, and the overlap triggers. The schema is
//! then written to `entity_registry` so it can be loaded back by name.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::schema::{EntitySchema, constraint_sql, create_table_sql};

/// Create the entity table and its constraints, and record the schema.
///
/// Runs in its own transaction unless the connection is already inside one,
/// in which case the caller's transaction decides the outcome.
///
/// # Errors
///
/// Returns an error if the DDL or the registry write fails.
pub fn register_entity(conn: &Connection, schema: &EntitySchema) -> Result<()> {
    let tx = if conn.is_autocommit() {
        Some(conn.unchecked_transaction()?)
    } else {
        None
    };

    conn.execute_batch(&create_table_sql(schema))
        .with_context(|| format!("create table {}", schema.table()))?;
    let constraints = constraint_sql(schema);
    if !constraints.is_empty() {
        conn.execute_batch(&constraints)
            .with_context(|| format!("create overlap triggers for {}", schema.table()))?;
    }

    conn.execute(
        "INSERT INTO entity_registry (
            table_name,
            key_columns_json,
            value_columns_json,
            columns_json,
            exclude_constraint,
            registered_at_us
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(table_name) DO UPDATE SET
            key_columns_json = excluded.key_columns_json,
            value_columns_json = excluded.value_columns_json,
            columns_json = excluded.columns_json,
            exclude_constraint = excluded.exclude_constraint",
        params![
            schema.table(),
            serde_json::to_string(schema.key_columns())?,
            serde_json::to_string(schema.value_columns())?,
            serde_json::to_string(schema.columns())?,
            schema.exclude_constraint(),
            chrono::Utc::now().timestamp_micros(),
        ],
    )
    .with_context(|| format!("record {} in entity registry", schema.table()))?;

    if let Some(tx) = tx {
        tx.commit()?;
    }
    tracing::info!(
        table = schema.table(),
        keys = schema.key_columns().len(),
        values = schema.value_columns().len(),
        "registered entity"
    );
    Ok(())
}

/// Load a registered schema by table name.
///
/// # Errors
///
/// Returns an error if the query fails or the stored column lists are not
/// valid JSON.
pub fn load_entity(conn: &Connection, table: &str) -> Result<Option<EntitySchema>> {
    let row = conn
        .query_row(
            "SELECT table_name, key_columns_json, value_columns_json, columns_json, exclude_constraint
             FROM entity_registry
             WHERE table_name = ?1",
            [table],
            registry_row,
        )
        .optional()
        .with_context(|| format!("load {table} from entity registry"))?;
    row.map(RegistryRow::into_schema).transpose()
}

/// All registered schemas, ordered by table name.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_entities(conn: &Connection) -> Result<Vec<EntitySchema>> {
    let mut stmt = conn.prepare(
        "SELECT table_name, key_columns_json, value_columns_json, columns_json, exclude_constraint
         FROM entity_registry
         ORDER BY table_name",
    )?;
    let rows = stmt
        .query_map([], registry_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("list entity registry")?;
    rows.into_iter().map(RegistryRow::into_schema).collect()
}

struct RegistryRow {
    table: String,
    key_columns: String,
    value_columns: String,
    columns: String,
    exclude_constraint: bool,
}

fn registry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RegistryRow> {
    Ok(RegistryRow {
        table: row.get(0)?,
        key_columns: row.get(1)?,
        value_columns: row.get(2)?,
        columns: row.get(3)?,
        exclude_constraint: row.get(4)?,
    })
}

impl RegistryRow {
    fn into_schema(self) -> Result<EntitySchema> {
        let decode = |what: &str, json: &str| -> Result<Vec<String>> {
            serde_json::from_str(json)
                .with_context(|| format!("decode {what} for {}", self.table))
        };
        let keys = decode("key columns", &self.key_columns)?;
        let values = decode("value columns", &self.value_columns)?;
        let columns = decode("columns", &self.columns)?;

        let mut schema = EntitySchema::new(self.table.clone(), keys, columns);
        if schema.is_keyed() {
            schema = schema.with_value_columns(values);
        }
        if !self.exclude_constraint {
            schema = schema.without_exclude_constraint();
        }
        Ok(schema)
    }
}
