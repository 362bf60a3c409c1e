//! Entity declarations and the DDL that backs them.
//!
//! A temporal table always has the same shape: a surrogate `id`, the
//! entity's declared columns, and the `valid_from`/`valid_to` period bounds
//! stored as epoch microseconds (`NULL` = unbounded). Two constraints are
//! attached when the schema is registered:
//!
//! - a `CHECK` that rejects empty or inverted periods
//! - `BEFORE INSERT`/`BEFORE UPDATE` triggers that abort with
//!   [`OVERLAP_ABORT`] when a row would share an instant with another row for
//!   the same key
//!
//! Both run inside SQLite, so writers from other processes cannot bypass them.

use std::fmt::Write as _;

use crate::error::TemporalError;
use crate::record::{TemporalRecord, Value};

/// Prefix of the message the overlap triggers abort with.
pub const OVERLAP_ABORT: &str = "temporal overlap";

pub const ID_COLUMN: &str = "id";
pub const FROM_COLUMN: &str = "valid_from";
pub const TO_COLUMN: &str = "valid_to";

const RESERVED_COLUMNS: [&str; 3] = [ID_COLUMN, FROM_COLUMN, TO_COLUMN];

/// Static description of a temporal table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    table: String,
    key_columns: Vec<String>,
    value_columns: Vec<String>,
    columns: Vec<String>,
    exclude_constraint: bool,
}

impl EntitySchema {
    /// Declare a table with its key columns and every data column.
    ///
    /// Value columns default to every declared column that is not a key
    /// column or one of the reserved `id`/`valid_from`/`valid_to` columns.
    /// An entity without key columns gets no default value columns.
    pub fn new<K, C, S, T>(table: impl Into<String>, key_columns: K, columns: C) -> Self
    where
        K: IntoIterator<Item = S>,
        C: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let key_columns: Vec<String> = key_columns.into_iter().map(Into::into).collect();
        let mut all: Vec<String> = key_columns
            .iter()
            .filter(|k| !RESERVED_COLUMNS.contains(&k.as_str()))
            .cloned()
            .collect();
        for column in columns.into_iter().map(Into::into) {
            if !all.contains(&column) && !RESERVED_COLUMNS.contains(&column.as_str()) {
                all.push(column);
            }
        }

        let value_columns = if key_columns.is_empty() {
            Vec::new()
        } else {
            all.iter()
                .filter(|c| !key_columns.contains(c))
                .cloned()
                .collect()
        };

        Self {
            table: table.into(),
            key_columns,
            value_columns,
            columns: all,
            exclude_constraint: true,
        }
    }

    /// Override the derived value columns.
    #[must_use]
    pub fn with_value_columns<V, S>(mut self, value_columns: V) -> Self
    where
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_columns = value_columns.into_iter().map(Into::into).collect();
        for column in &self.value_columns {
            if !self.columns.contains(column) {
                self.columns.push(column.clone());
            }
        }
        self
    }

    /// Skip the overlap triggers for this table.
    #[must_use]
    pub const fn without_exclude_constraint(mut self) -> Self {
        self.exclude_constraint = false;
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    #[must_use]
    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    /// Every data column, key columns first.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether overlap triggers are emitted. Always false for unkeyed tables.
    #[must_use]
    pub fn exclude_constraint(&self) -> bool {
        self.exclude_constraint && self.is_keyed()
    }

    #[must_use]
    pub fn is_keyed(&self) -> bool {
        !self.key_columns.is_empty()
    }

    /// `name='k'` pairs for every key column.
    #[must_use]
    pub fn pretty_key(&self, key: &[Value]) -> String {
        pairs(&self.key_columns, key)
    }

    /// The bare value for a single value column, otherwise `name='v'` pairs.
    #[must_use]
    pub fn pretty_value(&self, value: &[Value]) -> String {
        match value {
            [single] if self.value_columns.len() == 1 => single.to_string(),
            _ => pairs(&self.value_columns, value),
        }
    }

    /// Reject records whose key or value arity does not fit this table.
    ///
    /// # Errors
    ///
    /// [`TemporalError::SchemaMismatch`] on an arity mismatch.
    pub fn check_record(&self, record: &TemporalRecord) -> Result<(), TemporalError> {
        let mismatch = |what: &str, expected: usize, actual: usize| TemporalError::SchemaMismatch {
            table: self.table.clone(),
            detail: format!("expected {expected} {what} cells, got {actual}"),
        };
        if record.key.len() != self.key_columns.len() {
            return Err(mismatch("key", self.key_columns.len(), record.key.len()));
        }
        if record.value.len() != self.value_columns.len() {
            return Err(mismatch("value", self.value_columns.len(), record.value.len()));
        }
        Ok(())
    }
}

fn pairs(names: &[String], cells: &[Value]) -> String {
    names
        .iter()
        .zip(cells)
        .map(|(name, cell)| format!("{name}={}", cell.repr()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A Rust type stored as a temporal table.
pub trait TemporalEntity {
    /// Columns identifying the same entity across time.
    fn key_columns() -> &'static [&'static str];

    /// Every data column of the table, key columns included.
    fn columns() -> &'static [&'static str];

    /// Explicit value columns; `None` derives them by exclusion.
    fn value_columns() -> Option<&'static [&'static str]> {
        None
    }

    fn exclude_constraint() -> bool {
        true
    }

    /// Defaults to the type name in `snake_case`.
    fn table_name() -> String {
        let full = std::any::type_name::<Self>();
        let short = full.split('<').next().unwrap_or(full);
        de_hump(short.rsplit("::").next().unwrap_or(short))
    }

    fn schema() -> EntitySchema {
        let mut schema = EntitySchema::new(
            Self::table_name(),
            Self::key_columns().iter().copied(),
            Self::columns().iter().copied(),
        );
        if let Some(values) = Self::value_columns() {
            schema = schema.with_value_columns(values.iter().copied());
        }
        if !Self::exclude_constraint() {
            schema = schema.without_exclude_constraint();
        }
        schema
    }

    /// Convert into a transient record for [`crate::engine::set_for_period`].
    fn into_record(self) -> TemporalRecord;
}

/// `SomeThing` -> `some_thing`.
#[must_use]
pub fn de_hump(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            out.push(ch);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// DDL
// ---------------------------------------------------------------------------

/// Quote an SQL identifier.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// `CREATE TABLE` for the entity, including the non-empty period `CHECK`.
#[must_use]
pub fn create_table_sql(schema: &EntitySchema) -> String {
    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {ID_COLUMN} INTEGER PRIMARY KEY AUTOINCREMENT,\n",
        quote_ident(schema.table())
    );
    for column in schema.columns() {
        let _ = writeln!(sql, "    {},", quote_ident(column));
    }
    let _ = write!(
        sql,
        "    {FROM_COLUMN} INTEGER,\n    {TO_COLUMN} INTEGER,\n    \
         CHECK ({FROM_COLUMN} IS NULL OR {TO_COLUMN} IS NULL OR {FROM_COLUMN} < {TO_COLUMN})\n);\n"
    );
    let mut index_columns: Vec<String> =
        schema.key_columns().iter().map(|c| quote_ident(c)).collect();
    index_columns.push(FROM_COLUMN.to_string());
    let _ = writeln!(
        sql,
        "CREATE INDEX IF NOT EXISTS {} ON {} ({});",
        quote_ident(&timeline_index_name(schema.table())),
        quote_ident(schema.table()),
        index_columns.join(", ")
    );
    sql
}

/// Name of the key + start index created for every table.
#[must_use]
pub fn timeline_index_name(table: &str) -> String {
    format!("idx_{table}_timeline")
}

/// Names of the overlap triggers for `table`.
#[must_use]
pub fn overlap_trigger_names(table: &str) -> [String; 2] {
    [
        format!("{table}_no_overlap_insert"),
        format!("{table}_no_overlap_update"),
    ]
}

/// Overlap triggers emulating an exclusion constraint on (key, period).
///
/// Empty when the schema has no key columns or the constraint is disabled.
#[must_use]
pub fn constraint_sql(schema: &EntitySchema) -> String {
    if !schema.exclude_constraint() {
        return String::new();
    }
    let table = quote_ident(schema.table());
    let same_key = schema
        .key_columns()
        .iter()
        .map(|c| {
            let c = quote_ident(c);
            format!("existing.{c} = NEW.{c}")
        })
        .collect::<Vec<_>>()
        .join(" AND ");
    let overlap = format!(
        "(existing.{TO_COLUMN} IS NULL OR NEW.{FROM_COLUMN} IS NULL OR existing.{TO_COLUMN} > NEW.{FROM_COLUMN}) \
         AND (NEW.{TO_COLUMN} IS NULL OR existing.{FROM_COLUMN} IS NULL OR NEW.{TO_COLUMN} > existing.{FROM_COLUMN})"
    );
    let abort = quote_literal(&format!("{OVERLAP_ABORT}: {}", schema.table()));
    let [insert_name, update_name] = overlap_trigger_names(schema.table());

    let mut sql = String::new();
    for (name, event, extra) in [
        (insert_name, "INSERT", ""),
        (update_name, "UPDATE", " AND existing.id <> NEW.id"),
    ] {
        let _ = write!(
            sql,
            "CREATE TRIGGER IF NOT EXISTS {name}\nBEFORE {event} ON {table}\nWHEN EXISTS (\n    \
             SELECT 1 FROM {table} AS existing\n    WHERE {same_key}{extra}\n      AND {overlap}\n)\n\
             BEGIN\n    SELECT RAISE(ABORT, {abort});\nEND;\n",
            name = quote_ident(&name),
        );
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Booking;

    impl TemporalEntity for Booking {
        fn key_columns() -> &'static [&'static str] {
            &["hotel", "room"]
        }

        fn columns() -> &'static [&'static str] {
            &["hotel", "room", "guest"]
        }

        fn into_record(self) -> TemporalRecord {
            unreachable!("schema-only fixture")
        }
    }

    struct SomeThing;

    impl TemporalEntity for SomeThing {
        fn key_columns() -> &'static [&'static str] {
            &["key"]
        }

        fn columns() -> &'static [&'static str] {
            &["key", "a", "b"]
        }

        fn value_columns() -> Option<&'static [&'static str]> {
            Some(&["a"])
        }

        fn exclude_constraint() -> bool {
            false
        }

        fn into_record(self) -> TemporalRecord {
            unreachable!("schema-only fixture")
        }
    }

    #[test]
    fn value_columns_derived_by_exclusion() {
        let schema = EntitySchema::new("symbol", ["type"], ["type", "value"]);
        assert_eq!(schema.value_columns(), ["value"]);

        let schema = EntitySchema::new("it", ["key"], ["key", "a", "b", "id", "valid_from"]);
        assert_eq!(schema.value_columns(), ["a", "b"]);
        assert_eq!(schema.columns(), ["key", "a", "b"]);
    }

    #[test]
    fn no_key_columns_means_no_values_and_no_constraint() {
        let schema = EntitySchema::new("no_keys", Vec::<String>::new(), ["col"]);
        assert!(schema.value_columns().is_empty());
        assert!(!schema.is_keyed());
        assert!(!schema.exclude_constraint());
        assert!(constraint_sql(&schema).is_empty());
    }

    #[test]
    fn entity_trait_builds_schema() {
        let schema = Booking::schema();
        assert_eq!(schema.table(), "booking");
        assert_eq!(schema.key_columns(), ["hotel", "room"]);
        assert_eq!(schema.value_columns(), ["guest"]);
        assert!(schema.exclude_constraint());

        let schema = SomeThing::schema();
        assert_eq!(schema.table(), "some_thing");
        assert_eq!(schema.value_columns(), ["a"]);
        assert!(!schema.exclude_constraint());
    }

    #[test]
    fn de_hump_cases() {
        assert_eq!(de_hump("SomeThing"), "some_thing");
        assert_eq!(de_hump("Model"), "model");
        assert_eq!(de_hump("already_snake"), "already_snake");
    }

    #[test]
    fn pretty_key_and_value() {
        let single = EntitySchema::new("model", ["key"], ["key", "value"]);
        assert_eq!(single.pretty_key(&["k".into()]), "key='k'");
        assert_eq!(single.pretty_value(&["v".into()]), "v");

        let multi = EntitySchema::new("model", ["key"], ["key", "value1", "value2"]);
        assert_eq!(
            multi.pretty_value(&["v1".into(), "v2".into()]),
            "value1='v1', value2='v2'"
        );

        let booking = Booking::schema();
        assert_eq!(
            booking.pretty_key(&["h1".into(), Value::Integer(2)]),
            "hotel='h1', room=2"
        );
    }

    #[test]
    fn ddl_mentions_check_and_triggers() {
        let schema = Booking::schema();
        let table = create_table_sql(&schema);
        assert!(table.contains("CREATE TABLE IF NOT EXISTS \"booking\""));
        assert!(table.contains("CHECK (valid_from IS NULL OR valid_to IS NULL OR valid_from < valid_to)"));
        assert!(table.contains("\"idx_booking_timeline\""));

        let triggers = constraint_sql(&schema);
        assert!(triggers.contains("BEFORE INSERT ON \"booking\""));
        assert!(triggers.contains("BEFORE UPDATE ON \"booking\""));
        assert!(triggers.contains("existing.\"hotel\" = NEW.\"hotel\" AND existing.\"room\" = NEW.\"room\""));
        assert!(triggers.contains("RAISE(ABORT, 'temporal overlap: booking')"));
    }

    #[test]
    fn ddl_is_valid_sqlite() -> rusqlite::Result<()> {
        let conn = rusqlite::Connection::open_in_memory()?;
        let schema = Booking::schema();
        conn.execute_batch(&create_table_sql(&schema))?;
        conn.execute_batch(&constraint_sql(&schema))?;
        // idempotent
        conn.execute_batch(&create_table_sql(&schema))?;
        conn.execute_batch(&constraint_sql(&schema))?;
        Ok(())
    }

    #[test]
    fn check_record_arity() {
        let schema = EntitySchema::new("model", ["key"], ["key", "value"]);
        let good = TemporalRecord::new(
            vec!["k".into()],
            crate::interval::Interval::always(),
            vec!["v".into()],
        );
        assert!(schema.check_record(&good).is_ok());
        let bad = TemporalRecord::new(vec![], crate::interval::Interval::always(), vec![]);
        assert!(schema.check_record(&bad).is_err());
    }
}
