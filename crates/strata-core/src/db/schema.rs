//! Bookkeeping schema for a strata database.
//!
//! Entity tables are not part of the migrations: each one is created when
//! its schema is registered (see [`crate::db::registry`]). The migrations only
//! own the tables that describe the database itself:
//! - `strata_meta` records the schema version the file was last migrated to
//! - `entity_registry` remembers every registered entity so tools can rebuild
//!   an [`crate::schema::EntitySchema`] from the table name alone

/// Migration v1: metadata and the entity registry.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS strata_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO strata_meta (id, schema_version) VALUES (1, 0);

CREATE TABLE IF NOT EXISTS entity_registry (
    table_name TEXT PRIMARY KEY CHECK (length(trim(table_name)) > 0),
    key_columns_json TEXT NOT NULL,
    value_columns_json TEXT NOT NULL,
    columns_json TEXT NOT NULL,
    exclude_constraint INTEGER NOT NULL DEFAULT 1 CHECK (exclude_constraint IN (0, 1)),
    registered_at_us INTEGER NOT NULL
);
";

pub const REQUIRED_TABLES: &[&str] = &["strata_meta", "entity_registry"];
