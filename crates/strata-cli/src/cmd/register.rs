//! `strata register` — create a temporal table and record its schema.

use crate::cmd::Context;
use crate::output::{OutputMode, pretty_kv, render};
use clap::Args;
use serde::Serialize;
use strata_core::EntitySchema;
use strata_core::db::registry::register_entity;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Table name.
    pub table: String,

    /// Key column (repeatable).
    #[arg(long = "key", required = true, value_name = "COLUMN")]
    pub keys: Vec<String>,

    /// Value column (repeatable). Defaults to every non-key column.
    #[arg(long = "value", value_name = "COLUMN")]
    pub values: Vec<String>,

    /// Extra column stored but not compared (repeatable).
    #[arg(long = "column", value_name = "COLUMN")]
    pub columns: Vec<String>,

    /// Do not create the overlap triggers.
    #[arg(long)]
    pub no_exclude: bool,
}

#[derive(Debug, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub key_columns: Vec<String>,
    pub value_columns: Vec<String>,
    pub columns: Vec<String>,
    pub exclude_constraint: bool,
}

impl From<&EntitySchema> for TableSummary {
    fn from(schema: &EntitySchema) -> Self {
        Self {
            table: schema.table().to_string(),
            key_columns: schema.key_columns().to_vec(),
            value_columns: schema.value_columns().to_vec(),
            columns: schema.columns().to_vec(),
            exclude_constraint: schema.exclude_constraint(),
        }
    }
}

/// Schema described by the register flags.
pub fn schema_from_args(args: &RegisterArgs) -> EntitySchema {
    let columns = args
        .keys
        .iter()
        .chain(&args.values)
        .chain(&args.columns)
        .cloned();
    let mut schema = EntitySchema::new(args.table.clone(), args.keys.iter().cloned(), columns);
    if !args.values.is_empty() {
        schema = schema.with_value_columns(args.values.iter().cloned());
    }
    if args.no_exclude {
        schema = schema.without_exclude_constraint();
    }
    schema
}

pub fn run_register(args: &RegisterArgs, ctx: &Context, output: OutputMode) -> anyhow::Result<()> {
    let schema = schema_from_args(args);
    let conn = ctx.open()?;
    register_entity(&conn, &schema)?;

    render(output, &TableSummary::from(&schema), |summary, w| {
        writeln!(w, "✓ registered {}", summary.table)?;
        pretty_kv(w, "keys", summary.key_columns.join(", "))?;
        pretty_kv(w, "values", summary.value_columns.join(", "))?;
        pretty_kv(
            w,
            "overlaps",
            if summary.exclude_constraint {
                "rejected"
            } else {
                "allowed"
            },
        )
    })
}
