//! `strata history` — every period recorded for one key.

use crate::cmd::{Context, cells_for, require_entity};
use crate::output::{OutputMode, render};
use clap::Args;
use serde::Serialize;
use strata_core::{EntitySchema, Interval, SqliteStore, TemporalRecord, Value};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Table name.
    pub table: String,

    /// Key cell as column=value (repeatable).
    #[arg(long, required = true, value_name = "COLUMN=VALUE")]
    pub key: Vec<String>,
}

/// One row as shown to users.
#[derive(Debug, Serialize)]
pub struct RowView {
    pub id: Option<i64>,
    pub period: Interval,
    pub value: Vec<Value>,
    /// `column='value'` rendering used by human output.
    #[serde(skip)]
    pub pretty: String,
}

impl RowView {
    pub fn new(schema: &EntitySchema, record: TemporalRecord) -> Self {
        Self {
            id: record.id.map(|id| id.0),
            period: record.interval,
            pretty: schema.pretty_value(&record.value),
            value: record.value,
        }
    }
}

pub fn run_history(args: &HistoryArgs, ctx: &Context, output: OutputMode) -> anyhow::Result<()> {
    let conn = ctx.open()?;
    let schema = require_entity(&conn, &args.table)?;
    let key = cells_for(schema.key_columns(), &args.key, "key")?;

    let mut store = SqliteStore::new(&conn, schema.clone());
    let rows: Vec<RowView> = store
        .history(&key)?
        .into_iter()
        .map(|record| RowView::new(&schema, record))
        .collect();

    render(output, &rows, |rows, w| {
        if rows.is_empty() {
            return writeln!(w, "no periods for {}", schema.pretty_key(&key));
        }
        for row in rows {
            writeln!(w, "{}  {}", row.period, row.pretty)?;
        }
        Ok(())
    })
}
