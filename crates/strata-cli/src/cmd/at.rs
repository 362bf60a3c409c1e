//! `strata at` — the value in force at one instant.

use crate::cmd::history::RowView;
use crate::cmd::{Context, cells_for, parse_timestamp, require_entity};
use crate::output::{OutputMode, render};
use clap::Args;
use strata_core::SqliteStore;

#[derive(Args, Debug)]
pub struct AtArgs {
    /// Table name.
    pub table: String,

    /// Key cell as column=value (repeatable).
    #[arg(long, required = true, value_name = "COLUMN=VALUE")]
    pub key: Vec<String>,

    /// Instant to look up.
    #[arg(long, value_name = "TIMESTAMP")]
    pub at: String,
}

pub fn run_at(args: &AtArgs, ctx: &Context, output: OutputMode) -> anyhow::Result<()> {
    let conn = ctx.open()?;
    let schema = require_entity(&conn, &args.table)?;
    let key = cells_for(schema.key_columns(), &args.key, "key")?;
    let at = parse_timestamp(&args.at)?;

    let mut store = SqliteStore::new(&conn, schema.clone());
    let row = store
        .value_at(&key, at)?
        .map(|record| RowView::new(&schema, record));

    render(output, &row, |row, w| match row {
        Some(row) => writeln!(w, "{}  ({})", row.pretty, row.period),
        None => writeln!(w, "no value for {} at {at}", schema.pretty_key(&key)),
    })
}
