//! `strata tables` — list registered tables.

use crate::cmd::Context;
use crate::cmd::register::TableSummary;
use crate::output::{OutputMode, render};
use strata_core::db::registry::list_entities;

pub fn run_tables(ctx: &Context, output: OutputMode) -> anyhow::Result<()> {
    let conn = ctx.open()?;
    let tables: Vec<TableSummary> = list_entities(&conn)?.iter().map(TableSummary::from).collect();

    render(output, &tables, |tables, w| {
        if tables.is_empty() {
            return writeln!(w, "no tables registered");
        }
        for table in tables {
            writeln!(
                w,
                "{}  keys=[{}]  values=[{}]",
                table.table,
                table.key_columns.join(", "),
                table.value_columns.join(", ")
            )?;
        }
        Ok(())
    })
}
