//! `strata set` — reconcile a value for a period in one transaction.

use crate::cmd::{Context, cells_for, parse_timestamp, require_entity};
use crate::output::{CliError, OutputMode, render, render_error};
use clap::Args;
use serde::Serialize;
use strata_core::{
    DecisionEvent, Interval, SetOptions, SqliteStore, TemporalRecord, set_for_period,
};

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Table name.
    pub table: String,

    /// Key cell as column=value (repeatable).
    #[arg(long, required = true, value_name = "COLUMN=VALUE")]
    pub key: Vec<String>,

    /// Value cell as column=value (repeatable).
    #[arg(long, value_name = "COLUMN=VALUE")]
    pub value: Vec<String>,

    /// Start of the period (inclusive). Unbounded if omitted.
    #[arg(long, value_name = "TIMESTAMP")]
    pub from: Option<String>,

    /// End of the period (exclusive). Unbounded if omitted.
    #[arg(long, value_name = "TIMESTAMP")]
    pub to: Option<String>,

    /// Keep equal neighbouring periods as separate rows.
    #[arg(long)]
    pub no_coalesce: bool,
}

#[derive(Debug, Serialize)]
struct SetOutput<'a> {
    table: &'a str,
    inserted: Option<Interval>,
    events: &'a [DecisionEvent],
}

pub fn run_set(args: &SetArgs, ctx: &Context, output: OutputMode) -> anyhow::Result<()> {
    let mut conn = ctx.open()?;
    let schema = require_entity(&conn, &args.table)?;

    let mut builder = TemporalRecord::builder();
    for cell in cells_for(schema.key_columns(), &args.key, "key")? {
        builder = builder.key(cell);
    }
    for cell in cells_for(schema.value_columns(), &args.value, "value")? {
        builder = builder.value(cell);
    }
    if args.from.is_none() && args.to.is_none() {
        builder = builder.period(Interval::always());
    }
    if let Some(from) = &args.from {
        builder = builder.value_from(parse_timestamp(from)?);
    }
    if let Some(to) = &args.to {
        builder = builder.value_to(parse_timestamp(to)?);
    }
    let candidate = builder.build()?;

    let mut options = SetOptions::from(&ctx.config.temporal);
    if args.no_coalesce {
        options.coalesce = false;
    }

    let tx = conn.transaction()?;
    let result = {
        let mut store = SqliteStore::new(&tx, schema);
        set_for_period(&mut store, candidate, &options)
    };
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            render_error(output, &CliError::from(&e))?;
            // dropping the transaction rolls it back
            return Err(e.into());
        }
    };
    tx.commit()?;

    let report = SetOutput {
        table: &args.table,
        inserted: outcome.inserted,
        events: &outcome.events,
    };
    render(output, &report, |report, w| {
        for event in report.events {
            writeln!(w, "{event}")?;
        }
        Ok(())
    })
}
