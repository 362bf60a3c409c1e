#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "strata: temporal tables with non-overlapping periods",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Database file (defaults to the configured path, then
    /// `.strata/strata.sqlite3`).
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Schema",
        about = "Register a temporal table",
        long_about = "Create a temporal table with its period check and overlap triggers, and record it in the registry.",
        after_help = "EXAMPLES:\n    # A price per symbol\n    strata register price --key symbol --value amount\n\n    # Composite key, overlap triggers disabled\n    strata register booking --key hotel --key room --value guest --no-exclude"
    )]
    Register(cmd::register::RegisterArgs),

    #[command(
        next_help_heading = "Write",
        about = "Set a value for a period",
        long_about = "Reconcile a value for one key over a period against the existing timeline, in one transaction.",
        after_help = "EXAMPLES:\n    # From 2001 onwards\n    strata set price --key symbol=ACME --value amount=10 --from 2001-01-01\n\n    # A closed period without merging equal neighbours\n    strata set price --key symbol=ACME --value amount=12 --from 2002-01-01 --to 2003-01-01 --no-coalesce"
    )]
    Set(cmd::set::SetArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show the timeline of a key",
        after_help = "EXAMPLES:\n    strata history price --key symbol=ACME\n    strata history price --key symbol=ACME --json"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show the value in force at an instant",
        after_help = "EXAMPLES:\n    strata at price --key symbol=ACME --at 2002-06-01\n    strata at price --key symbol=ACME --at \"2002-06-01 12:00:00\""
    )]
    At(cmd::at::AtArgs),

    #[command(next_help_heading = "Schema", about = "List registered tables")]
    Tables,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("STRATA_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "strata=debug,info"
        } else {
            "strata=info,warn"
        })
    });

    let format = env::var("STRATA_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let output = cli.output_mode();
    let ctx = cmd::Context::load(&project_root, cli.db.as_deref())?;

    match cli.command {
        Commands::Register(ref args) => cmd::register::run_register(args, &ctx, output),
        Commands::Set(ref args) => cmd::set::run_set(args, &ctx, output),
        Commands::History(ref args) => cmd::history::run_history(args, &ctx, output),
        Commands::At(ref args) => cmd::at::run_at(args, &ctx, output),
        Commands::Tables => cmd::tables::run_tables(&ctx, output),
    }
}
