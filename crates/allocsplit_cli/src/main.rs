use std::path::PathBuf;
use std::process::ExitCode;

use allocsplit_split::{
    C_SHEET_HINT_DEFAULT, EnumStoreOutcome, EnumTableSource, SpecSplitOptions, SpecSplitRequest,
    TracingEventSink, run_allocation_split,
};
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "allocsplit")]
#[command(about = "Split an allocation workbook into per-store workbooks and code lists")]
#[command(version)]
struct Cli {
    /// Store-list CSV, one store name per line.
    #[arg(long)]
    stores: PathBuf,

    /// Allocation workbook.
    #[arg(long, conflicts_with = "source_dir", required_unless_present = "source_dir")]
    table: Option<PathBuf>,

    /// Directory holding the allocation workbook (first *.xlsx by name).
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Output directory, created when absent.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Allocation sheet name.
    #[arg(long, default_value = C_SHEET_HINT_DEFAULT)]
    sheet: String,

    /// The store list starts with a header record.
    #[arg(long)]
    stores_header: bool,

    /// Log filter (overrides RUST_LOG), e.g. `debug` or `allocsplit_split=debug`.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    if let Err(report) = run(cli) {
        eprintln!("{report:?}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let source = match (cli.table, cli.source_dir) {
        (Some(path), _) => EnumTableSource::File(path),
        (None, Some(dir)) => EnumTableSource::Directory(dir),
        (None, None) => anyhow::bail!("either --table or --source-dir is required"),
    };
    let request = SpecSplitRequest {
        path_stores: cli.stores,
        source,
        dir_output: cli.output_dir,
        options: SpecSplitOptions {
            sheet_hint: cli.sheet,
            if_stores_have_header: cli.stores_header,
            ..Default::default()
        },
    };

    tracing::debug!(?request, "split request");

    let report = run_allocation_split(&request, &TracingEventSink)
        .with_context(|| format!("split into {} failed", request.dir_output.display()))?;

    println!("{report}");
    for (c_store, outcome) in &report.outcomes {
        match outcome {
            EnumStoreOutcome::Written(artifacts) => println!(
                "  {c_store}: {} files, {} lines",
                artifacts.text_files.len() + usize::from(artifacts.workbook.is_some()),
                artifacts.n_lines
            ),
            EnumStoreOutcome::Skipped(reason) => println!("  {c_store}: skipped ({reason:?})"),
            EnumStoreOutcome::Failed { error, .. } => println!("  {c_store}: failed ({error})"),
        }
    }
    Ok(())
}
