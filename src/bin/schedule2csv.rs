use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use cost_report_tables::catalog::ScheduleCatalog;
use cost_report_tables::header::DEFAULT_HEADER_CUTOFF;
use cost_report_tables::{
    ExtractOptions, ExtractionReport, InMemoryWordSource, PdfWordSource, ScheduleSelection,
    extract_schedules,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "schedule2csv",
    version,
    about = "Rebuild cost report schedules from PDF page text into CSV tables"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract schedules and write one CSV per schedule.
    Extract(ExtractArgs),
    /// List the schedules of a catalog with their strategy and pages.
    Schedules(CatalogArgs),
}

#[derive(Debug, Args)]
struct CatalogArgs {
    /// Schedule catalog JSON. Defaults to the built-in cost report catalog.
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long, conflicts_with = "words", required_unless_present = "words")]
    input: Option<PathBuf>,

    /// Word dump JSON (pages of {text, x0, top}) to use instead of a PDF.
    #[arg(long)]
    words: Option<PathBuf>,

    /// Directory receiving <schedule>.csv files.
    #[arg(short, long)]
    output_dir: PathBuf,

    #[command(flatten)]
    catalog: CatalogArgs,

    /// Only extract these schedules, comma separated.
    #[arg(long)]
    schedule: Option<String>,

    /// Vertical offset above which page text is treated as header.
    #[arg(long, default_value_t = DEFAULT_HEADER_CUTOFF)]
    header_cutoff: f64,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Print every warning and a per-schedule summary.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    if !args.delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character");
    }
    if args.header_cutoff.is_nan() || args.header_cutoff <= 0.0 {
        bail!("header cutoff must be a positive number");
    }

    let schedules = args
        .schedule
        .as_deref()
        .map(ScheduleSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid schedule selection: {error}"))
        .context("failed to parse --schedule")?;

    Ok(ExtractOptions {
        header_cutoff: args.header_cutoff,
        delimiter: args.delimiter as u8,
        schedules,
    })
}

fn load_catalog(args: &CatalogArgs) -> Result<ScheduleCatalog> {
    match &args.catalog {
        Some(path) => ScheduleCatalog::from_path(path)
            .with_context(|| format!("failed to load catalog '{}'", path.display())),
        None => Ok(ScheduleCatalog::hospital_cost_report()),
    }
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    let warnings = report
        .schedules
        .iter()
        .flat_map(|schedule| &schedule.warnings)
        .collect::<Vec<_>>();
    if !warnings.is_empty() {
        eprintln!("warning: {} issue(s) detected", warnings.len());
    }
    if !verbose {
        return;
    }

    for warning in warnings {
        eprintln!("  - {warning}");
    }
    for schedule in &report.schedules {
        let output = schedule
            .output
            .as_ref()
            .map_or_else(|| "-".to_string(), |path| path.display().to_string());
        eprintln!(
            "{:<24} {:<8} rows={:<5} columns={:<4} {output}",
            schedule.name,
            schedule.status.as_str(),
            schedule.row_count,
            schedule.column_count
        );
        if let Some(error) = &schedule.error {
            eprintln!("  error: {error}");
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    let options = parse_options(args)?;
    let catalog = load_catalog(&args.catalog)?;

    if let Some(words) = &args.words {
        let source = InMemoryWordSource::from_json_path(words)
            .with_context(|| format!("failed to read word dump '{}'", words.display()))?;
        return extract_schedules(&source, &catalog, &args.output_dir, &options)
            .with_context(|| format!("failed to extract schedules from '{}'", words.display()));
    }

    let input = args
        .input
        .as_ref()
        .ok_or_else(|| anyhow!("either --input or --words is required"))?;
    let source = PdfWordSource::open(input)
        .with_context(|| format!("failed to open '{}'", input.display()))?;
    extract_schedules(&source, &catalog, &args.output_dir, &options)
        .with_context(|| format!("failed to extract schedules from '{}'", input.display()))
}

fn run_list(args: &CatalogArgs) -> Result<()> {
    let catalog = load_catalog(args)?;
    for spec in &catalog.schedules {
        let pages = spec
            .layout
            .pages()
            .iter()
            .map(|index| (index + 1).to_string())
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "{:<24} {:<28} pages {pages}",
            spec.name,
            spec.layout.strategy().name()
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cost_report_tables=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                if report.has_failures() {
                    ExitCode::from(1)
                } else if report.row_count() > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
        Commands::Schedules(args) => match run_list(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
