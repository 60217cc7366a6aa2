//! # sheetshift-cli
//!
//! Command-line interface for transferring order rows between CSV sheets.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use sheetshift_core::{
    DuplicateHandling, FilterCriteria, FilteredData, TransferConfig, TransferMode,
    TransferReport, TransferRequest, TransferService,
};
use sheetshift_sheet::{MemoryProvider, Sheet, SheetProvider, SheetRef};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const SOURCE_ID: &str = "source";
const DESTINATION_ID: &str = "destination";

/// sheetshift - move order rows between sheets by date and status
#[derive(Parser)]
#[command(name = "sheetshift")]
#[command(author, version, about = "Move order rows between sheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Transfer configuration (YAML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Copy or move matching rows from one CSV sheet to another
    Transfer {
        /// Source CSV file
        #[arg(long, value_name = "FILE")]
        source: PathBuf,

        /// Destination CSV file (must already have a header row)
        #[arg(long, value_name = "FILE")]
        dest: PathBuf,

        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last day of the range, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// Only rows with this status
        #[arg(long)]
        status: Option<String>,

        /// copy keeps the source rows, move deletes them
        #[arg(long, value_enum, default_value = "copy")]
        mode: ModeArg,

        /// How to handle rows already in the destination
        #[arg(long, value_enum, default_value = "skip")]
        duplicates: DuplicatesArg,

        /// Rows per append (overrides the config file)
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Compare a destination's headers with the required set
    Validate {
        /// Source CSV file
        #[arg(long, value_name = "FILE")]
        source: PathBuf,

        /// Destination CSV file
        #[arg(long, value_name = "FILE")]
        dest: PathBuf,
    },

    /// Show the rows a transfer would pick
    Preview {
        /// Source CSV file
        #[arg(long, value_name = "FILE")]
        source: PathBuf,

        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last day of the range, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// Only rows with this status
        #[arg(long)]
        status: Option<String>,

        /// Output format (table, json, csv)
        #[arg(short = 'f', long = "format", value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ModeArg {
    Copy,
    Move,
}

impl From<ModeArg> for TransferMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Copy => TransferMode::Copy,
            ModeArg::Move => TransferMode::Move,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum DuplicatesArg {
    Skip,
    Update,
    AddAll,
}

impl From<DuplicatesArg> for DuplicateHandling {
    fn from(handling: DuplicatesArg) -> Self {
        match handling {
            DuplicatesArg::Skip => DuplicateHandling::Skip,
            DuplicatesArg::Update => DuplicateHandling::Update,
            DuplicatesArg::AddAll => DuplicateHandling::AddAll,
        }
    }
}

/// Output format for previews.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Aligned table output (default)
    #[default]
    Table,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let config = match &cli.config {
        Some(path) => TransferConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => TransferConfig::default(),
    };

    match cli.command {
        Command::Transfer {
            source,
            dest,
            from,
            to,
            status,
            mode,
            duplicates,
            chunk_size,
        } => {
            let config = match chunk_size {
                Some(size) => config.with_chunk_size(size),
                None => config,
            };
            let mut request = TransferRequest::new(
                &sheet_ref(SOURCE_ID, &source)?,
                &sheet_ref(DESTINATION_ID, &dest)?,
                from,
                to,
            )
            .with_mode(mode.into())
            .with_duplicate_handling(duplicates.into());
            request.status = status;
            run_transfer(config, &source, &dest, &request).await
        }
        Command::Validate { source, dest } => run_validate(config, &source, &dest).await,
        Command::Preview {
            source,
            from,
            to,
            status,
            format,
        } => {
            let criteria = FilterCriteria {
                from_date: from,
                to_date: to,
                status,
            };
            run_preview(config, &source, &criteria, format).await
        }
    }
}

/// Sheet reference for a CSV file: a fixed spreadsheet id and the file stem.
fn sheet_ref(spreadsheet_id: &str, path: &Path) -> Result<SheetRef> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Not a file path: {}", path.display()))?;
    Ok(SheetRef::new(spreadsheet_id, name))
}

/// Load a CSV file into the provider under `spreadsheet_id`.
async fn load(provider: &MemoryProvider, spreadsheet_id: &str, path: &Path) -> Result<SheetRef> {
    let sheet_ref = sheet_ref(spreadsheet_id, path)?;
    let sheet = Sheet::from_csv(path)
        .with_context(|| format!("Failed to read CSV: {}", path.display()))?;
    tracing::debug!(sheet = %sheet_ref, rows = sheet.row_count(), "Loaded CSV");
    provider.insert_sheet(&sheet_ref, sheet).await;
    Ok(sheet_ref)
}

/// Write a sheet from the provider back to its CSV file.
async fn save(provider: &MemoryProvider, sheet_ref: &SheetRef, path: &Path) -> Result<()> {
    provider
        .snapshot(sheet_ref)
        .await?
        .save_as_csv(path)
        .with_context(|| format!("Failed to write CSV: {}", path.display()))
}

fn service(provider: &Arc<MemoryProvider>, config: TransferConfig) -> Result<TransferService> {
    TransferService::in_memory(Arc::clone(provider) as Arc<dyn SheetProvider>, config)
        .context("Invalid transfer configuration")
}

/// Run a transfer between two CSV files and write the results back.
async fn run_transfer(
    config: TransferConfig,
    source: &Path,
    dest: &Path,
    request: &TransferRequest,
) -> Result<()> {
    if same_file(source, dest) {
        bail!("Source and destination must be different files");
    }

    let provider = Arc::new(MemoryProvider::new());
    let source_ref = load(&provider, SOURCE_ID, source).await?;
    let dest_ref = load(&provider, DESTINATION_ID, dest).await?;
    let service = service(&provider, config)?;

    let (transfer_id, result) = service.run(request).await;
    let report = TransferReport::from_result(&result);
    let summary = result.with_context(|| format!("Transfer {transfer_id} failed"))?;

    if summary.transferred_rows > 0 {
        save(&provider, &dest_ref, dest).await?;
        if summary.deleted_rows > 0 {
            save(&provider, &source_ref, source).await?;
        }
    }

    println!("{} {}", "✓".green().bold(), report.message);
    if let Some(warning) = &summary.delete_warning {
        println!("{} {warning}", "Warning:".yellow().bold());
    }
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Print missing and extra destination headers.
async fn run_validate(config: TransferConfig, source: &Path, dest: &Path) -> Result<()> {
    let provider = Arc::new(MemoryProvider::new());
    let source_ref = load(&provider, SOURCE_ID, source).await?;
    let dest_ref = load(&provider, DESTINATION_ID, dest).await?;
    let service = service(&provider, config)?;

    match service.validate_headers(&source_ref, &dest_ref).await? {
        None => println!("{} Headers match", "✓".green().bold()),
        Some(mismatch) => {
            println!("{} Headers do not match", "✗".red().bold());
            for header in &mismatch.missing {
                println!("  {} {header}", "missing:".red());
            }
            for header in &mismatch.extra {
                println!("  {} {header}", "extra:".yellow());
            }
        }
    }
    Ok(())
}

/// Print the rows matching the criteria.
async fn run_preview(
    config: TransferConfig,
    source: &Path,
    criteria: &FilterCriteria,
    format: OutputFormat,
) -> Result<()> {
    let provider = Arc::new(MemoryProvider::new());
    let source_ref = load(&provider, SOURCE_ID, source).await?;
    let service = service(&provider, config)?;
    let data = service.filtered_data(&source_ref, criteria).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
        OutputFormat::Csv => {
            let sheet = Sheet::with_rows(
                &source_ref.sheet_name,
                data.headers.clone(),
                data.rows.clone(),
            );
            print!("{}", sheet.to_csv_string());
        }
        OutputFormat::Table => {
            if data.is_empty() {
                println!("(no matching rows)");
            } else {
                println!("{}", format_table(&data));
                println!("{} rows", data.row_count);
            }
        }
    }
    Ok(())
}

/// Render filtered rows as an aligned text table, prefixed with the source
/// row number.
fn format_table(data: &FilteredData) -> String {
    let mut header = vec!["ROW".to_string()];
    header.extend(data.headers.iter().cloned());
    let body: Vec<Vec<String>> = data
        .rows
        .iter()
        .zip(&data.source_row_numbers)
        .map(|(row, number)| {
            let mut line = vec![number.to_string()];
            line.extend(row.iter().cloned());
            line
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for line in &body {
        for (i, cell) in line.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let render = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render(&header).bold().to_string()];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    lines.extend(body.iter().map(|line| render(line)));
    lines.join("\n")
}
