//! Alarm Snapshot - Main entry point
//!
//! Reads a daily alarm export, keeps today's open alarms for the selected operators,
//! alarm types and clusters, writes the cleaned table and renders it as a PNG.
//!
//! Usage:
//!   alarm-snapshot --input export.xlsx --operator RJIO --alarm "4G OUTAGE" --cluster Pune-1
//!   cat export.csv | alarm-snapshot --input - --format csv --data-uri

use alarm_snapshot::alarms::{
    read_raw_table, write_clean_table, write_image, SelectionCriteria, SourceFormat, TableSource,
};
use alarm_snapshot::config::AppConfig;
use alarm_snapshot::pipeline::{AlarmFilterPipeline, PipelineOutcome};
use alarm_snapshot::render::TableImageRenderer;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "jemalloc")]
use tikv_jemallocator::Jemalloc;

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "alarm-snapshot", version, about = "Daily open-alarm snapshot as a PNG table")]
struct Cli {
    /// Alarm export (xlsx/xls/ods/csv), or `-` to read stdin
    #[arg(short, long)]
    input: String,

    /// Input format; required for stdin, detected from the extension otherwise
    #[arg(short, long, value_parser = parse_format)]
    format: Option<SourceFormat>,

    /// Operator (SourceInput) to keep; repeat for more. Defaults to the catalog
    #[arg(long = "operator")]
    operators: Vec<String>,

    /// Alarm type (EventName) to keep; repeat for more. Defaults to the catalog
    #[arg(long = "alarm")]
    alarms: Vec<String>,

    /// Cluster to keep; repeat for more. Defaults to the catalog
    #[arg(long = "cluster")]
    clusters: Vec<String>,

    /// Processing date (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the cleaned table and default image
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Image output path
    #[arg(long)]
    image: Option<PathBuf>,

    /// Image resolution
    #[arg(long)]
    dpi: Option<u32>,

    /// Print the image as a data URI on stdout
    #[arg(long)]
    data_uri: bool,
}

fn parse_format(value: &str) -> std::result::Result<SourceFormat, String> {
    SourceFormat::parse(value)
        .ok_or_else(|| format!("unknown format '{}', expected spreadsheet or csv", value))
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // 1. Configuration, with command-line overrides
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = &cli.artifacts {
        config.output.artifacts_dir = dir.clone();
    }
    if let Some(dpi) = cli.dpi {
        config.render.dpi = dpi;
    }

    // 2. Source
    let source = table_source(&cli)?;
    let raw = read_raw_table(&source, config.pipeline.header_row)
        .context("Failed to read alarm export")?;

    // 3. Filter
    let criteria = SelectionCriteria::new(
        non_empty(cli.operators),
        non_empty(cli.alarms),
        non_empty(cli.clusters),
    );
    let processing_date = cli
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let pipeline = AlarmFilterPipeline::new(config.pipeline.clone());
    let cleaned = match pipeline.run(raw, &criteria, processing_date)? {
        PipelineOutcome::Cleaned(table) => table,
        PipelineOutcome::NoData { stage, rows_before } => {
            tracing::warn!(stage = %stage, rows_before, "{}", stage.empty_message());
            return Ok(());
        }
    };

    let clean_path = config.output.clean_data_path();
    write_clean_table(&cleaned.frame, &clean_path)
        .with_context(|| format!("Failed to write {}", clean_path.display()))?;

    // 4. Render
    let renderer = TableImageRenderer::new(config.render.clone()).context("Invalid render settings")?;
    let rendered = renderer
        .render(&cleaned.frame, None, None)
        .context("Failed to render table image")?;

    let image_path = cli.image.clone().unwrap_or_else(|| config.output.image_path());
    write_image(rendered.bytes(), &image_path)
        .with_context(|| format!("Failed to write {}", image_path.display()))?;

    let resolved = criteria.resolve(&pipeline.config().catalog());
    tracing::info!(
        rows = cleaned.frame.height(),
        image = %image_path.display(),
        download_name = %resolved.download_file_name(),
        "Snapshot ready"
    );

    if cli.data_uri {
        println!("{}", rendered.data_uri());
    }

    Ok(())
}

fn table_source(cli: &Cli) -> Result<TableSource> {
    if cli.input != "-" {
        let path = PathBuf::from(&cli.input);
        return Ok(match cli.format {
            // An explicit format wins over the extension
            Some(format) if format != SourceFormat::from_path(&path) => {
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                TableSource::Buffer { bytes, format }
            }
            _ => TableSource::Path(path),
        });
    }

    let Some(format) = cli.format else {
        bail!("--format is required when reading from stdin");
    };
    let mut bytes = Vec::new();
    std::io::stdin()
        .read_to_end(&mut bytes)
        .context("Failed to read stdin")?;
    Ok(TableSource::Buffer { bytes, format })
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}
