//! `callreport-cli`: fetch Call Report facts for a batch of RSSD IDs and
//! write them to a CSV or JSON file.
//!
//! ```text
//! callreport-cli --ids 1842065,480228 --period 2019/03/31
//! ```
//!
//! Credentials are read from `FFIEC_USERNAME` and `FFIEC_PASSPHRASE` unless
//! given as flags. Log verbosity follows `RUST_LOG` (default `info`).

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use callreport::{
    BatchReport, CallReportPipeline, Credentials, ExportFormat, FfiecConfig, FfiecProvider,
    IdentifierOutcome, MappingSource, PipelineOptions, ReportingPeriod, parse_identifier_list,
};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Rows shown in the terminal preview.
const PREVIEW_ROWS: usize = 10;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Format {
    Csv,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => Self::Csv,
            Format::Json => Self::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "callreport-cli",
    version,
    about = "Retrieve FFIEC Call Report XBRL facts and export them as a table"
)]
struct Cli {
    /// CDR web service username
    #[arg(long, env = "FFIEC_USERNAME")]
    username: String,

    /// CDR web service security token
    #[arg(long, env = "FFIEC_PASSPHRASE", hide_env_values = true)]
    passphrase: String,

    /// Comma-separated RSSD IDs, e.g. "1842065, 480228"
    #[arg(long)]
    ids: String,

    /// Reporting period end date (YYYY/MM/DD or YYYY-MM-DD)
    #[arg(long)]
    period: ReportingPeriod,

    /// MDRM reference CSV used for labels
    #[arg(long, env = "MDRM_PATH", default_value = callreport::DEFAULT_MDRM_PATH)]
    mapping: PathBuf,

    /// Skip labeling entirely
    #[arg(long)]
    no_labels: bool,

    /// Override the service endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Directory the export file is written to
    #[arg(short = 'o', long, default_value = ".")]
    output_dir: PathBuf,

    /// Export format
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Identifiers processed at once
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

impl Cli {
    fn service_config(&self) -> FfiecConfig {
        let config = FfiecConfig::default().with_timeout(Duration::from_secs(self.timeout_secs));
        match &self.endpoint {
            Some(endpoint) => config.with_endpoint(endpoint.as_str()),
            None => config,
        }
    }

    fn pipeline_options(&self) -> PipelineOptions {
        let mapping = if self.no_labels {
            MappingSource::Disabled
        } else {
            MappingSource::File(self.mapping.clone())
        };
        PipelineOptions::default()
            .with_mapping(mapping)
            .with_concurrency(self.concurrency)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Reject an empty list before touching the network.
    let identifiers = parse_identifier_list(&cli.ids)?;

    let provider = FfiecProvider::new(
        Credentials::new(cli.username.as_str(), cli.passphrase.as_str()),
        cli.service_config(),
    )?;
    let pipeline = CallReportPipeline::new(Arc::new(provider), cli.pipeline_options());

    let report = pipeline
        .run_identifiers(&identifiers, &cli.period)
        .await
        .context("Call Report retrieval failed")?;

    print_summary(&report);
    print_preview(&report);

    let path = export(&report, &cli)?;
    println!("Data saved to {}", path.display());
    Ok(())
}

fn print_summary(report: &BatchReport) {
    let total = report.identifiers.len();
    for (index, entry) in report.identifiers.iter().enumerate() {
        let status = match &entry.outcome {
            IdentifierOutcome::Retrieved { rows } => format!("{rows} facts"),
            IdentifierOutcome::NoData => "no data".to_string(),
            IdentifierOutcome::Failed(_) => "failed".to_string(),
        };
        println!("[{}/{total}] RSSD ID {}: {status}", index + 1, entry.identifier);
    }

    for advisory in report.advisories() {
        eprintln!("warning: {advisory}");
    }
}

fn print_preview(report: &BatchReport) {
    let table = &report.table;
    println!();
    println!("{} rows retrieved", table.len());
    for row in table.rows().take(PREVIEW_ROWS) {
        match row.label {
            Some(label) => println!(
                "{:>10}  {:<10} {:>16}  {:>4}  {label}",
                row.rssd_id, row.id, row.value, row.decimal
            ),
            None => println!(
                "{:>10}  {:<10} {:>16}  {:>4}",
                row.rssd_id, row.id, row.value, row.decimal
            ),
        }
    }
    if table.len() > PREVIEW_ROWS {
        println!("... {} more", table.len() - PREVIEW_ROWS);
    }
    println!();
}

fn export(report: &BatchReport, cli: &Cli) -> anyhow::Result<PathBuf> {
    if !cli.output_dir.is_dir() {
        bail!("Output directory {} does not exist", cli.output_dir.display());
    }

    let format = ExportFormat::from(cli.format);
    let path = cli.output_dir.join(format.file_name(&cli.period));
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;

    report.table.write(format, BufWriter::new(file))?;
    info!(path = %path.display(), rows = report.table.len(), %format, "Export written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["callreport-cli", "--username", "u", "--passphrase", "p"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["--ids", "1842065", "--period", "2019/03/31"]);

        assert_eq!(cli.period.as_file_stem(), "2019_03_31");
        assert_eq!(cli.concurrency, 1);
        assert!(matches!(cli.format, Format::Csv));

        let config = cli.service_config();
        assert_eq!(config, FfiecConfig::default());

        let options = cli.pipeline_options();
        assert_eq!(
            options.mapping,
            MappingSource::File(PathBuf::from(callreport::DEFAULT_MDRM_PATH))
        );
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&[
            "--ids",
            "1,2",
            "--period",
            "2020-12-31",
            "--endpoint",
            "http://127.0.0.1:9/svc",
            "--timeout-secs",
            "5",
            "--format",
            "json",
            "--concurrency",
            "4",
            "--no-labels",
        ]);

        let config = cli.service_config();
        assert_eq!(config.endpoint, "http://127.0.0.1:9/svc");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(ExportFormat::from(cli.format), ExportFormat::Json);

        let options = cli.pipeline_options();
        assert_eq!(options.mapping, MappingSource::Disabled);
        assert_eq!(options.concurrency, 4);
    }

    #[test]
    fn test_bad_period_is_rejected() {
        let argv = [
            "callreport-cli",
            "--username",
            "u",
            "--passphrase",
            "p",
            "--ids",
            "1",
            "--period",
            "31/03/2019",
        ];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
