//! CLI entry point for the migration metrics calculator.
//!
//! Provides subcommands for exporting cutover telemetry from Splunk,
//! calculating the dashboard metrics from it, and inspecting ASID lookups.

use anyhow::Result;
use aws_config::meta::region::RegionProviderChain;
use clap::{Args, Parser, Subcommand};
use metrics_calculator::analyzers::analyzer::{calculate_dashboard_metrics, compute_dashboard_report};
use metrics_calculator::analyzers::export::export_splunk_data;
use metrics_calculator::config::{self, Config};
use metrics_calculator::fetch::{BasicClient, auth::ApiKey};
use metrics_calculator::identity::lookup_all_asids;
use metrics_calculator::infra::keys::{KeyStore, SsmKeyStore};
use metrics_calculator::infra::s3::S3ObjectStore;
use metrics_calculator::infra::splunk::SplunkClient;
use metrics_calculator::output::{append_record, write_report_json};
use metrics_calculator::services::{fetch_asid_lookup_tables, fetch_migration_occurrences};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_REGION: &str = "eu-west-2";

#[derive(Parser)]
#[command(name = "metrics_calculator")]
#[command(about = "Measures how long clinical system migrations take to cut over", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute cutover metrics from stored telemetry and publish migrations.json
    CalculateDashboardMetrics {
        #[command(flatten)]
        buckets: BucketArgs,

        /// Also write the report as JSON to this path
        #[arg(long)]
        report_json: Option<String>,

        /// Also append one CSV row per measured migration to this path
        #[arg(long)]
        metrics_csv: Option<String>,

        /// Compute the report without uploading it
        #[arg(long, default_value_t = false)]
        no_publish: bool,
    },
    /// Query Splunk for each migration's telemetry and store it in the telemetry bucket
    ExportSplunkData {
        #[command(flatten)]
        buckets: BucketArgs,
    },
    /// Resolve the old and new ASIDs of every known migration
    LookupAsids {
        #[command(flatten)]
        buckets: BucketArgs,

        /// Write the resolved pairs as JSON to this path
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Bucket names that take precedence over the environment.
#[derive(Args)]
struct BucketArgs {
    #[arg(long)]
    occurrences_bucket: Option<String>,

    #[arg(long)]
    asid_lookup_bucket: Option<String>,

    #[arg(long)]
    telemetry_bucket: Option<String>,

    #[arg(long)]
    metrics_bucket: Option<String>,

    #[arg(long)]
    patient_registrations_bucket: Option<String>,
}

impl BucketArgs {
    fn load_config(&self) -> Result<Config> {
        Config::from_lookup(|name| {
            let flag = match name {
                config::OCCURRENCES_BUCKET_NAME => self.occurrences_bucket.as_ref(),
                config::ASID_LOOKUP_BUCKET_NAME => self.asid_lookup_bucket.as_ref(),
                config::TELEMETRY_BUCKET_NAME => self.telemetry_bucket.as_ref(),
                config::METRICS_BUCKET_NAME => self.metrics_bucket.as_ref(),
                config::PATIENT_REGISTRATIONS_BUCKET_NAME => self.patient_registrations_bucket.as_ref(),
                _ => None,
            };
            flag.cloned().or_else(|| std::env::var(name).ok())
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/metrics_calculator.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("metrics_calculator.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::CalculateDashboardMetrics {
            buckets,
            report_json,
            metrics_csv,
            no_publish,
        } => {
            let config = buckets.load_config()?;
            let store = S3ObjectStore::new(&load_aws_config().await);

            let report = if no_publish {
                info!("Publication disabled, computing report only");
                compute_dashboard_report(&store, &config).await?
            } else {
                calculate_dashboard_metrics(&store, &config).await?
            };

            let Some(report) = report else {
                return Ok(());
            };
            info!(
                mean_cutover_duration = %report.mean_cutover_duration,
                migrations = report.migrations.len(),
                combinations = report.supplier_combination_stats.len(),
                "Dashboard metrics ready"
            );

            if let Some(path) = report_json {
                write_report_json(&path, &report)?;
                info!(path = %path, "Report written");
            }
            if let Some(path) = metrics_csv {
                for metric in &report.migrations {
                    append_record(&path, metric)?;
                }
                info!(path = %path, rows = report.migrations.len(), "Metrics CSV written");
            }
        }
        Commands::ExportSplunkData { buckets } => {
            let config = buckets.load_config()?;
            let splunk = config.require_splunk()?;
            let aws = load_aws_config().await;

            let token = SsmKeyStore::new(&aws).get(&splunk.token_parameter).await?;
            let search = SplunkClient::new(ApiKey::bearer(BasicClient::new(), &token)?, &splunk.base_url);
            let store = S3ObjectStore::new(&aws);

            let summary = export_splunk_data(&store, &search, &config).await?;
            if summary.exported == 0 && summary.skipped > 0 {
                warn!(skipped = summary.skipped, "No migration could be exported");
            }
        }
        Commands::LookupAsids { buckets, output } => {
            let config = buckets.load_config()?;
            let store = S3ObjectStore::new(&load_aws_config().await);

            let migrations = fetch_migration_occurrences(&store, &config.occurrences_bucket).await?;
            let tables = fetch_asid_lookup_tables(&store, &config.asid_lookup_bucket).await?;
            let pairs = lookup_all_asids(&tables, &migrations)?;

            for (ods_code, pair) in &pairs {
                info!(
                    ods_code = %ods_code,
                    old_asid = %pair.old.asid,
                    old_system = %pair.old.name,
                    new_asid = %pair.new.asid,
                    new_system = %pair.new.name,
                    complete = pair.is_complete(),
                    "ASID lookup"
                );
            }

            let complete = pairs.values().filter(|p| p.is_complete()).count();
            info!(
                organisations = pairs.len(),
                complete,
                incomplete = pairs.len() - complete,
                "ASID lookup summary"
            );

            if let Some(path) = output {
                std::fs::write(&path, serde_json::to_string_pretty(&pairs)?)?;
                info!(path = %path, "ASID pairs written");
            }
        }
    }

    Ok(())
}

/// Loads the ambient AWS configuration, defaulting the region to London.
async fn load_aws_config() -> aws_config::SdkConfig {
    let region = RegionProviderChain::default_provider().or_else(DEFAULT_REGION);
    aws_config::from_env().region(region).load().await
}
