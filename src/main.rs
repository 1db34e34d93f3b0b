use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tsetmc_industries::api::TsetmcClient;
use tsetmc_industries::data_collector::IndustryCollector;
use tsetmc_industries::models::{Config, FailurePolicy};

/// Export TSETMC industry groups and their listed companies to CSV
#[derive(Parser)]
#[command(name = "tsetmc-industries")]
#[command(version = "0.1.0")]
#[command(about = "Export companies grouped by industry from TSETMC to CSV files")]
#[command(long_about = "
Fetches every industrial group from the TSETMC static-data endpoint, then the
companies listed under each group, and writes one `id,symbol,name` CSV per
industry plus a combined `industry,id,symbol,name` CSV.

Settings can also come from the environment or a .env file; flags win.

Examples:
  tsetmc-industries
  tsetmc-industries --output-dir out/industries --combined-file out/all.csv
  tsetmc-industries --on-error skip --industry 27 --industry 44
")]
struct Args {
    /// Directory for the per-industry CSV files
    #[arg(long, short = 'o')]
    output_dir: Option<PathBuf>,

    /// Path of the combined CSV file
    #[arg(long, short = 'c')]
    combined_file: Option<PathBuf>,

    /// What to do when one industry cannot be fetched
    #[arg(long, value_enum)]
    on_error: Option<FailurePolicy>,

    /// Only export these industry codes (repeatable)
    #[arg(long = "industry", short = 'i')]
    industries: Vec<String>,

    /// HTTP timeout per request in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Do not prefix files with a UTF-8 byte order mark
    #[arg(long)]
    no_bom: bool,

    /// Write header-only files for industries without companies
    #[arg(long)]
    write_empty: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Args {
    fn apply(self, mut config: Config) -> Config {
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(path) = self.combined_file {
            config.combined_csv_path = path;
        }
        if let Some(policy) = self.on_error {
            config.failure_policy = policy;
        }
        if let Some(secs) = self.timeout {
            config.request_timeout_secs = secs;
        }
        if self.no_bom {
            config.write_utf8_bom = false;
        }
        if self.write_empty {
            config.write_empty = true;
        }
        config.industry_filter = self.industries;
        config
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "tsetmc_industries=debug"
    } else {
        "tsetmc_industries=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    info!("🚀 TSETMC industry export");

    let config = match Config::from_env() {
        Ok(config) => args.apply(config),
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("❌ Configuration Error: {}", e);
            std::process::exit(1);
        }
    };

    let client = TsetmcClient::new(&config)?;
    let collector = IndustryCollector::new(client, config);

    match collector.run().await {
        Ok(report) => {
            info!(
                "✅ {} of {} industries exported ({} empty, {} failed)",
                report.industries_exported,
                report.industries_discovered,
                report.empty_industries.len(),
                report.failed_industries.len()
            );
            Ok(())
        }
        Err(e) => {
            error!("Export failed: {}", e);
            eprintln!("❌ Export Error: {}", e);
            std::process::exit(1);
        }
    }
}
