//! stone-report: turn a detection service response into a PDF report.
//!
//! Usage:
//!   stone-report response.json                 Write the report to the current directory
//!   stone-report response.json --out-dir DIR   Write the report into DIR

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use stone_report::{config, export_async, save_report, UpstreamResponse};

#[derive(Parser, Debug)]
#[command(name = "stone-report", version, about = "Kidney stone detection PDF report generator")]
struct Cli {
    /// Detection service JSON response
    input: PathBuf,

    /// Directory the report is saved into
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    stone_report::init_tracing();
    let cli = Cli::parse();
    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);

    let json = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let (patient, detection) = UpstreamResponse::from_json(&json)
        .and_then(UpstreamResponse::into_engine_input)
        .with_context(|| format!("Unusable detection response in {}", cli.input.display()))?;

    let report = export_async(patient, detection).await?;
    let path = save_report(&report, &cli.out_dir)
        .with_context(|| format!("Failed to save report into {}", cli.out_dir.display()))?;

    println!("{}", path.display());
    Ok(())
}
