pub mod config;
pub mod error;
pub mod findings;
pub mod location;
pub mod models;
pub mod report;
pub mod risk;
pub mod screen;

use tracing_subscriber::EnvFilter;

pub use error::{ExportError, ReportError};
pub use findings::{normalize, NormalizedFinding};
pub use location::resolve_location;
pub use models::{DetectionResult, PatientRecord, RawFinding, UpstreamResponse};
pub use report::{export, export_async, export_with_dates, save_report, ExportedReport};
pub use risk::{classify_risk, RiskClassification};
pub use screen::ResultsView;

/// Installs the global fmt subscriber. `RUST_LOG` overrides the default
/// filter. Calling it twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
