//! End-to-end report export: layout, PDF serialization, naming, saving.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, Utc};
use tracing::{error, info};

use super::layout::{layout, LayoutOptions};
use super::render::render_pdf;
use crate::error::{ExportError, ReportError};
use crate::models::{DetectionResult, PatientRecord};

/// A finished report: complete PDF bytes plus the suggested filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
}

/// `KidneyStone_Report_<Name_With_Underscores>_<YYYY-MM-DD>.pdf`
///
/// The name is reduced to `[A-Za-z0-9._-]` so the result is always a single
/// path component.
pub fn report_filename(patient: &PatientRecord, date: NaiveDate) -> String {
    let joined = patient.name.split_whitespace().collect::<Vec<_>>().join("_");
    let safe: String = joined
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let name = match safe.trim_start_matches('.') {
        "" => "Patient",
        name => name,
    };
    format!("KidneyStone_Report_{}_{}.pdf", name, date.format("%Y-%m-%d"))
}

/// Generate the report now. The header carries the local date; the filename
/// carries the UTC date.
pub fn export(patient: &PatientRecord, detection: &DetectionResult) -> Result<ExportedReport, ExportError> {
    export_with_dates(patient, detection, Local::now().date_naive(), Utc::now().date_naive())
}

/// Generate the report with an explicit header date and filename date.
/// Either the whole report is returned or a single [`ExportError`]; no
/// partial bytes escape.
pub fn export_with_dates(
    patient: &PatientRecord,
    detection: &DetectionResult,
    generated_on: NaiveDate,
    file_date: NaiveDate,
) -> Result<ExportedReport, ExportError> {
    let options = LayoutOptions::new(generated_on);
    let document = layout(patient, detection, &options);
    let page_count = document.page_count();

    let bytes = render_pdf(&document, &options.geometry).map_err(|e| {
        error!("Report rendering failed: {e}");
        ExportError::from(e)
    })?;
    let filename = report_filename(patient, file_date);

    info!(
        pages = page_count,
        findings = detection.findings.len(),
        bytes = bytes.len(),
        "Report generated: {filename}"
    );
    Ok(ExportedReport {
        bytes,
        filename,
        page_count,
    })
}

/// Runs [`export`] on the blocking pool. Dropping the future abandons the
/// result; the generation itself owns all of its state.
pub async fn export_async(
    patient: PatientRecord,
    detection: DetectionResult,
) -> Result<ExportedReport, ExportError> {
    tokio::task::spawn_blocking(move || export(&patient, &detection))
        .await
        .map_err(|e| ExportError::from(ReportError::TaskAborted(e.to_string())))?
}

/// Saves the report into `dir` under its suggested filename.
///
/// Bytes go to a temporary file in the same directory which is then renamed
/// into place, so a reader never observes a half-written report.
pub fn save_report(report: &ExportedReport, dir: &Path) -> Result<PathBuf, ExportError> {
    write_atomically(dir, &report.filename, &report.bytes).map_err(|e| {
        error!("Report save failed: {e}");
        ExportError::from(e)
    })
}

fn write_atomically(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir)?;
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;

    let path = dir.join(filename);
    staged.persist(&path).map_err(|e| ReportError::Io(e.error))?;
    Ok(path)
}
