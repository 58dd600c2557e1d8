//! Paginated PDF report: layout into an in-memory document, serialization,
//! and export.

pub mod document;
pub mod export;
pub mod layout;
pub mod render;
pub mod scan;

pub use document::{ReportDocument, Section};
pub use export::{export, export_async, export_with_dates, report_filename, save_report, ExportedReport};
pub use layout::{layout, LayoutOptions};
