use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Upstream detection failed: {0}")]
    Upstream(String),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Malformed detection payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Annotated image could not be decoded: {0}")]
    ImageDecode(String),

    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report generation task aborted: {0}")]
    TaskAborted(String),
}

/// The single failure surfaced to end users when a report cannot be produced.
/// The underlying cause stays reachable through `source()` for logging.
#[derive(Error, Debug)]
#[error("Report generation failed")]
pub struct ExportError {
    #[source]
    source: ReportError,
}

impl ExportError {
    pub fn cause(&self) -> &ReportError {
        &self.source
    }
}

impl From<ReportError> for ExportError {
    fn from(source: ReportError) -> Self {
        Self { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn export_error_hides_cause_in_message() {
        let err = ExportError::from(ReportError::Render("font table".into()));
        assert_eq!(err.to_string(), "Report generation failed");
        assert!(err.source().unwrap().to_string().contains("font table"));
    }

    #[test]
    fn invalid_enum_message() {
        let err = ReportError::InvalidEnum {
            field: "Gender".into(),
            value: "x".into(),
        };
        assert_eq!(err.to_string(), "Invalid enum value for Gender: x");
    }
}
