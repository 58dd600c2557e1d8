use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::lenient;
use super::patient::{PatientRecord, UserDetails};
use crate::error::ReportError;
use crate::findings::{self, NormalizedFinding};

/// Axis-aligned box in reference-frame pixels. `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    /// Builds a box from `[x1, y1, x2, y2, ..]`. Extra coordinates are
    /// ignored; fewer than four, or an inverted box, yields `None`.
    pub fn from_coords(coords: &[f64]) -> Option<Self> {
        let &[x1, y1, x2, y2, ..] = coords else {
            return None;
        };
        if x1 > x2 || y1 > y2 {
            return None;
        }
        Some(Self { x1, y1, x2, y2 })
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

/// One candidate stone as reported by the detection service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawFinding {
    #[serde(default, deserialize_with = "lenient::count")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub size_mm: Option<f64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub area_pixels: Option<u64>,
    #[serde(default, deserialize_with = "lenient::bbox")]
    pub bbox: Option<BoundingBox>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub risk_level: Option<String>,
    /// Location label computed by the detection service, if it sent one.
    #[serde(default, deserialize_with = "lenient::text")]
    pub location: Option<String>,
}

/// Finalized detection result handed to the report engine.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    /// Authoritative stone count. May exceed `findings.len()` when the
    /// service truncates its detection list.
    pub total_stones: u64,
    pub model_type: String,
    pub model_used: Option<String>,
    pub message: Option<String>,
    pub findings: Vec<NormalizedFinding>,
    /// PNG as raw base64 or a `data:` URL.
    pub annotated_image: Option<String>,
}

impl DetectionResult {
    pub fn new(total_stones: u64, model_type: impl Into<String>, raw: &[RawFinding]) -> Self {
        Self {
            total_stones,
            model_type: model_type.into(),
            model_used: None,
            message: None,
            findings: findings::normalize(raw),
            annotated_image: None,
        }
    }

    pub fn with_annotated_image(mut self, payload: impl Into<String>) -> Self {
        self.annotated_image = Some(payload.into());
        self
    }
}

/// `detection_results` object of the service response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamDetections {
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_stones: Option<u64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub model_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub model_used: Option<String>,
    #[serde(default)]
    pub detections: Option<Vec<RawFinding>>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub annotated_image: Option<String>,
}

/// Full response body of the detection service, success or failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_details: Option<UserDetails>,
    #[serde(default)]
    pub detection_results: Option<UpstreamDetections>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

impl UpstreamResponse {
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Splits the response into the engine's two inputs. An upstream
    /// `error` short-circuits: the engine must not run on a failed detection.
    pub fn into_engine_input(self) -> Result<(PatientRecord, DetectionResult), ReportError> {
        if let Some(error) = self.error {
            let message = match self.details {
                Some(details) => format!("{error} ({details})"),
                None => error,
            };
            warn!("Detection service reported failure: {message}");
            return Err(ReportError::Upstream(message));
        }

        let patient = PatientRecord::from(self.user_details.unwrap_or_default());
        let upstream = self.detection_results.unwrap_or_default();
        let raw = upstream.detections.unwrap_or_default();
        let total_stones = upstream.total_stones.unwrap_or(0);

        if total_stones != raw.len() as u64 {
            debug!(
                total_stones,
                listed = raw.len(),
                "Stone count differs from listed detections"
            );
        }

        let detection = DetectionResult {
            total_stones,
            model_type: upstream.model_type.unwrap_or_else(|| "Unknown".into()),
            model_used: upstream.model_used,
            message: self.message,
            findings: findings::normalize(&raw),
            annotated_image: upstream.annotated_image,
        };
        Ok((patient, detection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{Gender, RiskTier};

    const SUCCESS: &str = r#"{
        "message": "Kidney stone detection completed",
        "user_details": {"name": "Asha Rao", "age": "45", "gender": "female"},
        "detection_results": {
            "total_stones": 2,
            "model_type": "YOLOv8-Custom (kidney_stone_v3)",
            "model_used": "kidney_stone_v3",
            "detections": [
                {"id": 1, "confidence": 0.91, "bbox": [50, 50, 100, 100],
                 "size_mm": 11.2, "risk_level": "High", "area_pixels": 2500,
                 "location": "Left Upper Pole of Kidney"},
                {"id": 2, "confidence": 0.44, "bbox": [400, 500, 450, 540],
                 "size_mm": 3.1, "area_pixels": 2000}
            ],
            "annotated_image": "iVBORw0KGgo="
        }
    }"#;

    #[test]
    fn bbox_from_coords() {
        assert!(BoundingBox::from_coords(&[1.0, 2.0, 3.0]).is_none());
        assert!(BoundingBox::from_coords(&[10.0, 0.0, 5.0, 4.0]).is_none());
        let b = BoundingBox::from_coords(&[0.0, 0.0, 10.0, 20.0, 99.0]).unwrap();
        assert_eq!(b.center(), (5.0, 10.0));
    }

    #[test]
    fn parses_success_response() {
        let response = UpstreamResponse::from_json(SUCCESS).unwrap();
        let (patient, detection) = response.into_engine_input().unwrap();

        assert_eq!(patient.name, "Asha Rao");
        assert_eq!(patient.age, Some(45));
        assert_eq!(patient.gender, Some(Gender::Female));

        assert_eq!(detection.total_stones, 2);
        assert_eq!(detection.model_type, "YOLOv8-Custom (kidney_stone_v3)");
        assert_eq!(detection.model_used.as_deref(), Some("kidney_stone_v3"));
        assert_eq!(detection.message.as_deref(), Some("Kidney stone detection completed"));
        assert_eq!(detection.findings.len(), 2);
        assert_eq!(detection.findings[0].risk.tier, RiskTier::High);
        assert_eq!(detection.findings[1].risk.tier, RiskTier::Low);
        assert_eq!(detection.findings[0].reported_location.as_deref(), Some("Left Upper Pole of Kidney"));
        assert!(detection.annotated_image.is_some());
    }

    #[test]
    fn upstream_error_short_circuits() {
        let json = r#"{"error": "Failed to process image", "details": "cannot identify image file",
                       "detection_results": {"total_stones": 0, "detections": []}}"#;
        let err = UpstreamResponse::from_json(json)
            .unwrap()
            .into_engine_input()
            .unwrap_err();
        match err {
            ReportError::Upstream(msg) => {
                assert!(msg.contains("Failed to process image"));
                assert!(msg.contains("cannot identify image file"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_result_defaults() {
        let json = r#"{"message": "Kidney stone detection completed - No stones detected",
                       "user_details": {"name": "A"},
                       "detection_results": {"total_stones": 0, "detections": [],
                                             "annotated_image": null,
                                             "model_type": "YOLOv8-Custom (No detection)"}}"#;
        let (_, detection) = UpstreamResponse::from_json(json)
            .unwrap()
            .into_engine_input()
            .unwrap();
        assert_eq!(detection.total_stones, 0);
        assert!(detection.findings.is_empty());
        assert!(detection.annotated_image.is_none());
    }

    #[test]
    fn missing_detection_results_is_zero_unknown() {
        let (_, detection) = UpstreamResponse::from_json("{}")
            .unwrap()
            .into_engine_input()
            .unwrap();
        assert_eq!(detection.total_stones, 0);
        assert_eq!(detection.model_type, "Unknown");
    }

    #[test]
    fn malformed_json_is_payload_error() {
        let err = UpstreamResponse::from_json("{not json").unwrap_err();
        assert!(matches!(err, ReportError::Payload(_)));
    }

    #[test]
    fn authoritative_count_kept_when_list_truncated() {
        let raw = vec![RawFinding::default(); 3];
        let detection = DetectionResult::new(5, "m", &raw);
        assert_eq!(detection.total_stones, 5);
        assert_eq!(detection.findings.len(), 3);
    }
}
