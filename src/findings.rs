//! Raw detections → uniform records ready for either renderer.
//!
//! Normalization is total and order preserving: every raw finding yields
//! exactly one normalized finding, however many of its fields are missing.
//! Display strings are produced here so the document and the on-screen view
//! print identical values.

use serde::Serialize;

use crate::location::resolve_location;
use crate::models::{BoundingBox, RawFinding, NOT_AVAILABLE};
use crate::risk::{classify_risk, RiskClassification};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedFinding {
    /// 1-based number shown as "Stone #n".
    pub display_index: u64,
    pub confidence: Option<f64>,
    pub size_mm: Option<f64>,
    pub area_pixels: Option<u64>,
    pub bbox: Option<BoundingBox>,
    /// Resolved from `bbox` in the reference frame.
    pub location: String,
    /// Label the detection service attached, if any.
    pub reported_location: Option<String>,
    pub risk: RiskClassification,
}

pub fn normalize(raw: &[RawFinding]) -> Vec<NormalizedFinding> {
    raw.iter()
        .enumerate()
        .map(|(position, finding)| normalize_one(finding, position as u64 + 1))
        .collect()
}

fn normalize_one(raw: &RawFinding, position: u64) -> NormalizedFinding {
    let display_index = raw.id.filter(|id| *id > 0).unwrap_or(position);
    NormalizedFinding {
        display_index,
        confidence: raw.confidence,
        size_mm: raw.size_mm,
        area_pixels: raw.area_pixels,
        bbox: raw.bbox,
        location: resolve_location(raw.bbox.as_ref()),
        reported_location: raw.location.clone(),
        risk: classify_risk(raw),
    }
}

impl NormalizedFinding {
    pub fn title(&self) -> String {
        format!("Stone #{}", self.display_index)
    }

    /// e.g. `"High Risk"`.
    pub fn risk_label(&self) -> String {
        format!("{} Risk", self.risk.tier.label())
    }

    /// Percentage with one decimal place.
    pub fn confidence_display(&self) -> String {
        match self.confidence {
            Some(c) => format!("{:.1}%", c * 100.0),
            None => NOT_AVAILABLE.into(),
        }
    }

    pub fn size_display(&self) -> String {
        match self.size_mm {
            Some(s) => format!("{s:.3} mm"),
            None => NOT_AVAILABLE.into(),
        }
    }

    pub fn area_display(&self) -> String {
        match self.area_pixels {
            Some(a) => format!("{a} pixels"),
            None => NOT_AVAILABLE.into(),
        }
    }

    /// The three key/value rows of the per-stone table.
    pub fn detail_rows(&self) -> [(&'static str, String); 3] {
        [
            ("Confidence:", self.confidence_display()),
            ("Size:", self.size_display()),
            ("Area:", self.area_display()),
        ]
    }

    /// Location for the on-screen view: the service's own label when present.
    pub fn screen_location(&self) -> &str {
        self.reported_location.as_deref().unwrap_or(&self.location)
    }
}
