//! On-screen results view built from the same normalized findings the
//! document uses.
//!
//! [`ResultsView`] is a serializable view model for a frontend; `to_markup`
//! renders it as a self-contained HTML fragment.

use std::fmt::Write as _;

use serde::Serialize;

use crate::findings::NormalizedFinding;
use crate::models::{DetectionResult, PatientRecord};
use crate::report::layout::{DISCLAIMER_TEXT, IMAGE_CAPTION};
use crate::risk::RISK_LEGEND;

/// Characters of `model_type` shown in the summary badge.
pub const MODEL_BADGE_CHARS: usize = 13;
pub const NO_IMAGE_TEXT: &str = "No annotated image available";

/// Summary panel background: alert when anything was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryTone {
    Alert,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub total_stones: u64,
    pub model_badge: String,
    pub tone: SummaryTone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindingView {
    pub title: String,
    pub risk_label: String,
    pub risk_color: String,
    pub confidence: String,
    pub size: String,
    pub location: String,
    pub area: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendView {
    pub label: &'static str,
    pub description: &'static str,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanView {
    Image { src: String, caption: &'static str },
    Missing { text: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsView {
    pub message: Option<String>,
    pub patient: Vec<(&'static str, String)>,
    pub summary: SummaryView,
    pub findings: Vec<FindingView>,
    pub scan: ScanView,
    pub legend: Vec<LegendView>,
    pub note: &'static str,
}

impl ResultsView {
    pub fn build(patient: &PatientRecord, detection: &DetectionResult) -> Self {
        Self {
            message: detection.message.clone(),
            patient: patient.rows().to_vec(),
            summary: SummaryView {
                total_stones: detection.total_stones,
                model_badge: model_badge(&detection.model_type),
                tone: if detection.total_stones != 0 {
                    SummaryTone::Alert
                } else {
                    SummaryTone::Clear
                },
            },
            findings: detection.findings.iter().map(finding_view).collect(),
            scan: match detection.annotated_image.as_deref().map(str::trim) {
                Some(payload) if !payload.is_empty() => ScanView::Image {
                    src: image_src(payload),
                    caption: IMAGE_CAPTION,
                },
                _ => ScanView::Missing { text: NO_IMAGE_TEXT },
            },
            legend: RISK_LEGEND
                .iter()
                .map(|entry| LegendView {
                    label: entry.label,
                    description: entry.description,
                    color: entry.color().to_hex(),
                })
                .collect(),
            note: DISCLAIMER_TEXT,
        }
    }

    /// Renders the view as an HTML fragment. All dynamic text is escaped.
    pub fn to_markup(&self) -> String {
        let mut html = String::with_capacity(2048);
        html.push_str("<section class=\"stone-results\">\n");

        if let Some(message) = &self.message {
            let _ = writeln!(html, "  <p class=\"message\">{}</p>", escape_html(message));
        }

        html.push_str("  <div class=\"patient\">\n    <h3>Patient Information</h3>\n");
        for (label, value) in &self.patient {
            let _ = writeln!(html, "    <p><span>{label}</span> {}</p>", escape_html(value));
        }
        html.push_str("  </div>\n");

        let tone = match self.summary.tone {
            SummaryTone::Alert => "alert",
            SummaryTone::Clear => "clear",
        };
        let _ = writeln!(html, "  <div class=\"summary {tone}\">");
        html.push_str("    <h3>Detection Summary</h3>\n");
        let _ = writeln!(
            html,
            "    <p><span>Total Stones Detected:</span> <strong>{}</strong></p>",
            self.summary.total_stones
        );
        let _ = writeln!(
            html,
            "    <p><span>Model Used:</span> <code>{}</code></p>",
            escape_html(&self.summary.model_badge)
        );
        html.push_str("  </div>\n");

        if !self.findings.is_empty() {
            html.push_str("  <div class=\"findings\">\n    <h3>Stone Details</h3>\n");
            for f in &self.findings {
                html.push_str("    <article>\n");
                let _ = writeln!(
                    html,
                    "      <h4>{}</h4> <span class=\"risk\" style=\"color: {}\">{}</span>",
                    escape_html(&f.title),
                    f.risk_color,
                    escape_html(&f.risk_label)
                );
                for (label, value) in [
                    ("Confidence:", &f.confidence),
                    ("Size:", &f.size),
                    ("Location:", &f.location),
                    ("Area:", &f.area),
                ] {
                    let _ = writeln!(html, "      <p><span>{label}</span> {}</p>", escape_html(value));
                }
                html.push_str("    </article>\n");
            }
            html.push_str("  </div>\n");
        }

        html.push_str("  <div class=\"scan\">\n    <h3>Annotated Scan</h3>\n");
        match &self.scan {
            ScanView::Image { src, caption } => {
                let _ = writeln!(
                    html,
                    "    <img src=\"{}\" alt=\"Annotated kidney scan showing detected stones\">",
                    escape_html(src)
                );
                let _ = writeln!(html, "    <p>{caption}</p>");
            }
            ScanView::Missing { text } => {
                let _ = writeln!(html, "    <p class=\"missing\">{text}</p>");
            }
        }
        html.push_str("  </div>\n");

        html.push_str("  <div class=\"legend\">\n    <h4>Risk Level Guide</h4>\n");
        for entry in &self.legend {
            let _ = writeln!(
                html,
                "    <p><span style=\"color: {}\">{}:</span> {}</p>",
                entry.color,
                entry.label,
                escape_html(entry.description)
            );
        }
        html.push_str("  </div>\n");

        let _ = writeln!(html, "  <p class=\"note\"><strong>Note:</strong> {}</p>", self.note);
        html.push_str("</section>\n");
        html
    }
}

fn model_badge(model_type: &str) -> String {
    let badge: String = model_type.trim().chars().take(MODEL_BADGE_CHARS).collect();
    if badge.is_empty() {
        "Unknown".into()
    } else {
        badge
    }
}

fn finding_view(finding: &NormalizedFinding) -> FindingView {
    FindingView {
        title: finding.title(),
        risk_label: finding.risk_label(),
        risk_color: finding.risk.color.to_hex(),
        confidence: finding.confidence_display(),
        size: finding.size_display(),
        location: finding.screen_location().to_string(),
        area: finding.area_display(),
    }
}

fn image_src(payload: &str) -> String {
    if payload.starts_with("data:") {
        payload.to_string()
    } else {
        format!("data:image/png;base64,{payload}")
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
