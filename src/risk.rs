//! Risk tier classification and the static legend that explains it.
//!
//! Only size drives the derived tier. The legend descriptions mention
//! confidence ("with high confidence") because that is the wording clinicians
//! already see on screen; the text is cosmetic and does not feed the rule.

use std::str::FromStr;

use serde::Serialize;
use tracing::warn;

use crate::models::{RawFinding, RgbColor, RiskTier};

/// Size at or above which a stone is high risk, in millimetres.
pub const HIGH_RISK_MIN_MM: f64 = 10.0;
/// Size at or above which a stone is medium risk, in millimetres.
pub const MEDIUM_RISK_MIN_MM: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskClassification {
    pub tier: RiskTier,
    pub color: RgbColor,
}

impl RiskClassification {
    pub fn of(tier: RiskTier) -> Self {
        Self {
            tier,
            color: tier_color(tier),
        }
    }
}

pub fn tier_color(tier: RiskTier) -> RgbColor {
    match tier {
        RiskTier::High => RgbColor::new(220, 38, 38),
        RiskTier::Medium => RgbColor::new(217, 119, 6),
        RiskTier::Low => RgbColor::new(22, 163, 74),
        RiskTier::Unknown => RgbColor::new(128, 128, 128),
    }
}

/// Classify a finding. A non-empty upstream `risk_level` wins over the size
/// rule; labels outside high/medium/low classify as `Unknown`.
pub fn classify_risk(finding: &RawFinding) -> RiskClassification {
    let tier = match finding.risk_level.as_deref().map(str::trim) {
        Some(label) if !label.is_empty() => RiskTier::from_str(label).unwrap_or_else(|e| {
            warn!("Unrecognized upstream risk level, using Unknown: {e}");
            RiskTier::Unknown
        }),
        _ => tier_for_size(finding.size_mm),
    };
    RiskClassification::of(tier)
}

pub fn tier_for_size(size_mm: Option<f64>) -> RiskTier {
    match size_mm {
        Some(s) if s >= HIGH_RISK_MIN_MM => RiskTier::High,
        Some(s) if s >= MEDIUM_RISK_MIN_MM => RiskTier::Medium,
        Some(s) if s.is_finite() => RiskTier::Low,
        _ => RiskTier::Unknown,
    }
}

/// One row of the reference legend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LegendEntry {
    pub tier: RiskTier,
    pub label: &'static str,
    pub description: &'static str,
}

impl LegendEntry {
    pub fn color(&self) -> RgbColor {
        tier_color(self.tier)
    }
}

/// Static legend. Rendered identically whatever tiers the findings contain.
pub const RISK_LEGEND: [LegendEntry; 3] = [
    LegendEntry {
        tier: RiskTier::High,
        label: "High Risk",
        description: "Large stones (>=10mm) with high confidence",
    },
    LegendEntry {
        tier: RiskTier::Medium,
        label: "Medium Risk",
        description: "Medium stones (5-10mm) or moderate confidence",
    },
    LegendEntry {
        tier: RiskTier::Low,
        label: "Low Risk",
        description: "Small stones (<5mm) with lower confidence",
    },
];
