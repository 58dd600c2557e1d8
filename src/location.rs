//! Bounding box → anatomical location label.
//!
//! Boxes are positioned in the fixed 550×550 preprocessing frame. Side uses a
//! mirrored convention: the left half of the image is reported as the *left*
//! kidney, with no radiological left/right flip applied. This has not been
//! confirmed against clinical imaging convention and is kept as-is so labels
//! match what the detection service prints on annotated scans.

use crate::config::{ReferenceFrame, REFERENCE_FRAME};
use crate::models::BoundingBox;

pub const LOCATION_NOT_DETERMINED: &str = "Location not determined";

/// Fraction of frame height where the upper pole ends.
const UPPER_POLE_END: f64 = 0.35;
/// Fraction of frame height where the middle region ends.
const MIDDLE_END: f64 = 0.65;
/// Depth into the outer band that earns a (Superior)/(Inferior) qualifier.
const EXTREME_BAND: f64 = 0.7;

/// Anatomical description for a box, e.g. `"Left Upper Pole (Superior) of Kidney"`.
/// Total: an absent box degrades to [`LOCATION_NOT_DETERMINED`].
pub fn resolve_location(bbox: Option<&BoundingBox>) -> String {
    resolve_location_in(bbox, &REFERENCE_FRAME)
}

pub fn resolve_location_in(bbox: Option<&BoundingBox>, frame: &ReferenceFrame) -> String {
    let Some(bbox) = bbox else {
        return LOCATION_NOT_DETERMINED.to_string();
    };
    let (cx, cy) = bbox.center();

    let side = if cx < frame.width * 0.5 { "Left" } else { "Right" };

    let upper = frame.height * UPPER_POLE_END;
    let middle = frame.height * MIDDLE_END;
    let region = if cy < upper {
        "Upper Pole"
    } else if cy < middle {
        "Middle"
    } else {
        "Lower Pole"
    };

    let qualifier = if cy < upper * EXTREME_BAND {
        " (Superior)"
    } else if cy > middle + (frame.height - middle) * EXTREME_BAND {
        " (Inferior)"
    } else {
        ""
    };

    format!("{side} {region}{qualifier} of Kidney")
}
