//! Annotated scan decoding and fitting.

use base64::Engine;
use image::DynamicImage;
use tracing::debug;

use crate::error::ReportError;

/// Decode a base64 data URL or raw base64 string to raw bytes.
///
/// Handles both `data:image/png;base64,...` and bare base64.
pub fn decode_data_url(payload: &str) -> Result<Vec<u8>, ReportError> {
    let base64_data = match payload.find(',') {
        Some(idx) if payload.starts_with("data:") => &payload[idx + 1..],
        _ => payload,
    };
    let compact: String = base64_data.split_whitespace().collect();

    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| ReportError::ImageDecode(format!("base64: {e}")))
}

/// Decode the annotated image payload into pixels.
pub fn decode_annotated_image(payload: &str) -> Result<DynamicImage, ReportError> {
    let bytes = decode_data_url(payload)?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| ReportError::ImageDecode(e.to_string()))?;
    debug!(
        width = image.width(),
        height = image.height(),
        "Annotated image decoded"
    );
    Ok(image)
}

/// Largest `(width, height)` in millimetres that fits `max_w × max_h` while
/// keeping the pixel aspect ratio.
pub fn fit_within(pixel_w: u32, pixel_h: u32, max_w: f32, max_h: f32) -> (f32, f32) {
    if pixel_w == 0 || pixel_h == 0 {
        return (0.0, 0.0);
    }
    let aspect = pixel_w as f32 / pixel_h as f32;
    if max_w / aspect <= max_h {
        (max_w, max_w / aspect)
    } else {
        (max_h * aspect, max_h)
    }
}
