/// Application-level constants
pub const APP_NAME: &str = "Stone Report";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upstream preprocessing resizes every scan to this square frame, so all
/// bounding boxes are expressed in these pixel coordinates.
pub const REFERENCE_FRAME: ReferenceFrame = ReferenceFrame {
    width: 550.0,
    height: 550.0,
};

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "stone_report=debug,info"
    } else {
        "stone_report=info,warn"
    }
}

/// Pixel dimensions of the frame bounding boxes are reported in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceFrame {
    pub width: f64,
    pub height: f64,
}

/// Fixed page geometry for the PDF report. All values in millimetres,
/// with `y` growing downwards from the top edge of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    /// Distance from the bottom edge that no atomic block may cross.
    pub bottom_margin: f32,
}

impl PageGeometry {
    /// A4 portrait with 20 mm margins.
    pub fn a4() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin: 20.0,
            bottom_margin: 20.0,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Lowest `y` an atomic block may reach.
    pub fn bottom_limit(&self) -> f32 {
        self.height - self.bottom_margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}
