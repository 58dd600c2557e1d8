use serde::Serialize;

/// 8-bit RGB triple shared by the screen view and the PDF renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const TITLE_BLUE: Self = Self::new(41, 128, 185);
    pub const HEADING_SLATE: Self = Self::new(52, 73, 94);
    pub const MUTED_GRAY: Self = Self::new(128, 128, 128);
    pub const LEGEND_GRAY: Self = Self::new(100, 100, 100);
    pub const SEPARATOR_GRAY: Self = Self::new(200, 200, 200);
    pub const SUMMARY_FILL: Self = Self::new(240, 248, 255);
    pub const DISCLAIMER_FILL: Self = Self::new(255, 251, 235);
    pub const DISCLAIMER_TEXT: Self = Self::new(146, 64, 14);

    /// Components scaled to 0.0..=1.0, as PDF color operators expect.
    pub fn to_unit(self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }

    /// `#rrggbb` for markup output.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
