pub mod color;
pub mod detection;
pub mod enums;
pub mod lenient;
pub mod patient;

pub use color::RgbColor;
pub use detection::*;
pub use enums::*;
pub use patient::*;
