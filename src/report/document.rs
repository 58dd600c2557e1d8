//! In-memory page model produced by layout and consumed by the PDF renderer.
//!
//! Coordinates are millimetres from the top-left corner of the page; the
//! renderer flips them into PDF user space.

use image::DynamicImage;

use crate::models::RgbColor;

/// Points to millimetres.
const PT_TO_MM: f32 = 25.4 / 72.0;
/// Mean Helvetica advance as a fraction of the font size.
const AVG_GLYPH_WIDTH_EM: f32 = 0.5;
const BOLD_GLYPH_WIDTH_EM: f32 = 0.55;

/// Which layout stage emitted a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Header,
    PatientInfo,
    Summary,
    FindingsHeading,
    FindingDetail,
    AnnotatedImage,
    RiskLegend,
    Disclaimer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size_pt: f32,
    pub weight: FontWeight,
    pub color: RgbColor,
}

impl TextStyle {
    pub const fn regular(size_pt: f32) -> Self {
        Self {
            size_pt,
            weight: FontWeight::Regular,
            color: RgbColor::BLACK,
        }
    }

    pub const fn bold(size_pt: f32) -> Self {
        Self {
            size_pt,
            weight: FontWeight::Bold,
            color: RgbColor::BLACK,
        }
    }

    pub const fn colored(mut self, color: RgbColor) -> Self {
        self.color = color;
        self
    }

    /// Approximate rendered width of `text`. Built-in PDF fonts carry no
    /// metrics in the writer, so centering and wrapping use this estimate.
    pub fn estimate_width_mm(&self, text: &str) -> f32 {
        let em = match self.weight {
            FontWeight::Regular => AVG_GLYPH_WIDTH_EM,
            FontWeight::Bold => BOLD_GLYPH_WIDTH_EM,
        };
        text.chars().count() as f32 * self.size_pt * PT_TO_MM * em
    }

    /// How many characters fit on a line of `width_mm`.
    pub fn chars_per_line(&self, width_mm: f32) -> usize {
        let per_char = self.estimate_width_mm("n").max(f32::EPSILON);
        ((width_mm / per_char).floor() as usize).max(1)
    }
}

/// A single line of text. `y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Separator {
    pub x1: f32,
    pub x2: f32,
    pub y: f32,
    pub color: RgbColor,
}

/// Axis-aligned filled rectangle; `(x, y)` is the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: RgbColor,
}

/// Decoded raster placed in a box; `(x, y)` is the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    pub image: DynamicImage,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Text(TextLine),
    Separator(Separator),
    FilledRect(FilledRect),
    Image(PlacedImage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub section: Section,
    pub kind: BlockKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub blocks: Vec<Block>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &TextLine> {
        self.blocks.iter().filter_map(|b| match &b.kind {
            BlockKind::Text(t) => Some(t),
            _ => None,
        })
    }
}

/// Where a section started, 0-based page index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineEntry {
    pub section: Section,
    pub page: usize,
}

/// Ordered pages plus an outline with one entry per emitted section.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pages: Vec<Page>,
    outline: Vec<OutlineEntry>,
}

impl ReportDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pages: vec![Page::default()],
            outline: Vec::new(),
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn outline(&self) -> &[OutlineEntry] {
        &self.outline
    }

    /// Number of times `section` was emitted.
    pub fn section_count(&self, section: Section) -> usize {
        self.outline.iter().filter(|e| e.section == section).count()
    }

    /// All blocks of `section`, in document order.
    pub fn blocks_of(&self, section: Section) -> impl Iterator<Item = &Block> {
        self.pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .filter(move |b| b.section == section)
    }

    /// Text content of `section`, in document order.
    pub fn text_of(&self, section: Section) -> Vec<&str> {
        self.blocks_of(section)
            .filter_map(|b| match &b.kind {
                BlockKind::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn start_page(&mut self) {
        self.pages.push(Page::default());
    }

    pub(crate) fn begin_section(&mut self, section: Section) {
        let page = self.pages.len() - 1;
        self.outline.push(OutlineEntry { section, page });
    }

    pub(crate) fn push(&mut self, section: Section, kind: BlockKind) {
        if let Some(page) = self.pages.last_mut() {
            page.blocks.push(Block { section, kind });
        }
    }
}

/// Greedy word wrap on a character budget. Words longer than a whole line
/// are split at the budget.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(max_chars) {
            if current_len > 0 && current_len + piece.len() + 1 > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(piece);
            current_len += piece.len();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
