//! Report layout: a strictly sequential state machine over one owned cursor.
//!
//! `Header → PatientInfo → Summary → [FindingDetail]* → AnnotatedImage? →
//! RiskLegend → Disclaimer → Done`
//!
//! Finding groups, the annotated image group and the legend are atomic: the
//! page-break check runs once before each with its full estimated height, so
//! none of them is split across pages. Only the disclaimer paragraph wraps.

use chrono::NaiveDate;
use tracing::{debug, error, warn};

use super::document::{
    wrap_text, BlockKind, FilledRect, PlacedImage, ReportDocument, Section, Separator, TextLine,
    TextStyle,
};
use super::scan::{decode_annotated_image, fit_within};
use crate::config::PageGeometry;
use crate::findings::NormalizedFinding;
use crate::models::{DetectionResult, PatientRecord, RgbColor};
use crate::risk::RISK_LEGEND;

pub const REPORT_TITLE: &str = "KIDNEY STONE DETECTION REPORT";
pub const IMAGE_CAPTION: &str = "Detected stones are highlighted with colored bounding boxes";
pub const IMAGE_PLACEHOLDER: &str = "Annotated image could not be included in the PDF";
pub const DISCLAIMER_TITLE: &str = "MEDICAL DISCLAIMER";
pub const DISCLAIMER_TEXT: &str = "This AI-powered analysis is for informational purposes only \
and should not replace professional medical diagnosis. Please consult with a healthcare \
professional for proper medical evaluation and treatment.";

/// Baseline advance of a text line, as a fraction of its point size (in mm).
const LINE_ADVANCE: f32 = 0.6;

const SECTION_HEADING: TextStyle = TextStyle::bold(16.0).colored(RgbColor::HEADING_SLATE);
const LEGEND_HEADING: TextStyle = TextStyle::bold(14.0).colored(RgbColor::HEADING_SLATE);
const LABEL: TextStyle = TextStyle::bold(12.0);
const VALUE: TextStyle = TextStyle::regular(12.0);
const DETAIL_LABEL: TextStyle = TextStyle::bold(11.0);
const DETAIL_VALUE: TextStyle = TextStyle::regular(11.0);
const DISCLAIMER_BODY: TextStyle = TextStyle::regular(9.0).colored(RgbColor::DISCLAIMER_TEXT);

/// Finding group: header + location (13) + three rows (21) + gap (10).
const FINDING_GROUP_HEIGHT: f32 = 44.0;
const DETAIL_ROW_HEIGHT: f32 = 7.0;
const MODEL_LINE_HEIGHT: f32 = 5.0;
const IMAGE_MAX_HEIGHT: f32 = 120.0;
const LEGEND_ROW_HEIGHT: f32 = 8.0;
const DISCLAIMER_LINE_HEIGHT: f32 = 4.0;

/// Inputs to layout that are not part of the detection itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub generated_on: NaiveDate,
    pub geometry: PageGeometry,
}

impl LayoutOptions {
    pub fn new(generated_on: NaiveDate) -> Self {
        Self {
            generated_on,
            geometry: PageGeometry::a4(),
        }
    }
}

/// Position of the next block: page index and baseline `y` in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub page: usize,
    pub y: f32,
}

/// The document under construction together with its cursor. Every emit
/// function takes this explicitly; there is no ambient position state.
#[derive(Debug)]
pub struct LayoutState {
    geometry: PageGeometry,
    cursor: Cursor,
    document: ReportDocument,
}

impl LayoutState {
    pub fn new(geometry: PageGeometry, title: impl Into<String>) -> Self {
        Self {
            geometry,
            cursor: Cursor {
                page: 0,
                y: geometry.margin,
            },
            document: ReportDocument::new(title),
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn document(&self) -> &ReportDocument {
        &self.document
    }

    pub fn into_document(self) -> ReportDocument {
        self.document
    }

    /// Move the cursor to an absolute `y` on the current page.
    pub fn set_y(&mut self, y: f32) {
        self.cursor.y = y;
    }

    fn advance(&mut self, dy: f32) {
        self.cursor.y += dy;
    }

    fn new_page(&mut self) {
        self.document.start_page();
        self.cursor = Cursor {
            page: self.cursor.page + 1,
            y: self.geometry.margin,
        };
        debug!(page = self.cursor.page, "Page break");
    }

    /// Page-break rule: start a new page when a block of `height` would
    /// cross the bottom limit. Returns whether a break happened.
    pub fn ensure_room(&mut self, height: f32) -> bool {
        let bottom = self.geometry.bottom_limit();
        let top = self.geometry.margin;
        if height > bottom - top {
            // Unreachable with the fixed section set; place it rather than loop.
            error!(height, available = bottom - top, "Block taller than a page");
        }
        if self.cursor.y + height <= bottom || self.cursor.y <= top {
            return false;
        }
        self.new_page();
        true
    }

    fn begin(&mut self, section: Section) {
        self.document.begin_section(section);
    }

    fn text_at(&mut self, section: Section, text: impl Into<String>, x: f32, y: f32, style: TextStyle) {
        self.document.push(
            section,
            BlockKind::Text(TextLine {
                text: text.into(),
                x,
                y,
                style,
            }),
        );
    }

    /// Text at the cursor; advances by the line height.
    fn line(&mut self, section: Section, text: impl Into<String>, x: f32, style: TextStyle) {
        self.text_at(section, text, x, self.cursor.y, style);
        self.advance(style.size_pt * LINE_ADVANCE);
    }

    /// Horizontally centered text at the cursor; advances by the line height.
    fn centered_line(&mut self, section: Section, text: &str, style: TextStyle) {
        let x = ((self.geometry.width - style.estimate_width_mm(text)) / 2.0).max(0.0);
        self.line(section, text, x, style);
    }

    fn separator(&mut self, section: Section) {
        let y = self.cursor.y;
        self.document.push(
            section,
            BlockKind::Separator(Separator {
                x1: self.geometry.margin,
                x2: self.geometry.width - self.geometry.margin,
                y,
                color: RgbColor::SEPARATOR_GRAY,
            }),
        );
        self.advance(10.0);
    }

    fn rect(&mut self, section: Section, x: f32, y: f32, width: f32, height: f32, color: RgbColor) {
        self.document.push(
            section,
            BlockKind::FilledRect(FilledRect {
                x,
                y,
                width,
                height,
                color,
            }),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Header,
    PatientInfo,
    Summary,
    FindingDetail(usize),
    AnnotatedImage,
    RiskLegend,
    Disclaimer,
    Done,
}

/// Lay out the complete report.
pub fn layout(
    patient: &PatientRecord,
    detection: &DetectionResult,
    options: &LayoutOptions,
) -> ReportDocument {
    let mut state = LayoutState::new(options.geometry, REPORT_TITLE);
    let after_findings = if detection.annotated_image.is_some() {
        Stage::AnnotatedImage
    } else {
        Stage::RiskLegend
    };

    let mut stage = Stage::Header;
    while stage != Stage::Done {
        debug!(?stage, page = state.cursor.page, y = state.cursor.y, "Layout stage");
        stage = match stage {
            Stage::Header => {
                emit_header(&mut state, options.generated_on);
                Stage::PatientInfo
            }
            Stage::PatientInfo => {
                emit_patient_info(&mut state, patient);
                Stage::Summary
            }
            Stage::Summary => {
                emit_summary(&mut state, detection);
                if detection.findings.is_empty() {
                    after_findings
                } else {
                    emit_findings_heading(&mut state);
                    Stage::FindingDetail(0)
                }
            }
            Stage::FindingDetail(i) => {
                emit_finding(&mut state, &detection.findings[i]);
                if i + 1 < detection.findings.len() {
                    Stage::FindingDetail(i + 1)
                } else {
                    after_findings
                }
            }
            Stage::AnnotatedImage => {
                if let Some(payload) = detection.annotated_image.as_deref() {
                    emit_annotated_image(&mut state, payload);
                }
                Stage::RiskLegend
            }
            Stage::RiskLegend => {
                emit_risk_legend(&mut state);
                Stage::Disclaimer
            }
            Stage::Disclaimer => {
                emit_disclaimer(&mut state);
                Stage::Done
            }
            Stage::Done => Stage::Done,
        };
    }

    state.into_document()
}

pub fn emit_header(state: &mut LayoutState, generated_on: NaiveDate) {
    let section = Section::Header;
    state.begin(section);
    state.centered_line(
        section,
        REPORT_TITLE,
        TextStyle::bold(20.0).colored(RgbColor::TITLE_BLUE),
    );
    state.advance(5.0);
    let generated = format!("Generated on {}", generated_on.format("%B %-d, %Y"));
    state.centered_line(
        section,
        &generated,
        TextStyle::regular(10.0).colored(RgbColor::MUTED_GRAY),
    );
    state.advance(15.0);
    state.separator(section);
}

pub fn emit_patient_info(state: &mut LayoutState, patient: &PatientRecord) {
    let section = Section::PatientInfo;
    let margin = state.geometry.margin;
    state.begin(section);
    state.line(section, "PATIENT INFORMATION", margin, SECTION_HEADING);
    state.advance(10.0);

    for (label, value) in patient.rows() {
        let y = state.cursor.y;
        state.text_at(section, label, margin, y, LABEL);
        state.text_at(section, value, margin + 40.0, y, VALUE);
        state.advance(8.0);
    }

    state.advance(10.0);
    state.separator(section);
}

/// Summary box. Always prints the authoritative `total_stones`, never the
/// length of the findings list, and the model type unabridged.
pub fn emit_summary(state: &mut LayoutState, detection: &DetectionResult) {
    let section = Section::Summary;
    let margin = state.geometry.margin;
    let content_width = state.geometry.content_width();
    state.begin(section);
    state.line(section, "DETECTION SUMMARY", margin, SECTION_HEADING);
    state.advance(10.0);

    let model_x = margin + 80.0;
    let model_width = margin + content_width - model_x - 5.0;
    let mut model_lines = wrap_text(&detection.model_type, VALUE.chars_per_line(model_width));

    let y = state.cursor.y;
    // The box must close above the bottom limit.
    let last_baseline = state.geometry.bottom_limit() - 5.0;
    let max_lines = (((last_baseline - (y + 15.0)) / MODEL_LINE_HEIGHT).floor().max(0.0) as usize) + 1;
    if model_lines.len() > max_lines {
        error!(
            lines = model_lines.len(),
            kept = max_lines,
            "Model type does not fit the summary box"
        );
        model_lines.truncate(max_lines);
    }
    let extra = (model_lines.len().saturating_sub(1)) as f32 * MODEL_LINE_HEIGHT;

    state.rect(section, margin, y - 5.0, content_width, 25.0 + extra, RgbColor::SUMMARY_FILL);
    state.text_at(section, "Total Stones Detected:", margin + 5.0, y + 5.0, LABEL);
    state.text_at(
        section,
        detection.total_stones.to_string(),
        margin + 5.0,
        y + 15.0,
        TextStyle::bold(18.0).colored(RgbColor::TITLE_BLUE),
    );
    state.text_at(section, "Model Used:", model_x, y + 5.0, LABEL);
    for (i, line) in model_lines.into_iter().enumerate() {
        state.text_at(section, line, model_x, y + 15.0 + i as f32 * MODEL_LINE_HEIGHT, VALUE);
    }

    state.advance(35.0 + extra);
}

/// "STONE DETAILS" heading, kept on the same page as the first finding.
pub fn emit_findings_heading(state: &mut LayoutState) {
    let section = Section::FindingsHeading;
    let margin = state.geometry.margin;
    state.ensure_room(SECTION_HEADING.size_pt * LINE_ADVANCE + 10.0 + FINDING_GROUP_HEIGHT);
    state.begin(section);
    state.line(section, "STONE DETAILS", margin, SECTION_HEADING);
    state.advance(10.0);
}

pub fn emit_finding(state: &mut LayoutState, finding: &NormalizedFinding) {
    let section = Section::FindingDetail;
    let margin = state.geometry.margin;
    state.ensure_room(FINDING_GROUP_HEIGHT);
    state.begin(section);

    let y = state.cursor.y;
    state.text_at(section, finding.title(), margin, y, TextStyle::bold(14.0));
    state.text_at(
        section,
        finding.risk_label(),
        margin + 100.0,
        y,
        TextStyle::bold(12.0).colored(finding.risk.color),
    );
    state.text_at(
        section,
        finding.location.as_str(),
        margin,
        y + 6.0,
        TextStyle::regular(10.0).colored(RgbColor::MUTED_GRAY),
    );
    state.advance(13.0);

    for (label, value) in finding.detail_rows() {
        let y = state.cursor.y;
        state.text_at(section, label, margin + 10.0, y, DETAIL_LABEL);
        state.text_at(section, value, margin + 60.0, y, DETAIL_VALUE);
        state.advance(DETAIL_ROW_HEIGHT);
    }

    state.advance(10.0);
}

/// Annotated scan. A payload that fails to decode is replaced by a
/// placeholder line; it never aborts the document.
pub fn emit_annotated_image(state: &mut LayoutState, payload: &str) {
    let section = Section::AnnotatedImage;
    let margin = state.geometry.margin;
    let content_width = state.geometry.content_width();
    let heading_height = SECTION_HEADING.size_pt * LINE_ADVANCE + 10.0;

    let decoded = match decode_annotated_image(payload) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("Annotated image could not be embedded: {e}");
            None
        }
    };

    match decoded {
        Some(image) => {
            let (width, height) =
                fit_within(image.width(), image.height(), content_width, IMAGE_MAX_HEIGHT);
            state.ensure_room(heading_height + height + 30.0);
            state.begin(section);
            state.line(section, "ANNOTATED SCAN", margin, SECTION_HEADING);
            state.advance(10.0);

            let x = margin + (content_width - width) / 2.0;
            let y = state.cursor.y;
            state.document.push(
                section,
                BlockKind::Image(PlacedImage {
                    image,
                    x,
                    y,
                    width,
                    height,
                }),
            );
            state.advance(height + 10.0);
            state.centered_line(
                section,
                IMAGE_CAPTION,
                TextStyle::regular(10.0).colored(RgbColor::MUTED_GRAY),
            );
            state.advance(20.0 - 10.0 * LINE_ADVANCE);
        }
        None => {
            state.ensure_room(heading_height + 15.0);
            state.begin(section);
            state.line(section, "ANNOTATED SCAN", margin, SECTION_HEADING);
            state.advance(10.0);
            let y = state.cursor.y;
            state.text_at(
                section,
                IMAGE_PLACEHOLDER,
                margin,
                y,
                TextStyle::regular(11.0).colored(RgbColor::MUTED_GRAY),
            );
            state.advance(15.0);
        }
    }
}

/// Static reference legend; identical for every report.
pub fn emit_risk_legend(state: &mut LayoutState) {
    let section = Section::RiskLegend;
    let margin = state.geometry.margin;
    let height = LEGEND_HEADING.size_pt * LINE_ADVANCE
        + 10.0
        + RISK_LEGEND.len() as f32 * LEGEND_ROW_HEIGHT;
    state.ensure_room(height);
    state.begin(section);
    state.line(section, "RISK LEVEL GUIDE", margin, LEGEND_HEADING);
    state.advance(10.0);

    for entry in &RISK_LEGEND {
        let y = state.cursor.y;
        let color = entry.color();
        state.rect(section, margin, y - 3.5, 4.0, 4.0, color);
        state.text_at(
            section,
            format!("{}:", entry.label),
            margin + 8.0,
            y,
            TextStyle::bold(11.0).colored(color),
        );
        state.text_at(
            section,
            entry.description,
            margin + 50.0,
            y,
            TextStyle::regular(10.0).colored(RgbColor::LEGEND_GRAY),
        );
        state.advance(LEGEND_ROW_HEIGHT);
    }
}

/// Disclaimer box pinned to the bottom of the last page. If earlier content
/// already reaches into the pinned area, it moves to a fresh page.
pub fn emit_disclaimer(state: &mut LayoutState) {
    let section = Section::Disclaimer;
    let margin = state.geometry.margin;
    let content_width = state.geometry.content_width();

    let lines = wrap_text(DISCLAIMER_TEXT, DISCLAIMER_BODY.chars_per_line(content_width - 10.0));
    let box_height = 21.0 + (lines.len().saturating_sub(1)) as f32 * DISCLAIMER_LINE_HEIGHT;
    let box_bottom = state.geometry.bottom_limit() - 5.0;
    let box_top = box_bottom - box_height;

    if state.cursor.y > box_top {
        state.new_page();
    }
    state.begin(section);

    state.rect(section, margin, box_top, content_width, box_height, RgbColor::DISCLAIMER_FILL);
    state.set_y(box_top + 5.0);
    state.centered_line(
        section,
        DISCLAIMER_TITLE,
        TextStyle::bold(12.0).colored(RgbColor::DISCLAIMER_TEXT),
    );

    let mut y = box_top + 15.0;
    for line in lines {
        state.text_at(section, line, margin + 5.0, y, DISCLAIMER_BODY);
        y += DISCLAIMER_LINE_HEIGHT;
    }
    state.set_y(box_bottom);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundingBox, Gender, RawFinding};
    use crate::report::document::Block;
    use crate::report::scan::tests::png_base64;

    fn options() -> LayoutOptions {
        LayoutOptions::new(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap())
    }

    fn patient() -> PatientRecord {
        PatientRecord::new("Maria Lopez", Some(38), Some(Gender::Female))
    }

    fn raw(i: u64) -> RawFinding {
        RawFinding {
            id: Some(i),
            confidence: Some(0.82),
            size_mm: Some(4.0 + i as f64 % 8.0),
            area_pixels: Some(900 + i),
            bbox: BoundingBox::from_coords(&[50.0, 300.0, 90.0, 340.0]),
            risk_level: None,
            location: None,
        }
    }

    fn detection(count: u64) -> DetectionResult {
        let raw: Vec<RawFinding> = (1..=count).map(raw).collect();
        DetectionResult::new(count, "YOLOv8-Custom (kidney_stone_v3)", &raw)
    }

    fn all_blocks(doc: &ReportDocument) -> impl Iterator<Item = &Block> {
        doc.pages().iter().flat_map(|p| p.blocks.iter())
    }

    #[test]
    fn zero_findings_document_shape() {
        let doc = layout(&patient(), &detection(0), &options());
        let sections: Vec<Section> = doc.outline().iter().map(|e| e.section).collect();
        assert_eq!(
            sections,
            vec![
                Section::Header,
                Section::PatientInfo,
                Section::Summary,
                Section::RiskLegend,
                Section::Disclaimer,
            ]
        );
        assert_eq!(doc.blocks_of(Section::FindingDetail).count(), 0);
        assert_eq!(doc.blocks_of(Section::AnnotatedImage).count(), 0);
        assert!(doc.text_of(Section::Summary).contains(&"0"));
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn exactly_one_legend_and_disclaimer() {
        for count in [0, 1, 50] {
            let doc = layout(&patient(), &detection(count), &options());
            assert_eq!(doc.section_count(Section::RiskLegend), 1, "count={count}");
            assert_eq!(doc.section_count(Section::Disclaimer), 1, "count={count}");
            assert_eq!(doc.section_count(Section::FindingDetail), count as usize);
        }
    }

    #[test]
    fn summary_shows_authoritative_count() {
        let raw: Vec<RawFinding> = (1..=3).map(raw).collect();
        let detection = DetectionResult::new(5, "YOLOv8", &raw);
        let doc = layout(&patient(), &detection, &options());
        let summary = doc.text_of(Section::Summary);
        assert!(summary.contains(&"5"));
        assert!(!summary.contains(&"3"));
    }

    #[test]
    fn summary_model_type_is_unabridged() {
        let doc = layout(&patient(), &detection(1), &options());
        let summary = doc.text_of(Section::Summary).join(" ");
        assert!(summary.contains("YOLOv8-Custom (kidney_stone_v3)"));
    }

    #[test]
    fn long_model_type_stays_inside_page() {
        let raw: Vec<RawFinding> = (1..=2).map(raw).collect();
        let detection = DetectionResult::new(2, "word ".repeat(1200), &raw);
        let doc = layout(&patient(), &detection, &options());
        let limit = PageGeometry::a4().bottom_limit();

        for block in doc.blocks_of(Section::Summary) {
            let bottom = match &block.kind {
                BlockKind::Text(t) => t.y,
                BlockKind::FilledRect(r) => r.y + r.height,
                _ => continue,
            };
            assert!(bottom <= limit, "summary block ends at {bottom}");
        }
        let summary_page = doc
            .outline()
            .iter()
            .find(|e| e.section == Section::Summary)
            .unwrap()
            .page;
        assert_eq!(summary_page, 0);
        assert_eq!(doc.section_count(Section::FindingDetail), 2);
        assert_eq!(doc.section_count(Section::Disclaimer), 1);
    }

    #[test]
    fn long_model_token_is_split_within_box() {
        let detection = DetectionResult::new(0, "m".repeat(200), &[]);
        let doc = layout(&patient(), &detection, &options());
        let model_lines: Vec<_> = doc
            .blocks_of(Section::Summary)
            .filter_map(|b| match &b.kind {
                BlockKind::Text(t) if t.x == 100.0 => Some(t),
                _ => None,
            })
            .skip(1)
            .collect();
        assert!(model_lines.len() > 1);
        for line in model_lines {
            assert!(line.x + line.style.estimate_width_mm(&line.text) <= 185.0);
        }
    }

    #[test]
    fn header_and_patient_text() {
        let doc = layout(&patient(), &detection(0), &options());
        let header = doc.text_of(Section::Header);
        assert_eq!(header[0], REPORT_TITLE);
        assert_eq!(header[1], "Generated on March 14, 2026");
        let patient = doc.text_of(Section::PatientInfo);
        assert!(patient.contains(&"Maria Lopez"));
        assert!(patient.contains(&"38"));
        assert!(patient.contains(&"Female"));
    }

    #[test]
    fn finding_group_has_header_location_and_three_rows() {
        let doc = layout(&patient(), &detection(1), &options());
        let texts = doc.text_of(Section::FindingDetail);
        assert_eq!(
            texts,
            vec![
                "Stone #1",
                "Medium Risk",
                "Left Middle of Kidney",
                "Confidence:",
                "82.0%",
                "Size:",
                "5.000 mm",
                "Area:",
                "901 pixels",
            ]
        );
        let risk_line = doc
            .blocks_of(Section::FindingDetail)
            .find_map(|b| match &b.kind {
                BlockKind::Text(t) if t.text == "Medium Risk" => Some(t.style.color),
                _ => None,
            })
            .unwrap();
        assert_eq!(risk_line, RgbColor::new(217, 119, 6));
    }

    #[test]
    fn atomic_groups_never_cross_bottom_limit() {
        let mut detection = detection(50);
        detection.annotated_image = Some(png_base64(550, 550));
        let doc = layout(&patient(), &detection, &options());
        let limit = PageGeometry::a4().bottom_limit();
        assert!(doc.page_count() > 5);

        for page in doc.pages() {
            for block in &page.blocks {
                let bottom = match &block.kind {
                    BlockKind::Text(t) => t.y,
                    BlockKind::Separator(s) => s.y,
                    BlockKind::FilledRect(r) => r.y + r.height,
                    BlockKind::Image(i) => i.y + i.height,
                };
                assert!(bottom <= limit, "{:?} ends at {bottom}", block.section);
            }
        }
    }

    #[test]
    fn finding_groups_are_not_split() {
        let doc = layout(&patient(), &detection(50), &options());
        for index in 1..=50u64 {
            let title = format!("Stone #{index}");
            let page_of_title = doc
                .pages()
                .iter()
                .position(|p| p.texts().any(|t| t.text == title))
                .unwrap();
            let area = format!("{} pixels", 900 + index);
            let page_of_area = doc
                .pages()
                .iter()
                .position(|p| p.texts().any(|t| t.text == area))
                .unwrap();
            assert_eq!(page_of_title, page_of_area, "stone {index} split");
        }
    }

    #[test]
    fn findings_heading_stays_with_first_finding() {
        let doc = layout(&patient(), &detection(3), &options());
        let heading = doc
            .outline()
            .iter()
            .find(|e| e.section == Section::FindingsHeading)
            .unwrap();
        let first = doc
            .outline()
            .iter()
            .find(|e| e.section == Section::FindingDetail)
            .unwrap();
        assert_eq!(heading.page, first.page);
    }

    #[test]
    fn valid_image_is_embedded_and_fitted() {
        let mut detection = detection(0);
        detection.annotated_image = Some(png_base64(550, 550));
        let doc = layout(&patient(), &detection, &options());
        let image = doc
            .blocks_of(Section::AnnotatedImage)
            .find_map(|b| match &b.kind {
                BlockKind::Image(i) => Some(i),
                _ => None,
            })
            .unwrap();
        assert_eq!((image.width, image.height), (120.0, 120.0));
        assert_eq!(image.x, 20.0 + 25.0);
        assert!(doc.text_of(Section::AnnotatedImage).contains(&IMAGE_CAPTION));
    }

    #[test]
    fn invalid_image_degrades_to_placeholder() {
        let mut detection = detection(2);
        detection.annotated_image = Some("definitely not an image".into());
        let doc = layout(&patient(), &detection, &options());

        assert_eq!(doc.section_count(Section::AnnotatedImage), 1);
        assert!(doc.text_of(Section::AnnotatedImage).contains(&IMAGE_PLACEHOLDER));
        assert!(!all_blocks(&doc).any(|b| matches!(b.kind, BlockKind::Image(_))));
        assert_eq!(doc.section_count(Section::FindingDetail), 2);
        assert_eq!(doc.section_count(Section::RiskLegend), 1);
        assert_eq!(doc.section_count(Section::Disclaimer), 1);
    }

    #[test]
    fn legend_is_static() {
        let high = {
            let mut d = detection(1);
            d.findings[0].risk = crate::risk::RiskClassification::of(crate::models::RiskTier::High);
            d
        };
        let a = layout(&patient(), &high, &options());
        let b = layout(&patient(), &detection(0), &options());
        assert_eq!(a.text_of(Section::RiskLegend), b.text_of(Section::RiskLegend));
        assert_eq!(
            a.text_of(Section::RiskLegend),
            vec![
                "RISK LEVEL GUIDE",
                "High Risk:",
                "Large stones (>=10mm) with high confidence",
                "Medium Risk:",
                "Medium stones (5-10mm) or moderate confidence",
                "Low Risk:",
                "Small stones (<5mm) with lower confidence",
            ]
        );
    }

    #[test]
    fn disclaimer_is_on_last_page_near_bottom() {
        for count in [0, 7, 50] {
            let doc = layout(&patient(), &detection(count), &options());
            let entry = doc
                .outline()
                .iter()
                .find(|e| e.section == Section::Disclaimer)
                .unwrap();
            assert_eq!(entry.page, doc.page_count() - 1);

            let rect = doc
                .blocks_of(Section::Disclaimer)
                .find_map(|b| match &b.kind {
                    BlockKind::FilledRect(r) => Some(r.clone()),
                    _ => None,
                })
                .unwrap();
            assert_eq!(rect.y + rect.height, PageGeometry::a4().bottom_limit() - 5.0);
            assert!(doc.text_of(Section::Disclaimer).len() >= 3);
        }
    }

    #[test]
    fn ensure_room_breaks_only_when_needed() {
        let mut state = LayoutState::new(PageGeometry::a4(), "t");
        assert!(!state.ensure_room(100.0));
        state.set_y(250.0);
        assert!(!state.ensure_room(27.0));
        assert!(state.ensure_room(28.0));
        assert_eq!(state.cursor(), Cursor { page: 1, y: 20.0 });
        assert_eq!(state.document().page_count(), 2);
    }

    #[test]
    fn oversized_block_at_top_does_not_loop() {
        let mut state = LayoutState::new(PageGeometry::a4(), "t");
        assert!(!state.ensure_room(500.0));
        assert_eq!(state.document().page_count(), 1);
    }
}
