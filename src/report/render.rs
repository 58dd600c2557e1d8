//! PDF serialization of a laid-out [`ReportDocument`] via `printpdf`.

use std::io::BufWriter;

use image::{DynamicImage, GenericImageView as _};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Rect, Rgb,
};

use super::document::{BlockKind, FontWeight, Page, ReportDocument};
use crate::config::PageGeometry;
use crate::error::ReportError;
use crate::models::RgbColor;

/// Resolution images are registered at; only the transform scale matters.
const IMAGE_DPI: f32 = 300.0;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn for_weight(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

/// Render the document to PDF bytes. Nothing is written anywhere; a failure
/// leaves no partial output behind.
pub fn render_pdf(document: &ReportDocument, geometry: &PageGeometry) -> Result<Vec<u8>, ReportError> {
    let page_w = Mm(geometry.width);
    let page_h = Mm(geometry.height);
    let (doc, first_page, first_layer) = PdfDocument::new(&document.title, page_w, page_h, "Layer 1");

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Render(format!("PDF font error: {e}")))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError::Render(format!("PDF font error: {e}")))?,
    };

    for (index, page) in document.pages().iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) = doc.add_page(page_w, page_h, "Layer 1");
            doc.get_page(page_idx).get_layer(layer_idx)
        };
        draw_page(&layer, page, &fonts, geometry.height);
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Render(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ReportError::Render(format!("PDF buffer error: {e}")))
}

fn draw_page(layer: &PdfLayerReference, page: &Page, fonts: &Fonts, page_height: f32) {
    // Layout measures from the top edge; PDF user space grows upwards.
    let flip = |y: f32| Mm(page_height - y);

    for block in &page.blocks {
        match &block.kind {
            BlockKind::Text(t) => {
                layer.set_fill_color(pdf_color(t.style.color));
                layer.use_text(
                    t.text.as_str(),
                    t.style.size_pt,
                    Mm(t.x),
                    flip(t.y),
                    fonts.for_weight(t.style.weight),
                );
            }
            BlockKind::Separator(s) => {
                layer.set_outline_color(pdf_color(s.color));
                layer.set_outline_thickness(0.5);
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(s.x1), flip(s.y)), false),
                        (Point::new(Mm(s.x2), flip(s.y)), false),
                    ],
                    is_closed: false,
                });
            }
            BlockKind::FilledRect(r) => {
                layer.set_fill_color(pdf_color(r.color));
                layer.add_rect(Rect::new(
                    Mm(r.x),
                    flip(r.y + r.height),
                    Mm(r.x + r.width),
                    flip(r.y),
                ));
            }
            BlockKind::Image(placed) => {
                let (px_w, px_h) = placed.image.dimensions();
                let natural_w = px_w as f32 * 25.4 / IMAGE_DPI;
                let natural_h = px_h as f32 * 25.4 / IMAGE_DPI;
                // Alpha channels are not embedded reliably; flatten to RGB.
                let rgb = DynamicImage::ImageRgb8(placed.image.to_rgb8());
                Image::from_dynamic_image(&rgb).add_to_layer(
                    layer.clone(),
                    ImageTransform {
                        translate_x: Some(Mm(placed.x)),
                        translate_y: Some(flip(placed.y + placed.height)),
                        scale_x: Some(placed.width / natural_w),
                        scale_y: Some(placed.height / natural_h),
                        dpi: Some(IMAGE_DPI),
                        ..Default::default()
                    },
                );
            }
        }
    }
}

fn pdf_color(color: RgbColor) -> Color {
    let (r, g, b) = color.to_unit();
    Color::Rgb(Rgb::new(r, g, b, None))
}
