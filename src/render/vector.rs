//! Vector layout renderer: draws the invoice straight onto a fixed A4 page
//! with absolute-coordinate commands and finalizes the document into a
//! single buffer.
//!
//! The template is fixed: header band, two metadata boxes (number, date),
//! a bill-to block, a single-row line-item table with a dark header bar, a
//! totals band, and a footer. Missing optional fields were already
//! defaults-resolved by the builder, so every page renders complete.

use async_trait::async_trait;
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Line, Mm, PdfDocument, PdfLayerReference, Point, Rect, Rgb,
};

use crate::invoice::models::{InvoiceRecord, RenderedArtifact};

use super::{RenderError, RenderStrategy};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 18.0;
const CONTENT_RIGHT: f32 = PAGE_WIDTH - MARGIN;

// Palette shared with the markup template.
const ACCENT: (f32, f32, f32) = (0.145, 0.388, 0.922);
const INK: (f32, f32, f32) = (0.118, 0.161, 0.231);
const MUTED: (f32, f32, f32) = (0.392, 0.455, 0.545);
const PANEL: (f32, f32, f32) = (0.973, 0.980, 0.988);
const BORDER: (f32, f32, f32) = (0.886, 0.910, 0.941);
const WHITE: (f32, f32, f32) = (1.0, 1.0, 1.0);

/// One positioned piece of text. `top` is measured in mm from the top edge
/// of the page down to the baseline.
#[derive(Debug, Clone, PartialEq)]
struct TextRun {
    text: String,
    size: f32,
    x: f32,
    top: f32,
    color: (f32, f32, f32),
    bold: bool,
}

impl TextRun {
    fn new(text: impl Into<String>, size: f32, x: f32, top: f32) -> Self {
        Self {
            text: text.into(),
            size,
            x,
            top,
            color: INK,
            bold: false,
        }
    }

    fn color(mut self, color: (f32, f32, f32)) -> Self {
        self.color = color;
        self
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// All visible text of the page, in draw order. Kept separate from the
/// drawing pass so the page content can be inspected without decoding PDF
/// output.
fn text_runs(record: &InvoiceRecord) -> Vec<TextRun> {
    let amount = format!("${}", record.formatted_amount());
    let date = record.issue_date.format("%B %-d, %Y").to_string();

    vec![
        TextRun::new("INVOICE", 36.0, 78.0, 28.0).color(ACCENT).bold(),
        TextRun::new(&record.company_name, 18.0, MARGIN, 48.0).bold(),
        TextRun::new(&record.company_address, 10.0, MARGIN, 56.0).color(MUTED),
        TextRun::new("INVOICE NUMBER", 8.0, 22.0, 92.0).color(MUTED),
        TextRun::new(&record.invoice_number, 12.0, 22.0, 99.0),
        TextRun::new("INVOICE DATE", 8.0, 113.0, 92.0).color(MUTED),
        TextRun::new(date, 12.0, 113.0, 99.0),
        TextRun::new("BILL TO", 11.0, MARGIN, 128.0).color(MUTED),
        TextRun::new(&record.client_identifier, 14.0, MARGIN, 136.0).bold(),
        TextRun::new("DESCRIPTION", 10.0, 22.0, 157.0).color(WHITE).bold(),
        TextRun::new("AMOUNT", 10.0, 158.0, 157.0).color(WHITE).bold(),
        TextRun::new(&record.description, 11.0, 22.0, 170.0),
        TextRun::new(&amount, 11.0, 158.0, 170.0).bold(),
        TextRun::new("TOTAL AMOUNT", 14.0, 22.0, 197.0).color(WHITE).bold(),
        TextRun::new(&amount, 22.0, 148.0, 199.0).color(WHITE).bold(),
        TextRun::new("Thank you for your business!", 11.0, 72.0, 240.0),
        TextRun::new("This is a system generated invoice.", 9.0, 78.0, 248.0).color(MUTED),
    ]
}

fn rgb(color: (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(color.0, color.1, color.2, None))
}

/// Fill a rectangle given its top edge (mm from page top), optionally with
/// a stroked border.
fn draw_band(
    layer: &PdfLayerReference,
    x: f32,
    top: f32,
    width: f32,
    height: f32,
    fill: (f32, f32, f32),
    border: Option<(f32, f32, f32)>,
) {
    layer.set_fill_color(rgb(fill));
    let mode = match border {
        Some(color) => {
            layer.set_outline_color(rgb(color));
            layer.set_outline_thickness(0.6);
            PaintMode::FillStroke
        }
        None => PaintMode::Fill,
    };
    let rect = Rect::new(
        Mm(x),
        Mm(PAGE_HEIGHT - (top + height)),
        Mm(x + width),
        Mm(PAGE_HEIGHT - top),
    )
    .with_mode(mode);
    layer.add_rect(rect);
}

fn draw_rule(layer: &PdfLayerReference, top: f32, color: (f32, f32, f32), thickness: f32) {
    layer.set_outline_color(rgb(color));
    layer.set_outline_thickness(thickness);
    let line = Line {
        points: vec![
            (Point::new(Mm(MARGIN), Mm(PAGE_HEIGHT - top)), false),
            (Point::new(Mm(CONTENT_RIGHT), Mm(PAGE_HEIGHT - top)), false),
        ],
        is_closed: false,
    };
    layer.add_line(line);
}

fn render_sync(record: &InvoiceRecord) -> Result<Vec<u8>, RenderError> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Invoice {}", record.invoice_number),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "invoice",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError::Document(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| RenderError::Document(e.to_string()))?;
    let layer = doc.get_page(page).get_layer(layer);

    // Bands and rules first, text on top.
    draw_rule(&layer, 74.0, ACCENT, 2.4);
    draw_band(&layer, MARGIN, 84.0, 83.0, 24.0, PANEL, Some(BORDER));
    draw_band(&layer, 109.0, 84.0, 83.0, 24.0, PANEL, Some(BORDER));
    draw_band(&layer, MARGIN, 148.0, CONTENT_RIGHT - MARGIN, 11.0, INK, None);
    draw_rule(&layer, 176.0, BORDER, 0.4);
    draw_band(&layer, MARGIN, 186.0, CONTENT_RIGHT - MARGIN, 18.0, ACCENT, None);

    for run in text_runs(record) {
        layer.set_fill_color(rgb(run.color));
        let font = if run.bold { &bold } else { &regular };
        layer.use_text(&run.text, run.size, Mm(run.x), Mm(PAGE_HEIGHT - run.top), font);
    }

    // The buffer exists only once the document is explicitly closed.
    doc.save_to_bytes()
        .map_err(|e| RenderError::Document(e.to_string()))
}

/// Draws the fixed invoice template with direct vector commands.
#[derive(Debug, Default, Clone)]
pub struct VectorRenderer;

impl VectorRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RenderStrategy for VectorRenderer {
    async fn render(&self, record: &InvoiceRecord) -> Result<RenderedArtifact, RenderError> {
        let filename = record.filename();
        let record = record.clone();
        // Document assembly is CPU-bound; run it on the blocking pool and
        // resolve only with the fully finalized buffer.
        let bytes = tokio::task::spawn_blocking(move || render_sync(&record))
            .await
            .map_err(RenderError::Cancelled)??;
        Ok(RenderedArtifact { filename, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record() -> InvoiceRecord {
        InvoiceRecord {
            invoice_number: "INV-34567890".to_string(),
            client_identifier: "Acme Co".to_string(),
            amount: 1200.0,
            issue_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            description: "Professional Services".to_string(),
            company_name: "Test Co".to_string(),
            company_address: "1 Test Street".to_string(),
        }
    }

    fn texts(record: &InvoiceRecord) -> Vec<String> {
        text_runs(record).into_iter().map(|r| r.text).collect()
    }

    #[test]
    fn page_text_contains_all_resolved_fields() {
        let texts = texts(&record());
        assert!(texts.contains(&"Acme Co".to_string()));
        assert!(texts.contains(&"INV-34567890".to_string()));
        assert!(texts.contains(&"August 1, 2026".to_string()));
        assert!(texts.contains(&"Professional Services".to_string()));
        assert!(texts.contains(&"Test Co".to_string()));
    }

    #[test]
    fn totals_render_with_two_decimal_places() {
        let texts = texts(&record());
        assert_eq!(
            texts.iter().filter(|t| *t == "$1200.00").count(),
            2,
            "amount appears in the line item row and the totals band"
        );
    }

    #[test]
    fn same_record_lays_out_identical_text() {
        let a = text_runs(&record());
        let b = text_runs(&record());
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn render_finalizes_a_complete_pdf_buffer() {
        let renderer = VectorRenderer::new();
        let artifact = renderer.render(&record()).await.unwrap();
        assert_eq!(artifact.filename, "Invoice_INV-34567890.pdf");
        assert!(artifact.bytes.starts_with(b"%PDF"));
        assert!(artifact.bytes.len() > 500);
    }
}
