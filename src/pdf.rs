use std::io::BufWriter;

use printpdf::*;

use crate::error::{Result, SheetlensError};
use crate::fmt::grouped;
use crate::models::{AxisSelection, Row};
use crate::pipeline::{Analysis, ChartData};

// US Letter, millimetres.
const LETTER_SHORT: f32 = 215.9;
const LETTER_LONG: f32 = 279.4;
const MARGIN: f32 = 19.05;
const ROW_H: f32 = 5.0;
const FONT_SIZE: f32 = 9.0;
const TITLE_SIZE: f32 = 16.0;
const SUBTITLE_SIZE: f32 = 10.0;

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.18
}

/// Cut `text` so it fits in `width` mm, marking the cut with "...".
fn fit(text: &str, width: f32, size: f32) -> String {
    if approx_text_width(text, size) <= width {
        return text.to_string();
    }
    let max_chars = ((width / (size * 0.18)) as usize).saturating_sub(3);
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
}

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    page: PdfPageIndex,
    layer: PdfLayerIndex,
    width: f32,
    height: f32,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str, landscape: bool) -> Result<Self> {
        let (width, height) = if landscape {
            (LETTER_LONG, LETTER_SHORT)
        } else {
            (LETTER_SHORT, LETTER_LONG)
        };
        let (doc, page, layer) = PdfDocument::new(title, Mm(width), Mm(height), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| SheetlensError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| SheetlensError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            page,
            layer,
            width,
            height,
            y: MARGIN,
        })
    }

    fn usable_width(&self) -> f32 {
        self.width - 2.0 * MARGIN
    }

    fn pdf_y(&self) -> f32 {
        self.height - self.y
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > self.height - MARGIN {
            let (page, layer) = self.doc.add_page(Mm(self.width), Mm(self.height), "Layer");
            self.page = page;
            self.layer = layer;
            self.y = MARGIN;
        }
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        let layer = self.doc.get_page(self.page).get_layer(self.layer);
        layer.use_text(s, size, Mm(x), Mm(self.pdf_y()), font);
    }

    fn hline(&self) {
        let layer = self.doc.get_page(self.page).get_layer(self.layer);
        layer.set_outline_thickness(0.5);
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN), Mm(self.pdf_y())), false),
                (Point::new(Mm(self.width - MARGIN), Mm(self.pdf_y())), false),
            ],
            is_closed: false,
        });
    }

    fn header(&mut self, title: &str, subtitle: &str) {
        self.text(title, MARGIN, TITLE_SIZE, true);
        self.y += 7.0;
        if !subtitle.is_empty() {
            self.text(subtitle, MARGIN, SUBTITLE_SIZE, false);
            self.y += 5.0;
        }
        let ts = chrono::Local::now().format("Generated %Y-%m-%d %H:%M").to_string();
        self.text(&ts, MARGIN, 8.0, false);
        self.y += 5.0;
        self.hline();
        self.y += 5.0;
    }

    fn cells(&mut self, cols: &[Col], values: &[String], bold: bool) {
        self.ensure_space(ROW_H);
        let mut x = MARGIN;
        for (col, value) in cols.iter().zip(values) {
            let shown = fit(value, col.width - 1.5, FONT_SIZE);
            match col.align {
                Align::Left => self.text(&shown, x, FONT_SIZE, bold),
                Align::Right => {
                    let tw = approx_text_width(&shown, FONT_SIZE);
                    self.text(&shown, x + col.width - tw, FONT_SIZE, bold);
                }
            }
            x += col.width;
        }
        self.y += ROW_H;
    }

    fn table_header(&mut self, cols: &[Col], headers: &[String]) {
        self.ensure_space(ROW_H * 2.0);
        self.cells(cols, headers, true);
        self.hline();
        self.y += 2.0;
    }

    fn paragraph(&mut self, text: &str) {
        let chars_per_line = (self.usable_width() / (SUBTITLE_SIZE * 0.18)) as usize;
        for line in textwrap::wrap(text, chars_per_line.max(20)) {
            self.ensure_space(ROW_H);
            self.text(&line, MARGIN, SUBTITLE_SIZE, false);
            self.y += ROW_H;
        }
    }

    fn label_value(&mut self, label: &str, value: &str) {
        self.ensure_space(ROW_H);
        self.text(label, MARGIN, SUBTITLE_SIZE, true);
        self.text(value, MARGIN + 45.0, SUBTITLE_SIZE, false);
        self.y += ROW_H;
    }

    fn blank_row(&mut self) {
        self.y += ROW_H;
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| SheetlensError::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| SheetlensError::Pdf(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Render functions
// ---------------------------------------------------------------------------

/// Landscape table of `rows` under `columns`, split evenly across the page.
pub fn render_table(title: &str, columns: &[String], rows: &[Row]) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new(title, true)?;
    pdf.header(title, &format!("{} records", rows.len()));

    let width = pdf.usable_width() / columns.len().max(1) as f32;
    let cols: Vec<Col> = columns
        .iter()
        .map(|_| Col { width, align: Align::Left })
        .collect();
    pdf.table_header(&cols, columns);
    for row in rows {
        let values: Vec<String> = columns.iter().map(|c| row.get(c).display()).collect();
        pdf.cells(&cols, &values, false);
    }
    pdf.to_bytes()
}

/// Insights block followed by the displayed category series.
pub fn render_summary(
    title: &str,
    source: &str,
    analysis: &Analysis,
    axes: &AxisSelection,
) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new(title, false)?;
    pdf.header(title, source);

    let insights = &analysis.insights;
    pdf.label_value("Top category", &insights.top_category_label());
    pdf.label_value("Max value", &insights.max_label());
    pdf.label_value("Min value", &insights.min_label());
    pdf.label_value("Recommended", insights.recommendation.text());
    pdf.blank_row();
    pdf.paragraph(&insights.narrative.replace("**", ""));
    pdf.blank_row();

    if let ChartData::Ready(series) = &analysis.top {
        let cols = [
            Col { width: 120.0, align: Align::Left },
            Col { width: pdf.usable_width() - 120.0, align: Align::Right },
        ];
        let headers = [
            axes.category().unwrap_or_default().to_string(),
            axes.value().unwrap_or_default().to_string(),
        ];
        pdf.table_header(&cols, &headers);
        for (label, value) in series.iter() {
            pdf.cells(&cols, &[label.to_string(), grouped(value)], false);
        }
        pdf.hline();
        pdf.y += 2.0;
        pdf.cells(&cols, &["Total".to_string(), grouped(series.total())], true);
    }

    pdf.to_bytes()
}
