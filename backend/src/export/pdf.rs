//! A4 PDF rendering of the flowing layout

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::error::{AppError, AppResult};
use crate::export::layout::{document_blocks, Block, FlowLayout, Page};
use crate::export::ReportDocument;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const FOOTER_BASELINE_MM: f32 = 12.0;
/// Printable height between the top margin and the footer band
pub const CONTENT_HEIGHT_MM: f32 = PAGE_HEIGHT_MM - MARGIN_MM - 25.0;
const VALUE_COLUMN_MM: f32 = 90.0;
const MAX_VALUE_CHARS: usize = 60;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn pdf_error(err: printpdf::Error) -> AppError {
    AppError::Export(format!("PDF generation error: {}", err))
}

fn clip(text: &str) -> String {
    if text.chars().count() <= MAX_VALUE_CHARS {
        text.to_string()
    } else {
        let mut clipped: String = text.chars().take(MAX_VALUE_CHARS - 3).collect();
        clipped.push_str("...");
        clipped
    }
}

fn draw_page(layer: &PdfLayerReference, page: &Page, total: usize, footer: &str, fonts: &Fonts) {
    for placed in &page.blocks {
        // Text baseline sits near the bottom of the block's band
        let baseline = PAGE_HEIGHT_MM - MARGIN_MM - placed.top - placed.block.height() * 0.75;
        match &placed.block {
            Block::Title(text) => {
                layer.use_text(text.as_str(), 16.0, Mm(MARGIN_MM), Mm(baseline), &fonts.bold)
            }
            Block::Subtitle(text) => {
                layer.use_text(text.as_str(), 9.0, Mm(MARGIN_MM), Mm(baseline), &fonts.regular)
            }
            Block::Heading(text) => {
                layer.use_text(text.as_str(), 12.0, Mm(MARGIN_MM), Mm(baseline), &fonts.bold)
            }
            Block::Field { label, value } => {
                layer.use_text(label.as_str(), 10.0, Mm(MARGIN_MM + 4.0), Mm(baseline), &fonts.bold);
                layer.use_text(clip(value), 10.0, Mm(VALUE_COLUMN_MM), Mm(baseline), &fonts.regular);
            }
            Block::Spacer => {}
        }
    }

    layer.use_text(footer, 8.0, Mm(MARGIN_MM), Mm(FOOTER_BASELINE_MM), &fonts.regular);
    layer.use_text(
        page.footer_label(total),
        8.0,
        Mm(PAGE_WIDTH_MM - MARGIN_MM - 25.0),
        Mm(FOOTER_BASELINE_MM),
        &fonts.regular,
    );
}

/// Render the document to PDF bytes with the footer and page numbering on
/// every page
pub fn render_pdf(document: &ReportDocument, footer: &str) -> AppResult<Vec<u8>> {
    let pages = FlowLayout::new(CONTENT_HEIGHT_MM).paginate(document_blocks(document));
    let total = pages.len();

    let (pdf, first_page, first_layer) = PdfDocument::new(
        document.title.as_str(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Contenido",
    );
    let fonts = Fonts {
        regular: pdf.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
        bold: pdf.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
    };

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            pdf.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) =
                pdf.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Contenido");
            pdf.get_page(page_index).get_layer(layer_index)
        };
        draw_page(&layer, page, total, footer, &fonts);
    }

    tracing::debug!(pages = total, kind = document.kind.slug(), "PDF rendered");
    pdf.save_to_bytes().map_err(pdf_error)
}
