//! Self-contained printable HTML. The page opens the browser print dialog
//! on load so users can save it as PDF.

use std::fmt::Write;

use crate::export::{Field, ReportDocument};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
body { font-family: Helvetica, Arial, sans-serif; color: #222; margin: 20mm; }
h1 { font-size: 20px; margin-bottom: 4px; }
.meta { color: #555; font-size: 12px; margin: 2px 0; }
h2 { font-size: 15px; border-bottom: 1px solid #6b4226; padding-bottom: 3px; margin-top: 18px; }
table { border-collapse: collapse; width: 100%; font-size: 12px; }
th { text-align: left; width: 45%; font-weight: bold; padding: 2px 6px; }
td { padding: 2px 6px; }
.block { page-break-inside: avoid; }
footer { margin-top: 24px; font-size: 10px; color: #777; text-align: center; }
@page { size: A4; margin: 15mm; }
"#;

fn write_fields(out: &mut String, fields: &[Field]) {
    out.push_str("<table>");
    for field in fields {
        let _ = write!(
            out,
            "<tr><th>{}</th><td>{}</td></tr>",
            escape(&field.label),
            escape(&field.value)
        );
    }
    out.push_str("</table>");
}

pub fn render_print_html(document: &ReportDocument, footer: &str) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html><html lang=\"es\"><head><meta charset=\"utf-8\"><title>{}</title><style>{}</style></head><body>",
        escape(&document.title),
        STYLE
    );

    let _ = write!(out, "<h1>{}</h1>", escape(&document.title));
    let _ = write!(out, "<p class=\"meta\">{}</p>", escape(&document.generated_label()));
    if let Some(filter) = &document.filter_description {
        let _ = write!(out, "<p class=\"meta\">{}</p>", escape(filter));
    }

    out.push_str("<div class=\"block\"><h2>Resumen General</h2>");
    write_fields(&mut out, &document.summary);
    out.push_str("</div>");

    if document.sections.is_empty() {
        out.push_str("<p class=\"meta\">Sin registros para este reporte.</p>");
    }
    for section in &document.sections {
        let _ = write!(out, "<div class=\"block\"><h2>{}</h2>", escape(&section.heading));
        write_fields(&mut out, &section.fields);
        out.push_str("</div>");
    }

    let _ = write!(out, "<footer>{}</footer>", escape(footer));
    out.push_str("<script>window.addEventListener('load', function () { window.print(); });</script>");
    out.push_str("</body></html>");
    out
}
