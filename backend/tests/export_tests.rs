//! Export tests: document building, pagination and rendered formats

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use fapecafe_reports::export::{
    html::render_print_html,
    layout::{document_blocks, Block, FlowLayout},
    pdf::{render_pdf, CONTENT_HEIGHT_MM},
    ReportDocument,
};
use fapecafe_reports::services::{ReportKind, ReportingService, Snapshot};
use proptest::prelude::*;
use serde_json::json;
use shared::ReportFilter;

fn snapshot_with_lots(count: i64) -> Arc<Snapshot> {
    let organizations = serde_json::from_value(json!([{ "id": 1, "nombre": "APECAEL" }])).unwrap();
    let lots = (1..=count)
        .map(|id| {
            serde_json::from_value(json!({
                "id": id,
                "numero_lote": format!("L-{:03}", id),
                "organizacion": 1,
                "total_quintales": "10.25",
                "propietarios": [{
                    "cedula": format!("17100340{:02}", id % 100),
                    "nombre_completo": format!("Productor <{}>", id),
                    "quintales_entregados": "10.25",
                }],
            }))
            .unwrap()
        })
        .collect();

    Arc::new(Snapshot::new(
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap(),
        organizations,
        lots,
        Vec::new(),
        Vec::new(),
        Vec::new(),
    ))
}

fn document(kind: ReportKind, lots: i64) -> ReportDocument {
    let now = Utc.with_ymd_and_hms(2024, 3, 5, 15, 0, 0).unwrap();
    let report = ReportingService::new(snapshot_with_lots(lots)).generate(kind, &ReportFilter::default(), now);
    ReportDocument::from_report(&report, "FAPECAFE")
}

fn block_strategy() -> impl Strategy<Value = Block> {
    prop_oneof![
        Just(Block::Title("Título".to_string())),
        Just(Block::Subtitle("Generado".to_string())),
        Just(Block::Heading("Lote".to_string())),
        Just(Block::Field { label: "Quintales".to_string(), value: "10.00".to_string() }),
        Just(Block::Spacer),
    ]
}

proptest! {
    #[test]
    fn pages_never_overflow(blocks in prop::collection::vec(block_strategy(), 0..200)) {
        let pages = FlowLayout::new(CONTENT_HEIGHT_MM).paginate(blocks.clone());

        prop_assert!(!pages.is_empty());
        for (i, page) in pages.iter().enumerate() {
            prop_assert_eq!(page.number, i + 1);
            prop_assert!(page.used_height() <= CONTENT_HEIGHT_MM);
        }

        let placed: Vec<&Block> = pages
            .iter()
            .flat_map(|p| p.blocks.iter().map(|b| &b.block))
            .filter(|b| **b != Block::Spacer)
            .collect();
        let expected: Vec<&Block> = blocks.iter().filter(|b| **b != Block::Spacer).collect();
        prop_assert_eq!(placed, expected);
    }
}

#[test]
fn test_document_structure() {
    let doc = document(ReportKind::Lots, 3);

    assert_eq!(doc.title, "FAPECAFE - Reporte Detallado por Lote");
    assert_eq!(doc.sections.len(), 3);
    assert_eq!(doc.sections[0].heading, "Lote L-001");
    assert_eq!(doc.sections[0].fields[0].label, "Organización");
    assert_eq!(doc.sections[0].fields[0].value, "APECAEL");
    assert_eq!(doc.file_name("pdf"), "reporte_lotes_05-03-2024.pdf");
    assert!(doc.filter_description.is_none());
}

#[test]
fn test_long_report_spans_pages() {
    let doc = document(ReportKind::Owners, 40);
    let pages = FlowLayout::new(CONTENT_HEIGHT_MM).paginate(document_blocks(&doc));

    assert!(pages.len() > 1);
    assert_eq!(pages[0].blocks[0].block, Block::Title(doc.title.clone()));
    assert_eq!(pages.last().unwrap().footer_label(pages.len()), format!("Página {} de {}", pages.len(), pages.len()));
}

#[test]
fn test_html_escapes_names() {
    let doc = document(ReportKind::Owners, 1);
    let html = render_print_html(&doc, "FAPECAFE - Sistema de Gestión de Café");

    assert!(html.contains("Productor &lt;1&gt;"));
    assert!(!html.contains("Productor <1>"));
    assert!(html.contains("Sistema de Gestión de Café"));
}

#[test]
fn test_pdf_for_empty_report() {
    let doc = document(ReportKind::Processes, 0);
    assert!(doc.sections.is_empty());

    let bytes = render_pdf(&doc, "pie").unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_csv_one_row_per_entity() {
    let doc = document(ReportKind::Organizations, 2);
    let csv = ReportingService::export_to_csv(&doc).unwrap();

    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "Organización");
    assert_eq!(&headers[1], "Contacto");

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "APECAEL");
    assert_eq!(&rows[0][2], "2");
    assert_eq!(&rows[0][4], "20.50");
}
