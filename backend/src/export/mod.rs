//! Report export: a format-neutral document rendered to printable HTML,
//! paginated PDF or flat CSV

pub mod html;
pub mod layout;
pub mod pdf;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{ReportFilter, SampleStats};

use crate::services::reporting::{GeneratedReport, ReportKind, ReportRows};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Field {
    pub label: String,
    pub value: String,
}

impl Field {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
        }
    }
}

/// One detail block per grouped entity
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub heading: String,
    pub fields: Vec<Field>,
}

/// Title, generation timestamp, general summary and detail blocks
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub kind: ReportKind,
    pub title: String,
    pub organization: String,
    pub generated_at: DateTime<Utc>,
    pub filter_description: Option<String>,
    pub summary: Vec<Field>,
    pub sections: Vec<Section>,
}

fn quantity(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "Sin fecha".to_string())
}

fn sample_fields(stats: &SampleStats) -> Vec<Field> {
    vec![
        Field::new("Muestras", stats.total.to_string()),
        Field::new("Aprobadas", stats.approved.to_string()),
        Field::new("Contaminadas", stats.contaminated.to_string()),
        Field::new("Pendientes", stats.pending.to_string()),
        Field::new("% Aprobación", format!("{}%", stats.approval_percentage)),
        Field::new("% Rechazo", format!("{}%", stats.rejection_percentage)),
    ]
}

fn describe_filter(filter: &ReportFilter) -> Option<String> {
    if filter.is_empty() {
        return None;
    }
    let mut parts = Vec::new();
    if let Some(from) = filter.delivered_from {
        parts.push(format!("desde {}", from.format("%d/%m/%Y")));
    }
    if let Some(to) = filter.delivered_to {
        parts.push(format!("hasta {}", to.format("%d/%m/%Y")));
    }
    if let Some(org) = filter.organization_id {
        parts.push(format!("organización #{}", org));
    }
    if let Some(state) = &filter.lot_state {
        parts.push(format!("estado {}", state.label()));
    }
    Some(format!("Filtro: {}", parts.join(", ")))
}

fn sections(rows: &ReportRows) -> Vec<Section> {
    match rows {
        ReportRows::Organizations(rows) => rows
            .iter()
            .map(|r| {
                let mut fields = vec![
                    Field::new("Contacto", r.contact.clone().unwrap_or_else(|| "Sin contacto".to_string())),
                    Field::new("Lotes", r.total_lots.to_string()),
                    Field::new("Propietarios", r.total_owners.to_string()),
                    Field::new("Quintales", quantity(r.total_quintals)),
                ];
                fields.extend(sample_fields(&r.sample_stats));
                Section {
                    heading: r.name.clone(),
                    fields,
                }
            })
            .collect(),
        ReportRows::Owners(rows) => rows
            .iter()
            .map(|r| {
                let mut fields = vec![
                    Field::new("Cédula", r.national_id.clone()),
                    Field::new("Organización", r.organization_display.clone()),
                    Field::new("Lotes", r.total_lots.to_string()),
                    Field::new("Quintales entregados", quantity(r.total_quintals)),
                ];
                fields.extend(sample_fields(&r.sample_stats));
                Section {
                    heading: r.full_name.clone(),
                    fields,
                }
            })
            .collect(),
        ReportRows::Processes(rows) => rows
            .iter()
            .map(|r| {
                let mut fields = vec![
                    Field::new("Estado", r.state.label()),
                    Field::new("Fase actual", r.phase.label()),
                    Field::new("Responsable", r.responsible.clone().unwrap_or_else(|| "Sin asignar".to_string())),
                    Field::new("Inicio", date(r.started_at)),
                    Field::new("Fin", date(r.finished_at)),
                    Field::new("Duración (días)", r.duration_days.to_string()),
                    Field::new("Lotes", r.total_lots.to_string()),
                    Field::new("Propietarios", r.total_owners.to_string()),
                    Field::new("Quintales", quantity(r.total_quintals)),
                    Field::new("Peso inicial", quantity(r.initial_weight)),
                    Field::new("Peso actual", quantity(r.current_weight)),
                ];
                fields.extend(sample_fields(&r.sample_stats));
                Section {
                    heading: r.name.clone(),
                    fields,
                }
            })
            .collect(),
        ReportRows::Lots(rows) => rows
            .iter()
            .map(|r| {
                let mut fields = vec![
                    Field::new("Organización", r.organization_name.clone()),
                    Field::new("Estado", r.state.label()),
                    Field::new("Fecha de entrega", date(r.delivery_date)),
                    Field::new("Quintales", quantity(r.total_quintals)),
                    Field::new("Propietarios", r.total_owners.to_string()),
                    Field::new("Peso inicial", quantity(r.initial_weight)),
                    Field::new("Peso final", quantity(r.final_weight)),
                    Field::new("Pérdida de peso", quantity(r.weight_loss.loss)),
                    Field::new("% Pérdida", format!("{}%", r.weight_loss.percentage)),
                ];
                fields.extend(sample_fields(&r.sample_stats));
                Section {
                    heading: format!("Lote {}", r.lot_number),
                    fields,
                }
            })
            .collect(),
    }
}

impl ReportDocument {
    pub fn from_report(report: &GeneratedReport, organization: &str) -> Self {
        let summary = &report.summary;
        let mut summary_fields = vec![
            Field::new(
                &format!("Total ({})", report.kind.slug()),
                summary.entities.to_string(),
            ),
            Field::new("Total de lotes", summary.total_lots.to_string()),
            Field::new("Total de quintales", quantity(summary.total_quintals)),
        ];
        summary_fields.extend(sample_fields(&summary.sample_stats));

        Self {
            kind: report.kind,
            title: format!("{} - {}", organization, report.kind.title()),
            organization: organization.to_string(),
            generated_at: report.generated_at,
            filter_description: describe_filter(&report.filter),
            summary: summary_fields,
            sections: sections(&report.rows),
        }
    }

    /// `reporte_<tipo>_<DD-MM-YYYY>.<extension>`
    pub fn file_name(&self, extension: &str) -> String {
        format!(
            "reporte_{}_{}.{}",
            self.kind.slug(),
            self.generated_at.format("%d-%m-%Y"),
            extension
        )
    }

    pub fn generated_label(&self) -> String {
        format!("Generado: {} UTC", self.generated_at.format("%d/%m/%Y %H:%M"))
    }
}
