//! Reporting service
//! Builds organization, owner, process and lot reports from the current snapshot

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    lot_reports, organization_reports, owner_reports, process_reports, summarize_activity,
    summarize, AccountingSummary, FilteredCollections, LotReport, OrganizationReport, OwnerReport,
    ProcessReport, ReportFilter, ReportInput, ReportSummary,
};

use crate::error::{AppError, AppResult};
use crate::export::ReportDocument;
use crate::services::snapshot::Snapshot;

/// The four grouping dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Organizations,
    Owners,
    Processes,
    Lots,
}

impl ReportKind {
    /// Slug used in routes and file names
    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::Organizations => "organizaciones",
            ReportKind::Owners => "propietarios",
            ReportKind::Processes => "procesos",
            ReportKind::Lots => "lotes",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Organizations => "Reporte por Organización",
            ReportKind::Owners => "Reporte por Propietario",
            ReportKind::Processes => "Reporte por Proceso",
            ReportKind::Lots => "Reporte Detallado por Lote",
        }
    }

    /// Column header naming one row of the report
    pub fn entity_label(&self) -> &'static str {
        match self {
            ReportKind::Organizations => "Organización",
            ReportKind::Owners => "Propietario",
            ReportKind::Processes => "Proceso",
            ReportKind::Lots => "Lote",
        }
    }
}

impl FromStr for ReportKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "organizaciones" | "organizations" => Ok(ReportKind::Organizations),
            "propietarios" | "owners" => Ok(ReportKind::Owners),
            "procesos" | "processes" => Ok(ReportKind::Processes),
            "lotes" | "lots" => Ok(ReportKind::Lots),
            other => Err(AppError::NotFound(format!("Report type '{}'", other))),
        }
    }
}

impl Serialize for ReportKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.slug())
    }
}

/// Rows of one report type
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReportRows {
    Organizations(Vec<OrganizationReport>),
    Owners(Vec<OwnerReport>),
    Processes(Vec<ProcessReport>),
    Lots(Vec<LotReport>),
}

impl ReportRows {
    pub fn len(&self) -> usize {
        match self {
            ReportRows::Organizations(rows) => rows.len(),
            ReportRows::Owners(rows) => rows.len(),
            ReportRows::Processes(rows) => rows.len(),
            ReportRows::Lots(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A computed report with its general summary
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedReport {
    #[serde(rename = "tipo")]
    pub kind: ReportKind,
    #[serde(rename = "generadoEn")]
    pub generated_at: DateTime<Utc>,
    #[serde(rename = "datosAl")]
    pub snapshot_fetched_at: DateTime<Utc>,
    #[serde(rename = "filtro")]
    pub filter: ReportFilter,
    #[serde(rename = "resumen")]
    pub summary: ReportSummary,
    #[serde(rename = "detalle")]
    pub rows: ReportRows,
}

/// Reporting service over one snapshot
#[derive(Clone)]
pub struct ReportingService {
    snapshot: Arc<Snapshot>,
}

impl ReportingService {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot }
    }

    fn with_scope<R>(&self, filter: &ReportFilter, f: impl FnOnce(&ReportInput<'_>) -> R) -> R {
        if filter.is_empty() {
            f(&self.snapshot.as_input())
        } else {
            let scoped: FilteredCollections = self.snapshot.filtered(filter);
            f(&scoped.as_input())
        }
    }

    /// Generate one report type for the filtered scope
    pub fn generate(
        &self,
        kind: ReportKind,
        filter: &ReportFilter,
        now: DateTime<Utc>,
    ) -> GeneratedReport {
        let (summary, rows) = self.with_scope(filter, |input| {
            let rows = match kind {
                ReportKind::Organizations => ReportRows::Organizations(organization_reports(input)),
                ReportKind::Owners => ReportRows::Owners(owner_reports(input)),
                ReportKind::Processes => ReportRows::Processes(process_reports(input, now)),
                ReportKind::Lots => ReportRows::Lots(lot_reports(input)),
            };
            (summarize(input, rows.len()), rows)
        });

        tracing::debug!(kind = kind.slug(), rows = rows.len(), "Report generated");

        GeneratedReport {
            kind,
            generated_at: now,
            snapshot_fetched_at: self.snapshot.fetched_at,
            filter: filter.clone(),
            summary,
            rows,
        }
    }

    /// Accounting summary restricted to the lots and processes in scope
    pub fn accounting(&self, filter: &ReportFilter) -> AccountingSummary {
        self.with_scope(filter, |input| {
            let records: Vec<_> = if filter.is_empty() {
                self.snapshot.activity.clone()
            } else {
                self.snapshot
                    .activity
                    .iter()
                    .filter(|r| {
                        r.lot_id.is_some_and(|id| input.lots.iter().any(|l| l.id == id))
                            || r.process_id
                                .is_some_and(|id| input.processes.iter().any(|p| p.id == id))
                    })
                    .cloned()
                    .collect()
            };
            summarize_activity(&records, input.lots, input.processes)
        })
    }

    /// Export a report document as a flat CSV dump, one row per entity
    pub fn export_to_csv(document: &ReportDocument) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);

        let mut header = vec![document.kind.entity_label().to_string()];
        if let Some(first) = document.sections.first() {
            header.extend(first.fields.iter().map(|f| f.label.clone()));
        }
        wtr.write_record(&header)
            .map_err(|e| AppError::Export(format!("CSV serialization error: {}", e)))?;

        for section in &document.sections {
            let mut record = vec![section.heading.clone()];
            record.extend(section.fields.iter().map(|f| f.value.clone()));
            wtr.write_record(&record)
                .map_err(|e| AppError::Export(format!("CSV serialization error: {}", e)))?;
        }

        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Export(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Export(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}
