//! Reporting handlers: grouped reports, accounting summary and exports

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shared::{validate_date_range, AccountingSummary, LotState, ReportFilter};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::export::{html::render_print_html, pdf::render_pdf, ReportDocument};
use crate::services::reporting::{ReportKind, ReportingService};
use crate::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Html,
    Pdf,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ReportQuery {
    #[serde(default)]
    pub format: ExportFormat,
    /// Delivery date lower bound, `YYYY-MM-DD`
    pub desde: Option<String>,
    /// Delivery date upper bound, `YYYY-MM-DD`
    pub hasta: Option<String>,
    #[validate(range(min = 1))]
    pub organizacion: Option<i64>,
    pub estado: Option<String>,
}

fn parse_date(field: &str, value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::Validation {
                field: field.to_string(),
                message: format!("Expected a date as YYYY-MM-DD, got '{}'", raw),
                message_es: format!("Se esperaba una fecha AAAA-MM-DD, se recibió '{}'", raw),
            }),
    }
}

impl ReportQuery {
    pub fn to_filter(&self) -> AppResult<ReportFilter> {
        self.validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let delivered_from = parse_date("desde", self.desde.as_deref())?;
        let delivered_to = parse_date("hasta", self.hasta.as_deref())?;
        validate_date_range(delivered_from, delivered_to)?;

        Ok(ReportFilter {
            delivered_from,
            delivered_to,
            organization_id: self.organizacion,
            lot_state: self
                .estado
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(LotState::from),
        })
    }
}

fn document_response(content_type: &str, disposition: String, body: impl IntoResponse) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

/// Get one grouped report as JSON or as an exported document
pub async fn get_report(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Response> {
    let kind: ReportKind = kind.parse()?;
    let filter = query.to_filter()?;
    let snapshot = state.snapshots.require().await?;

    let report = ReportingService::new(snapshot).generate(kind, &filter, Utc::now());
    let organization = state.config.report.organization.as_str();
    let footer = state.config.report.footer.as_str();

    let response = match query.format {
        ExportFormat::Json => Json(&report).into_response(),
        ExportFormat::Csv => {
            let document = ReportDocument::from_report(&report, organization);
            document_response(
                "text/csv; charset=utf-8",
                format!("attachment; filename=\"{}\"", document.file_name("csv")),
                ReportingService::export_to_csv(&document)?,
            )
        }
        ExportFormat::Html => {
            let document = ReportDocument::from_report(&report, organization);
            document_response(
                "text/html; charset=utf-8",
                format!("inline; filename=\"{}\"", document.file_name("html")),
                render_print_html(&document, footer),
            )
        }
        ExportFormat::Pdf => {
            let document = ReportDocument::from_report(&report, organization);
            document_response(
                "application/pdf",
                format!("attachment; filename=\"{}\"", document.file_name("pdf")),
                render_pdf(&document, footer)?,
            )
        }
    };

    tracing::info!(kind = kind.slug(), format = ?query.format, "Report served");
    Ok(response)
}

/// Labor and machinery summary per lot and process
pub async fn get_accounting(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<AccountingSummary>> {
    let filter = query.to_filter()?;
    let snapshot = state.snapshots.require().await?;
    Ok(Json(ReportingService::new(snapshot).accounting(&filter)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_to_filter() {
        let query = ReportQuery {
            desde: Some("2024-01-01".to_string()),
            hasta: Some("2024-03-31".to_string()),
            organizacion: Some(2),
            estado: Some("aprobado".to_string()),
            ..Default::default()
        };
        let filter = query.to_filter().unwrap();
        assert_eq!(filter.delivered_from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filter.organization_id, Some(2));
        assert_eq!(filter.lot_state, Some(LotState::Approved));
    }

    #[test]
    fn test_query_rejects_bad_input() {
        let inverted = ReportQuery {
            desde: Some("2024-05-01".to_string()),
            hasta: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        assert!(inverted.to_filter().is_err());

        let bad_date = ReportQuery {
            desde: Some("01/05/2024".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_date.to_filter(), Err(AppError::Validation { .. })));

        let bad_org = ReportQuery {
            organizacion: Some(0),
            ..Default::default()
        };
        assert!(bad_org.to_filter().is_err());
    }
}
