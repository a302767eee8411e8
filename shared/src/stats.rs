//! Statistics calculator
//!
//! Pure joins over one snapshot of lots, organizations, samples and
//! processes. Samples are always reached through the lot they reference.
//! The nested filtering is O(N x M), which is fine at the cooperative's
//! scale of hundreds of records.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{
    find_organization, Lot, LotState, Organization, Process, ProcessPhase, ProcessState, Sample,
    SampleState,
};
use crate::owners::{extract_owners, Owner};

const DAY_MS: i64 = 86_400_000;

/// Sample counts by state plus approval and rejection percentages
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct SampleStats {
    pub total: usize,
    #[serde(rename = "aprobadas")]
    pub approved: usize,
    #[serde(rename = "contaminadas")]
    pub contaminated: usize,
    #[serde(rename = "pendientes")]
    pub pending: usize,
    #[serde(rename = "porcentajeAprobacion")]
    pub approval_percentage: String,
    #[serde(rename = "porcentajeRechazo")]
    pub rejection_percentage: String,
}

impl SampleStats {
    pub fn from_samples<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = &'a Sample>,
    {
        let mut stats = SampleStats::default();
        for sample in samples {
            stats.total += 1;
            match sample.state {
                SampleState::Approved => stats.approved += 1,
                SampleState::Contaminated => stats.contaminated += 1,
                SampleState::Pending => stats.pending += 1,
                _ => {}
            }
        }
        stats.approval_percentage = percentage(stats.approved, stats.total);
        stats.rejection_percentage = percentage(stats.contaminated, stats.total);
        stats
    }
}

/// `count / total * 100` with one decimal; "0.0" when `total` is zero
pub fn percentage(count: usize, total: usize) -> String {
    ratio_percentage(Decimal::from(count as u64), Decimal::from(total as u64))
}

fn ratio_percentage(part: Decimal, whole: Decimal) -> String {
    let value = if whole.is_zero() {
        Decimal::ZERO
    } else {
        part.checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| scaled.checked_div(whole))
            .unwrap_or(Decimal::ZERO)
    };
    format!(
        "{:.1}",
        value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Weight lost between the initial and final weighing of a lot
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeightLoss {
    #[serde(rename = "perdida")]
    pub loss: Decimal,
    #[serde(rename = "porcentaje")]
    pub percentage: String,
}

impl WeightLoss {
    fn unknown() -> Self {
        Self {
            loss: Decimal::ZERO,
            percentage: "0.0".to_string(),
        }
    }
}

/// Weight loss, only when both weights are present and non-zero. A zero
/// final weight means "not weighed yet", not a 100% loss.
pub fn weight_loss(initial: Option<Decimal>, final_weight: Option<Decimal>) -> WeightLoss {
    match (initial, final_weight) {
        (Some(initial), Some(final_weight)) if !initial.is_zero() && !final_weight.is_zero() => {
            let loss = initial - final_weight;
            WeightLoss {
                loss,
                percentage: ratio_percentage(loss, initial),
            }
        }
        _ => WeightLoss::unknown(),
    }
}

/// Whole days between start and end, rounding up. A missing end date, or
/// one before the start, counts as still running.
pub fn duration_days(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> i64 {
    let Some(start) = start else { return 0 };
    let end = match end {
        Some(end) if end >= start => end,
        _ => now,
    };
    let elapsed = (end - start).num_milliseconds();
    if elapsed <= 0 {
        0
    } else {
        (elapsed + DAY_MS - 1) / DAY_MS
    }
}

/// Borrowed view over one snapshot
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub organizations: &'a [Organization],
    pub lots: &'a [Lot],
    pub samples: &'a [Sample],
    pub processes: &'a [Process],
    /// Precomputed owners; extracted from `lots` when absent
    pub owners: Option<&'a [Owner]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationReport {
    #[serde(rename = "organizacionId")]
    pub organization_id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "contacto")]
    pub contact: Option<String>,
    #[serde(rename = "totalLotes")]
    pub total_lots: usize,
    #[serde(rename = "totalPropietarios")]
    pub total_owners: usize,
    #[serde(rename = "totalQuintales")]
    pub total_quintals: Decimal,
    #[serde(rename = "estadisticasMuestras")]
    pub sample_stats: SampleStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerReport {
    #[serde(rename = "cedula")]
    pub national_id: String,
    #[serde(rename = "nombreCompleto")]
    pub full_name: String,
    #[serde(rename = "organizacionId")]
    pub organization_id: Option<i64>,
    /// Primary organization name with a "(+N más)" suffix for the others
    #[serde(rename = "organizacion")]
    pub organization_display: String,
    #[serde(rename = "organizacionesAdicionales")]
    pub additional_organizations: usize,
    #[serde(rename = "totalLotes")]
    pub total_lots: usize,
    #[serde(rename = "totalQuintales")]
    pub total_quintals: Decimal,
    #[serde(rename = "estadisticasMuestras")]
    pub sample_stats: SampleStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    #[serde(rename = "procesoId")]
    pub process_id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "estado")]
    pub state: ProcessState,
    #[serde(rename = "faseActual")]
    pub phase: ProcessPhase,
    #[serde(rename = "responsable")]
    pub responsible: Option<String>,
    #[serde(rename = "fechaInicio")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "fechaFin")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(rename = "duracionDias")]
    pub duration_days: i64,
    #[serde(rename = "totalLotes")]
    pub total_lots: usize,
    #[serde(rename = "totalPropietarios")]
    pub total_owners: usize,
    #[serde(rename = "totalQuintales")]
    pub total_quintals: Decimal,
    #[serde(rename = "pesoInicial")]
    pub initial_weight: Decimal,
    #[serde(rename = "pesoActual")]
    pub current_weight: Decimal,
    #[serde(rename = "estadisticasMuestras")]
    pub sample_stats: SampleStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct LotReport {
    #[serde(rename = "loteId")]
    pub lot_id: i64,
    #[serde(rename = "numeroLote")]
    pub lot_number: String,
    #[serde(rename = "organizacionId")]
    pub organization_id: Option<i64>,
    #[serde(rename = "organizacion")]
    pub organization_name: String,
    #[serde(rename = "estado")]
    pub state: LotState,
    #[serde(rename = "fechaEntrega")]
    pub delivery_date: Option<DateTime<Utc>>,
    #[serde(rename = "totalQuintales")]
    pub total_quintals: Decimal,
    #[serde(rename = "totalPropietarios")]
    pub total_owners: usize,
    #[serde(rename = "pesoInicial")]
    pub initial_weight: Decimal,
    #[serde(rename = "pesoFinal")]
    pub final_weight: Decimal,
    #[serde(rename = "perdidaPeso")]
    pub weight_loss: WeightLoss,
    #[serde(rename = "estadisticasMuestras")]
    pub sample_stats: SampleStats,
}

/// General-summary block shown above the detail blocks
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    #[serde(rename = "totalEntidades")]
    pub entities: usize,
    #[serde(rename = "totalLotes")]
    pub total_lots: usize,
    #[serde(rename = "totalQuintales")]
    pub total_quintals: Decimal,
    #[serde(rename = "estadisticasMuestras")]
    pub sample_stats: SampleStats,
}

/// All four reports computed from the same snapshot
#[derive(Debug, Clone, Serialize)]
pub struct Reports {
    #[serde(rename = "organizaciones")]
    pub organizations: Vec<OrganizationReport>,
    #[serde(rename = "propietarios")]
    pub owners: Vec<OwnerReport>,
    #[serde(rename = "procesos")]
    pub processes: Vec<ProcessReport>,
    #[serde(rename = "lotes")]
    pub lots: Vec<LotReport>,
}

pub fn build_reports(input: &ReportInput<'_>, now: DateTime<Utc>) -> Reports {
    Reports {
        organizations: organization_reports(input),
        owners: owner_reports(input),
        processes: process_reports(input, now),
        lots: lot_reports(input),
    }
}

fn samples_of_lots<'a>(samples: &'a [Sample], lot_ids: &HashSet<i64>) -> Vec<&'a Sample> {
    samples
        .iter()
        .filter(|s| s.lot_id.is_some_and(|id| lot_ids.contains(&id)))
        .collect()
}

fn distinct_owners<'a, I>(lots: I) -> usize
where
    I: IntoIterator<Item = &'a Lot>,
{
    lots.into_iter()
        .flat_map(|lot| lot.owners.iter())
        .map(|o| o.national_id.trim())
        .filter(|id| !id.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

pub fn organization_reports(input: &ReportInput<'_>) -> Vec<OrganizationReport> {
    input
        .organizations
        .iter()
        .map(|org| {
            let lots: Vec<&Lot> = input
                .lots
                .iter()
                .filter(|lot| lot.organization_id == Some(org.id))
                .collect();
            let lot_ids: HashSet<i64> = lots.iter().map(|lot| lot.id).collect();
            let samples = samples_of_lots(input.samples, &lot_ids);

            OrganizationReport {
                organization_id: org.id,
                name: org.name.clone(),
                contact: org.contact.clone(),
                total_lots: lots.len(),
                total_owners: distinct_owners(lots.iter().copied()),
                total_quintals: lots.iter().map(|lot| lot.total_quintals).sum(),
                sample_stats: SampleStats::from_samples(samples),
            }
        })
        .collect()
}

fn organization_label(organizations: &[Organization], id: Option<i64>) -> String {
    find_organization(organizations, id)
        .map(|org| org.name.clone())
        .unwrap_or_else(|| "Sin organización".to_string())
}

pub fn owner_reports(input: &ReportInput<'_>) -> Vec<OwnerReport> {
    let extracted;
    let owners = match input.owners {
        Some(owners) => owners,
        None => {
            extracted = extract_owners(input.lots);
            extracted.as_slice()
        }
    };

    owners
        .iter()
        .map(|owner| {
            let lots: Vec<&Lot> = input
                .lots
                .iter()
                .filter(|lot| lot.has_owner(&owner.national_id))
                .collect();
            // Samples only carry the owner's name: two owners sharing a name
            // will see each other's samples.
            let samples = input
                .samples
                .iter()
                .filter(|s| s.owner_name.as_deref() == Some(owner.full_name.as_str()));

            let mut organization_display = organization_label(input.organizations, owner.organization_id);
            let extra = owner.additional_organizations.len();
            if extra > 0 {
                organization_display = format!("{} (+{} más)", organization_display, extra);
            }

            OwnerReport {
                national_id: owner.national_id.clone(),
                full_name: owner.full_name.clone(),
                organization_id: owner.organization_id,
                organization_display,
                additional_organizations: extra,
                total_lots: lots.len(),
                total_quintals: lots.iter().map(|lot| lot.quintals_for(&owner.national_id)).sum(),
                sample_stats: SampleStats::from_samples(samples),
            }
        })
        .collect()
}

pub fn process_reports(input: &ReportInput<'_>, now: DateTime<Utc>) -> Vec<ProcessReport> {
    input
        .processes
        .iter()
        .map(|process| {
            let lots = process.resolve_lots(input.lots);
            let lot_ids: HashSet<i64> = lots.iter().map(|lot| lot.id).collect();
            let samples = samples_of_lots(input.samples, &lot_ids);

            ProcessReport {
                process_id: process.id,
                name: process.display_name(),
                state: process.state.clone(),
                phase: process.phase.clone(),
                responsible: process.responsible.clone(),
                started_at: process.started_at,
                finished_at: process.finished_at,
                duration_days: duration_days(process.started_at, process.finished_at, now),
                total_lots: lots.len(),
                total_owners: distinct_owners(lots.iter().copied()),
                total_quintals: lots.iter().map(|lot| lot.total_quintals).sum(),
                initial_weight: process.initial_total_weight.unwrap_or_default(),
                current_weight: process.current_total_weight.unwrap_or_default(),
                sample_stats: SampleStats::from_samples(samples),
            }
        })
        .collect()
}

pub fn lot_reports(input: &ReportInput<'_>) -> Vec<LotReport> {
    input
        .lots
        .iter()
        .map(|lot| LotReport {
            lot_id: lot.id,
            lot_number: lot.display_number(),
            organization_id: lot.organization_id,
            organization_name: organization_label(input.organizations, lot.organization_id),
            state: lot.state.clone(),
            delivery_date: lot.delivery_date,
            total_quintals: lot.total_quintals,
            total_owners: distinct_owners([lot]),
            initial_weight: lot.initial_weight.unwrap_or_default(),
            final_weight: lot.final_weight.unwrap_or_default(),
            weight_loss: lot.weight_loss(),
            sample_stats: SampleStats::from_samples(input.samples.iter().filter(|s| s.belongs_to_lot(lot.id))),
        })
        .collect()
}

/// General summary over the snapshot scope for a report with `entities` rows
pub fn summarize(input: &ReportInput<'_>, entities: usize) -> ReportSummary {
    ReportSummary {
        entities,
        total_lots: input.lots.len(),
        total_quintals: input.lots.iter().map(|lot| lot.total_quintals).sum(),
        sample_stats: SampleStats::from_samples(input.samples),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1, 2), "50.0");
        assert_eq!(percentage(1, 3), "33.3");
        assert_eq!(percentage(2, 3), "66.7");
        assert_eq!(percentage(0, 0), "0.0");
        assert_eq!(percentage(5, 0), "0.0");
    }

    #[test]
    fn test_weight_loss_guards() {
        let loss = weight_loss(Some(Decimal::from(100)), Some(Decimal::from(80)));
        assert_eq!(loss.loss, Decimal::from(20));
        assert_eq!(loss.percentage, "20.0");

        assert_eq!(weight_loss(Some(Decimal::from(100)), Some(Decimal::ZERO)).percentage, "0.0");
        assert_eq!(weight_loss(None, Some(Decimal::from(80))).loss, Decimal::ZERO);
        assert_eq!(weight_loss(Some(Decimal::ZERO), Some(Decimal::from(80))).percentage, "0.0");
    }

    #[test]
    fn test_duration_days_rounds_up() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();

        assert_eq!(duration_days(Some(start), Some(end), now), 3);
        assert_eq!(duration_days(Some(start), None, now), 9);
        // End before start is not a real end date
        assert_eq!(duration_days(Some(end), Some(start), now), 7);
        assert_eq!(duration_days(None, Some(end), now), 0);
        assert_eq!(duration_days(Some(start), Some(start), now), 0);
    }
}
