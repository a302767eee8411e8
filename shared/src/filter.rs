//! Report filters
//!
//! Filters narrow the lot set; samples and processes follow through the lots
//! they reference, so every report stays consistent with the same scope.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Lot, LotRef, LotState, Organization, Process, Sample};
use crate::stats::ReportInput;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    /// Inclusive lower bound on the lot delivery date
    pub delivered_from: Option<NaiveDate>,
    /// Inclusive upper bound on the lot delivery date
    pub delivered_to: Option<NaiveDate>,
    pub organization_id: Option<i64>,
    pub lot_state: Option<LotState>,
}

impl ReportFilter {
    pub fn is_empty(&self) -> bool {
        self.delivered_from.is_none()
            && self.delivered_to.is_none()
            && self.organization_id.is_none()
            && self.lot_state.is_none()
    }

    pub fn matches(&self, lot: &Lot) -> bool {
        if let Some(org) = self.organization_id {
            if lot.organization_id != Some(org) {
                return false;
            }
        }
        if let Some(state) = &self.lot_state {
            if &lot.state != state {
                return false;
            }
        }
        if self.delivered_from.is_some() || self.delivered_to.is_some() {
            // Undated lots cannot satisfy a date bound
            let Some(delivered) = lot.delivery_date.map(|d| d.date_naive()) else {
                return false;
            };
            if self.delivered_from.is_some_and(|from| delivered < from) {
                return false;
            }
            if self.delivered_to.is_some_and(|to| delivered > to) {
                return false;
            }
        }
        true
    }
}

/// Owned copy of the collections restricted to a filter
#[derive(Debug, Clone, Default)]
pub struct FilteredCollections {
    pub organizations: Vec<Organization>,
    pub lots: Vec<Lot>,
    pub samples: Vec<Sample>,
    pub processes: Vec<Process>,
}

impl FilteredCollections {
    pub fn as_input(&self) -> ReportInput<'_> {
        ReportInput {
            organizations: &self.organizations,
            lots: &self.lots,
            samples: &self.samples,
            processes: &self.processes,
            owners: None,
        }
    }
}

pub fn apply_filter(
    filter: &ReportFilter,
    organizations: &[Organization],
    lots: &[Lot],
    samples: &[Sample],
    processes: &[Process],
) -> FilteredCollections {
    if filter.is_empty() {
        return FilteredCollections {
            organizations: organizations.to_vec(),
            lots: lots.to_vec(),
            samples: samples.to_vec(),
            processes: processes.to_vec(),
        };
    }

    let lots: Vec<Lot> = lots.iter().filter(|lot| filter.matches(lot)).cloned().collect();
    let lot_ids: HashSet<i64> = lots.iter().map(|lot| lot.id).collect();

    let samples = samples
        .iter()
        .filter(|s| s.lot_id.is_some_and(|id| lot_ids.contains(&id)))
        .cloned()
        .collect();

    let processes = processes
        .iter()
        .filter_map(|process| {
            // Embedded copies are often summaries, so scope follows the id
            let kept: Vec<LotRef> = process
                .lots
                .iter()
                .filter(|lot_ref| lot_ids.contains(&lot_ref.id()))
                .cloned()
                .collect();
            if kept.is_empty() {
                return None;
            }
            let mut process = process.clone();
            process.lots = kept;
            Some(process)
        })
        .collect();

    let organizations = organizations
        .iter()
        .filter(|org| filter.organization_id.map_or(true, |id| id == org.id))
        .cloned()
        .collect();

    FilteredCollections {
        organizations,
        lots,
        samples,
        processes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_by_organization_and_date() {
        let lots: Vec<Lot> = serde_json::from_value(json!([
            { "id": 1, "organizacion": 1, "fecha_entrega": "2024-02-10" },
            { "id": 2, "organizacion": 1, "fecha_entrega": "2024-05-01" },
            { "id": 3, "organizacion": 2, "fecha_entrega": "2024-02-11" },
            { "id": 4, "organizacion": 1 }
        ]))
        .unwrap();
        let samples: Vec<Sample> = serde_json::from_value(json!([
            { "id": 10, "lote": 1 }, { "id": 11, "lote": 2 }, { "id": 12, "lote": 3 }
        ]))
        .unwrap();
        let processes: Vec<Process> = serde_json::from_value(json!([
            { "id": 20, "lotes": [1, 3] }, { "id": 21, "lotes": [2] }
        ]))
        .unwrap();

        let filter = ReportFilter {
            delivered_from: NaiveDate::from_ymd_opt(2024, 2, 1),
            delivered_to: NaiveDate::from_ymd_opt(2024, 2, 28),
            organization_id: Some(1),
            lot_state: None,
        };
        let filtered = apply_filter(&filter, &[], &lots, &samples, &processes);

        assert_eq!(filtered.lots.iter().map(|l| l.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(filtered.samples.iter().map(|s| s.id).collect::<Vec<_>>(), vec![10]);
        assert_eq!(filtered.processes.len(), 1);
        assert_eq!(filtered.processes[0].lots.len(), 1);
    }

    #[test]
    fn test_embedded_summary_lot_follows_scope_by_id() {
        let lots: Vec<Lot> = serde_json::from_value(json!([
            { "id": 2, "organizacion": 1 },
            { "id": 3, "organizacion": 2 }
        ]))
        .unwrap();
        let samples: Vec<Sample> = serde_json::from_value(json!([{ "id": 10, "lote": 2 }])).unwrap();
        let processes: Vec<Process> = serde_json::from_value(json!([
            { "id": 7, "lotes": [{ "id": 2, "numero_lote": "L-2" }] },
            { "id": 8, "lotes": [{ "id": 3, "numero_lote": "L-3", "organizacion": 1 }] }
        ]))
        .unwrap();

        let filter = ReportFilter {
            organization_id: Some(1),
            ..ReportFilter::default()
        };
        let filtered = apply_filter(&filter, &[], &lots, &samples, &processes);

        assert_eq!(filtered.samples.len(), 1);
        let ids: Vec<i64> = filtered.processes.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![7]);
    }
}
