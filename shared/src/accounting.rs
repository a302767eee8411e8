//! Accounting summary: labour and supply usage per lot and per process

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{ActivityKind, ActivityRecord, Lot, Process};

/// Quantity and usage time of one supply (insumo)
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SupplyUsage {
    #[serde(rename = "insumo")]
    pub supply: String,
    #[serde(rename = "cantidad")]
    pub quantity: Decimal,
    #[serde(rename = "horasUso")]
    pub usage_hours: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccountingEntry {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub label: String,
    #[serde(rename = "tareas")]
    pub task_count: usize,
    #[serde(rename = "descargas")]
    pub unloading_count: usize,
    #[serde(rename = "horasTrabajo")]
    pub labour_hours: Decimal,
    #[serde(rename = "horasMaquinaria")]
    pub machinery_hours: Decimal,
    #[serde(rename = "empleados")]
    pub employees: usize,
    #[serde(rename = "insumos")]
    pub supplies: Vec<SupplyUsage>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct AccountingSummary {
    #[serde(rename = "porLote")]
    pub by_lot: Vec<AccountingEntry>,
    #[serde(rename = "porProceso")]
    pub by_process: Vec<AccountingEntry>,
    #[serde(rename = "horasTrabajoTotales")]
    pub total_labour_hours: Decimal,
    #[serde(rename = "horasMaquinariaTotales")]
    pub total_machinery_hours: Decimal,
    #[serde(rename = "registrosSinReferencia")]
    pub unassigned_records: usize,
}

#[derive(Default)]
struct Accumulator<'a> {
    task_count: usize,
    unloading_count: usize,
    labour_hours: Decimal,
    machinery_hours: Decimal,
    employees: HashSet<&'a str>,
    supplies: BTreeMap<&'a str, (Decimal, Decimal)>,
}

impl<'a> Accumulator<'a> {
    fn add(&mut self, record: &'a ActivityRecord) {
        match record.kind {
            ActivityKind::Task => {
                self.task_count += 1;
                self.labour_hours += record.duration_hours;
            }
            ActivityKind::Unloading => {
                self.unloading_count += 1;
                self.labour_hours += record.duration_hours;
            }
            ActivityKind::MachineryUsage => {
                self.machinery_hours += record.duration_hours.max(record.usage_hours);
            }
        }
        if let Some(employee) = record.employee.as_deref().filter(|e| !e.is_empty()) {
            self.employees.insert(employee);
        }
        if let Some(supply) = record.supply.as_deref().filter(|s| !s.is_empty()) {
            let entry = self.supplies.entry(supply).or_default();
            entry.0 += record.supply_quantity;
            entry.1 += record.usage_hours;
        }
    }

    fn finish(self, id: i64, label: String) -> AccountingEntry {
        AccountingEntry {
            id,
            label,
            task_count: self.task_count,
            unloading_count: self.unloading_count,
            labour_hours: self.labour_hours,
            machinery_hours: self.machinery_hours,
            employees: self.employees.len(),
            supplies: self
                .supplies
                .into_iter()
                .map(|(supply, (quantity, usage_hours))| SupplyUsage {
                    supply: supply.to_string(),
                    quantity,
                    usage_hours,
                })
                .collect(),
        }
    }
}

/// Group activity records by the lot and by the process they reference.
///
/// A record referencing both is counted under each; records referencing
/// neither are only counted in `unassigned_records`.
pub fn summarize_activity(
    records: &[ActivityRecord],
    lots: &[Lot],
    processes: &[Process],
) -> AccountingSummary {
    let mut by_lot: BTreeMap<i64, Accumulator> = BTreeMap::new();
    let mut by_process: BTreeMap<i64, Accumulator> = BTreeMap::new();
    let mut totals = Accumulator::default();
    let mut unassigned = 0;

    for record in records {
        totals.add(record);
        if let Some(lot_id) = record.lot_id {
            by_lot.entry(lot_id).or_default().add(record);
        }
        if let Some(process_id) = record.process_id {
            by_process.entry(process_id).or_default().add(record);
        }
        if record.lot_id.is_none() && record.process_id.is_none() {
            unassigned += 1;
        }
    }

    let lot_label = |id: i64| {
        lots.iter()
            .find(|lot| lot.id == id)
            .map(|lot| format!("Lote {}", lot.display_number()))
            .unwrap_or_else(|| format!("Lote #{}", id))
    };
    let process_label = |id: i64| {
        processes
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.display_name())
            .unwrap_or_else(|| format!("Proceso #{}", id))
    };

    AccountingSummary {
        by_lot: by_lot
            .into_iter()
            .map(|(id, acc)| acc.finish(id, lot_label(id)))
            .collect(),
        by_process: by_process
            .into_iter()
            .map(|(id, acc)| acc.finish(id, process_label(id)))
            .collect(),
        total_labour_hours: totals.labour_hours,
        total_machinery_hours: totals.machinery_hours,
        unassigned_records: unassigned,
    }
}
