//! Process (proceso) models: milling, classification, density, color sorting and packing

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::Lot;
use crate::types::de;

/// A processing run grouping several lots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub id: i64,
    #[serde(rename = "nombre", default, deserialize_with = "de::string_or_empty")]
    pub name: String,
    #[serde(rename = "numero", default, deserialize_with = "de::optional_label")]
    pub number: Option<String>,
    #[serde(rename = "estado", default)]
    pub state: ProcessState,
    #[serde(rename = "fase_actual", default)]
    pub phase: ProcessPhase,
    #[serde(rename = "fecha_inicio", default, deserialize_with = "de::optional_datetime")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "fecha_fin", default, deserialize_with = "de::optional_datetime")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(rename = "lotes", default, deserialize_with = "de::vec_or_empty")]
    pub lots: Vec<LotRef>,
    #[serde(rename = "responsable", default, deserialize_with = "de::optional_label")]
    pub responsible: Option<String>,
    #[serde(rename = "peso_total_inicial", default, deserialize_with = "de::optional_decimal")]
    pub initial_total_weight: Option<Decimal>,
    #[serde(rename = "peso_total_actual", default, deserialize_with = "de::optional_decimal")]
    pub current_total_weight: Option<Decimal>,
}

/// A lot included in a process, either embedded or as a bare id
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LotRef {
    Id(i64),
    Embedded(Box<Lot>),
}

impl<'de> Deserialize<'de> for LotRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.is_object() {
            return serde_json::from_value(value)
                .map(|lot| LotRef::Embedded(Box::new(lot)))
                .map_err(D::Error::custom);
        }
        de::id_from_value(&value)
            .map(LotRef::Id)
            .ok_or_else(|| D::Error::custom(format!("invalid lot reference: {}", value)))
    }
}

impl LotRef {
    pub fn id(&self) -> i64 {
        match self {
            LotRef::Id(id) => *id,
            LotRef::Embedded(lot) => lot.id,
        }
    }
}

coded_enum! {
    /// Overall state of a process
    pub enum ProcessState {
        Pending => ["PENDIENTE", "PENDING"], "Pendiente",
        InProgress => ["EN_PROCESO", "IN_PROGRESS"], "En proceso",
        Finalized => ["FINALIZADO", "FINALIZED", "COMPLETADO"], "Finalizado",
        Cancelled => ["CANCELADO", "CANCELLED"], "Cancelado",
    }
}

coded_enum! {
    /// Current phase of a process
    pub enum ProcessPhase {
        Milling => ["TRILLA", "MILLING"], "Trilla",
        Classification => ["CLASIFICACION", "CLASSIFICATION"], "Clasificación",
        Density => ["DENSIDAD", "DENSITY"], "Densidad",
        Color => ["COLOR"], "Color",
        Packing => ["EMPACADO", "PACKING"], "Empacado",
    }
}

impl Process {
    /// Name for display: name, then number, then id
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        match &self.number {
            Some(number) if !number.is_empty() => format!("Proceso {}", number),
            _ => format!("Proceso #{}", self.id),
        }
    }

    /// Resolve the included lots. Embedded lots are used directly, bare ids
    /// are looked up in `lots` and dropped when unknown.
    pub fn resolve_lots<'a>(&'a self, lots: &'a [Lot]) -> Vec<&'a Lot> {
        self.lots
            .iter()
            .filter_map(|lot_ref| match lot_ref {
                LotRef::Embedded(lot) => Some(lot.as_ref()),
                LotRef::Id(id) => lots.iter().find(|lot| lot.id == *id),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_process_with_mixed_lot_refs() {
        let process: Process = serde_json::from_value(json!({
            "id": 5,
            "numero": "P-5",
            "fase_actual": "DENSIDAD",
            "lotes": [7, { "id": 8, "total_quintales": "10" }],
            "responsable": { "id": 1, "username": "operador" }
        }))
        .unwrap();

        let known: Vec<Lot> = vec![serde_json::from_value(json!({ "id": 7 })).unwrap()];
        let resolved = process.resolve_lots(&known);

        assert_eq!(resolved.len(), 2);
        assert_eq!(process.phase, ProcessPhase::Density);
        assert_eq!(process.display_name(), "Proceso P-5");
        assert_eq!(process.responsible.as_deref(), Some("operador"));
    }

    #[test]
    fn test_string_lot_ids_are_accepted() {
        let process: Process = serde_json::from_value(json!({
            "id": 6,
            "lotes": ["7", 8, { "id": 9 }]
        }))
        .unwrap();

        let ids: Vec<i64> = process.lots.iter().map(LotRef::id).collect();
        assert_eq!(ids, vec![7, 8, 9]);
        assert!(serde_json::from_value::<LotRef>(json!("L-7")).is_err());
    }
}
