//! Sample (muestra) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::de;

/// A quality sample taken from a lot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub id: i64,
    #[serde(rename = "numero_muestra", default, deserialize_with = "de::string_or_empty")]
    pub sample_number: String,
    /// Lot the sample was taken from
    #[serde(rename = "lote", default, deserialize_with = "de::optional_id")]
    pub lot_id: Option<i64>,
    /// Owner full name; the upstream does not expose the owner's cédula here
    #[serde(rename = "propietario_nombre", default, deserialize_with = "de::optional_label")]
    pub owner_name: Option<String>,
    #[serde(rename = "estado", default)]
    pub state: SampleState,
    #[serde(rename = "fecha_muestra", default, deserialize_with = "de::optional_datetime")]
    pub sampled_at: Option<DateTime<Utc>>,
    #[serde(rename = "fecha_analisis", default, deserialize_with = "de::optional_datetime")]
    pub analysed_at: Option<DateTime<Utc>>,
    #[serde(rename = "es_segundo_muestreo", default, deserialize_with = "de::bool_or_false")]
    pub is_second_sampling: bool,
}

coded_enum! {
    /// Laboratory state of a sample
    pub enum SampleState {
        Pending => ["PENDIENTE", "PENDING"], "Pendiente",
        Approved => ["APROBADA", "APPROVED"], "Aprobada",
        Contaminated => ["CONTAMINADA", "CONTAMINATED"], "Contaminada",
        Analysed => ["ANALIZADA", "ANALYZED"], "Analizada",
    }
}

impl Sample {
    pub fn belongs_to_lot(&self, lot_id: i64) -> bool {
        self.lot_id == Some(lot_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sample_state_codes() {
        let sample: Sample = serde_json::from_value(json!({
            "id": 100,
            "lote": 10,
            "estado": "aprobada",
            "es_segundo_muestreo": null
        }))
        .unwrap();

        assert_eq!(sample.state, SampleState::Approved);
        assert!(sample.belongs_to_lot(10));
        assert!(!sample.is_second_sampling);
        assert_eq!(SampleState::Contaminated.code(), "CONTAMINADA");
        assert_eq!(SampleState::from("CONTAMINATED"), SampleState::Contaminated);
    }
}
