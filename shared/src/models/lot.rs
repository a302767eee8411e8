//! Lot and owner-in-lot models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::de;

/// A coffee lot delivered by one or more owners of an organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    pub id: i64,
    #[serde(rename = "numero_lote", default, deserialize_with = "de::string_or_empty")]
    pub lot_number: String,
    #[serde(rename = "organizacion", default, deserialize_with = "de::optional_id")]
    pub organization_id: Option<i64>,
    #[serde(rename = "fecha_entrega", default, deserialize_with = "de::optional_datetime")]
    pub delivery_date: Option<DateTime<Utc>>,
    #[serde(rename = "fecha_creacion", default, deserialize_with = "de::optional_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "estado", default)]
    pub state: LotState,
    #[serde(rename = "total_quintales", default, deserialize_with = "de::decimal_or_zero")]
    pub total_quintals: Decimal,
    #[serde(rename = "peso_inicial", default, deserialize_with = "de::optional_decimal")]
    pub initial_weight: Option<Decimal>,
    #[serde(rename = "peso_final", default, deserialize_with = "de::optional_decimal")]
    pub final_weight: Option<Decimal>,
    #[serde(rename = "propietarios", default, deserialize_with = "de::vec_or_empty")]
    pub owners: Vec<OwnerInLot>,
}

coded_enum! {
    /// Lifecycle state of a lot, owned by the upstream backend
    pub enum LotState {
        Pending => ["PENDIENTE", "PENDING"], "Pendiente",
        Approved => ["APROBADO", "APPROVED"], "Aprobado",
        SeparationApplied => ["SEPARACION_APLICADA", "SEPARATION_APPLIED"], "Separación aplicada",
        Clean => ["LIMPIO", "CLEAN"], "Limpio",
        Rejected => ["RECHAZADO", "REJECTED"], "Rechazado",
        Finalized => ["FINALIZADO", "FINALIZED"], "Finalizado",
    }
}

/// An owner's delivery within a single lot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerInLot {
    /// National id (cédula), unique across the whole system
    #[serde(rename = "cedula", default, deserialize_with = "de::string_or_empty")]
    pub national_id: String,
    #[serde(rename = "nombre_completo", default, deserialize_with = "de::string_or_empty")]
    pub full_name: String,
    #[serde(rename = "quintales_entregados", default, deserialize_with = "de::decimal_or_zero")]
    pub quintals_delivered: Decimal,
}

impl Lot {
    /// Whether the owner with this cédula delivered into the lot
    pub fn has_owner(&self, national_id: &str) -> bool {
        self.owners.iter().any(|o| o.national_id == national_id)
    }

    /// Quintals the owner delivered into this lot (not the lot total)
    pub fn quintals_for(&self, national_id: &str) -> Decimal {
        self.owners
            .iter()
            .filter(|o| o.national_id == national_id)
            .map(|o| o.quintals_delivered)
            .sum()
    }

    pub fn weight_loss(&self) -> crate::stats::WeightLoss {
        crate::stats::weight_loss(self.initial_weight, self.final_weight)
    }

    /// Lot number for display, falling back to the id
    pub fn display_number(&self) -> String {
        if self.lot_number.is_empty() {
            format!("#{}", self.id)
        } else {
            self.lot_number.clone()
        }
    }
}
