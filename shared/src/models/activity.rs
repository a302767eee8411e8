//! Task and usage records used by the accounting summary

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::de;

/// Which upstream collection an activity record came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// `tareas/`
    #[default]
    Task,
    /// `descargas/`
    Unloading,
    /// `uso-maquinaria/`
    MachineryUsage,
}

impl ActivityKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            ActivityKind::Task => "tareas/",
            ActivityKind::Unloading => "descargas/",
            ActivityKind::MachineryUsage => "uso-maquinaria/",
        }
    }
}

/// A unit of work (task, unloading, machinery usage) performed on a lot or process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: i64,
    /// Set after decoding from the endpoint the record came from
    #[serde(skip)]
    pub kind: ActivityKind,
    #[serde(rename = "lote", default, deserialize_with = "de::optional_id")]
    pub lot_id: Option<i64>,
    #[serde(rename = "proceso", default, deserialize_with = "de::optional_id")]
    pub process_id: Option<i64>,
    #[serde(rename = "empleado", default, deserialize_with = "de::optional_label")]
    pub employee: Option<String>,
    #[serde(
        rename = "duracion_horas",
        alias = "duracion",
        default,
        deserialize_with = "de::decimal_or_zero"
    )]
    pub duration_hours: Decimal,
    #[serde(rename = "insumo", default, deserialize_with = "de::optional_label")]
    pub supply: Option<String>,
    #[serde(
        rename = "cantidad",
        alias = "cantidad_insumo",
        default,
        deserialize_with = "de::decimal_or_zero"
    )]
    pub supply_quantity: Decimal,
    #[serde(
        rename = "tiempo_uso",
        alias = "tiempo_uso_horas",
        default,
        deserialize_with = "de::decimal_or_zero"
    )]
    pub usage_hours: Decimal,
}

impl ActivityRecord {
    pub fn with_kind(mut self, kind: ActivityKind) -> Self {
        self.kind = kind;
        self
    }
}
