//! WebAssembly module for the FAPECAFES reports
//!
//! Runs the same aggregation as the gateway in the browser, so the report
//! screens can recompute from payloads they already hold:
//! - Collection normalization (paginated or bare arrays)
//! - The four grouped reports
//! - Percentage and weight-loss helpers
//! - Cédula validation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::stats::*;
pub use shared::types::*;
pub use shared::validation::*;

use shared::{apply_filter, ReportFilter};

/// Raw upstream payloads as the browser received them
#[derive(Debug, Default, Deserialize)]
struct RawCollections {
    #[serde(default)]
    organizaciones: Value,
    #[serde(default)]
    lotes: Value,
    #[serde(default)]
    muestras: Value,
    #[serde(default)]
    procesos: Value,
    #[serde(default)]
    filtro: Option<ReportFilter>,
}

fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

fn records<T: serde::de::DeserializeOwned>(name: &str, payload: Value) -> Vec<T> {
    let (items, _) = normalize_collection(payload);
    let decoded = decode_records(items);
    if decoded.skipped > 0 {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "{}: {} malformed records dropped",
            name, decoded.skipped
        )));
    }
    decoded.records
}

/// Milliseconds since the epoch; falls back to the browser clock when the
/// caller passes NaN
fn timestamp(now_ms: f64) -> DateTime<Utc> {
    let millis = if now_ms.is_finite() { now_ms } else { js_sys::Date::now() };
    DateTime::<Utc>::from_timestamp_millis(millis as i64).unwrap_or_default()
}

/// Normalize a collection payload to a plain JSON array
#[wasm_bindgen]
pub fn normalize_collection_json(payload_json: &str) -> Result<String, JsValue> {
    let payload: Value =
        serde_json::from_str(payload_json).map_err(|e| js_error("Invalid payload JSON", e))?;
    let (items, _) = normalize_collection(payload);
    serde_json::to_string(&items).map_err(|e| js_error("Serialization failed", e))
}

/// Build all four reports from `{organizaciones, lotes, muestras, procesos}`
/// payloads plus an optional `filtro`. `now_ms` is the clock used for
/// open-ended process durations (pass `Date.now()` or NaN).
#[wasm_bindgen]
pub fn build_reports_json(collections_json: &str, now_ms: f64) -> Result<String, JsValue> {
    let raw: RawCollections = serde_json::from_str(collections_json)
        .map_err(|e| js_error("Invalid collections JSON", e))?;

    let organizations: Vec<Organization> = records("organizaciones", raw.organizaciones);
    let lots: Vec<Lot> = records("lotes", raw.lotes);
    let samples: Vec<Sample> = records("muestras", raw.muestras);
    let processes: Vec<Process> = records("procesos", raw.procesos);

    let filter = raw.filtro.unwrap_or_default();
    let scoped = apply_filter(&filter, &organizations, &lots, &samples, &processes);
    let reports = build_reports(&scoped.as_input(), timestamp(now_ms));

    serde_json::to_string(&reports).map_err(|e| js_error("Serialization failed", e))
}

/// `count / total` as a one-decimal percentage string
#[wasm_bindgen]
pub fn percentage_of(count: u32, total: u32) -> String {
    percentage(count as usize, total as usize)
}

/// Weight-loss percentage; "0.0" unless both weights are known and non-zero
#[wasm_bindgen]
pub fn weight_loss_percentage(initial: f64, final_weight: f64) -> String {
    let initial = Decimal::try_from(initial).ok();
    let final_weight = Decimal::try_from(final_weight).ok();
    weight_loss(initial, final_weight).percentage
}

/// Validate an Ecuadorian cédula
#[wasm_bindgen]
pub fn is_valid_cedula(cedula: &str) -> bool {
    validate_cedula(cedula).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collection_json() {
        let paginated = normalize_collection_json(r#"{"count":1,"results":[{"id":1}]}"#).unwrap();
        let bare = normalize_collection_json(r#"[{"id":1}]"#).unwrap();
        assert_eq!(paginated, bare);
        assert_eq!(normalize_collection_json(r#"{"detail":"x"}"#).unwrap(), "[]");
    }

    #[test]
    fn test_percentage_and_weight_loss() {
        assert_eq!(percentage_of(1, 3), "33.3");
        assert_eq!(percentage_of(3, 0), "0.0");
        assert_eq!(weight_loss_percentage(100.0, 80.0), "20.0");
        assert_eq!(weight_loss_percentage(100.0, 0.0), "0.0");
    }

    #[test]
    fn test_is_valid_cedula() {
        assert!(is_valid_cedula("1710034065"));
        assert!(!is_valid_cedula("0102030405"));
    }

    #[test]
    fn test_build_reports_json() {
        let collections = r#"{
            "organizaciones": [{"id": 1, "nombre": "APECAEL"}],
            "lotes": {"count": 1, "results": [{
                "id": 10, "numero_lote": "L-1", "organizacion": 1,
                "estado": "APROBADO", "total_quintales": "12.5",
                "propietarios": [{"cedula": "1710034065", "nombre_completo": "Ana Pérez", "quintales_entregados": "12.5"}]
            }]},
            "muestras": [{"id": 5, "lote": 10, "estado": "APROBADA", "propietario_nombre": "Ana Pérez"}],
            "procesos": []
        }"#;

        let json = build_reports_json(collections, 1_700_000_000_000.0).unwrap();
        let reports: Value = serde_json::from_str(&json).unwrap();

        let org = &reports["organizaciones"][0];
        assert_eq!(org["totalLotes"], 1);
        assert_eq!(org["totalPropietarios"], 1);
        assert_eq!(org["estadisticasMuestras"]["porcentajeAprobacion"], "100.0");
        assert_eq!(reports["propietarios"][0]["cedula"], "1710034065");
        assert_eq!(reports["lotes"][0]["organizacion"], "APECAEL");
    }
}
