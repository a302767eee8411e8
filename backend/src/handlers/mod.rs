//! HTTP handlers

pub mod health;
pub mod reporting;
pub mod snapshot;

pub use health::health_check;
pub use reporting::{get_accounting, get_report};
pub use snapshot::{get_snapshot_status, refresh_snapshot};
