//! Services of the FAPECAFES report gateway

pub mod reporting;
pub mod scheduler;
pub mod snapshot;

pub use reporting::{GeneratedReport, ReportKind, ReportRows, ReportingService};
pub use scheduler::RefreshScheduler;
pub use snapshot::{Snapshot, SnapshotService, SnapshotSource};
