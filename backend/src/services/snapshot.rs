//! Snapshot store
//!
//! Holds the last complete set of upstream collections. A refresh either
//! replaces all of them at once or leaves the previous snapshot in place,
//! so joined statistics never mix data from two refresh cycles.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    apply_filter, extract_owners, invalid_owner_ids, validate_lot_quantities, ActivityRecord,
    FilteredCollections, Lot, Organization, Owner, Process, ReportFilter, ReportInput, Sample,
};
use tokio::sync::{Mutex, RwLock};

use crate::error::{AppError, AppResult};

/// Immutable copy of the upstream collections from one refresh
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub fetched_at: DateTime<Utc>,
    pub organizations: Vec<Organization>,
    pub lots: Vec<Lot>,
    pub samples: Vec<Sample>,
    pub processes: Vec<Process>,
    pub activity: Vec<ActivityRecord>,
    /// Owners extracted from `lots`
    pub owners: Vec<Owner>,
}

/// Record counts of a snapshot
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SnapshotCounts {
    pub organizations: usize,
    pub lots: usize,
    pub samples: usize,
    pub processes: usize,
    pub owners: usize,
    pub activity: usize,
}

impl Snapshot {
    pub fn new(
        fetched_at: DateTime<Utc>,
        organizations: Vec<Organization>,
        lots: Vec<Lot>,
        samples: Vec<Sample>,
        processes: Vec<Process>,
        activity: Vec<ActivityRecord>,
    ) -> Self {
        let owners = extract_owners(&lots);
        Self {
            fetched_at,
            organizations,
            lots,
            samples,
            processes,
            activity,
            owners,
        }
    }

    pub fn counts(&self) -> SnapshotCounts {
        SnapshotCounts {
            organizations: self.organizations.len(),
            lots: self.lots.len(),
            samples: self.samples.len(),
            processes: self.processes.len(),
            owners: self.owners.len(),
            activity: self.activity.len(),
        }
    }

    /// Unfiltered view, reusing the precomputed owners
    pub fn as_input(&self) -> ReportInput<'_> {
        ReportInput {
            organizations: &self.organizations,
            lots: &self.lots,
            samples: &self.samples,
            processes: &self.processes,
            owners: Some(&self.owners),
        }
    }

    pub fn filtered(&self, filter: &ReportFilter) -> FilteredCollections {
        apply_filter(
            filter,
            &self.organizations,
            &self.lots,
            &self.samples,
            &self.processes,
        )
    }
}

/// Something that can produce a complete snapshot
#[axum::async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self) -> AppResult<Snapshot>;
}

/// Last failed refresh, kept for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RefreshFailure {
    pub at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotStatus {
    pub loaded: bool,
    pub fetched_at: Option<DateTime<Utc>>,
    pub age_seconds: Option<i64>,
    pub counts: Option<SnapshotCounts>,
    pub last_failure: Option<RefreshFailure>,
}

#[derive(Default)]
struct SnapshotStore {
    current: RwLock<Option<Arc<Snapshot>>>,
    last_failure: RwLock<Option<RefreshFailure>>,
    /// Serializes refreshes so the timer and manual triggers don't overlap
    refresh_guard: Mutex<()>,
}

/// Snapshot service shared between handlers and the refresh scheduler
#[derive(Clone)]
pub struct SnapshotService {
    source: Arc<dyn SnapshotSource>,
    store: Arc<SnapshotStore>,
}

impl SnapshotService {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            source,
            store: Arc::new(SnapshotStore::default()),
        }
    }

    /// Fetch a new snapshot and install it. On failure the previous
    /// snapshot stays current and the failure is recorded.
    pub async fn refresh(&self) -> AppResult<Arc<Snapshot>> {
        let _guard = self.store.refresh_guard.lock().await;
        tracing::debug!("Refreshing snapshot");

        match self.source.fetch_snapshot().await {
            Ok(snapshot) => {
                let invalid = invalid_owner_ids(&snapshot.lots);
                if !invalid.is_empty() {
                    tracing::warn!(count = invalid.len(), "Owners with invalid cédula in snapshot");
                }
                for lot in &snapshot.lots {
                    if let Err(err) = validate_lot_quantities(lot) {
                        tracing::warn!(lot = lot.id, "Suspicious lot quantities: {}", err);
                    }
                }

                let snapshot = Arc::new(snapshot);
                tracing::info!(counts = ?snapshot.counts(), "Snapshot refreshed");
                *self.store.current.write().await = Some(snapshot.clone());
                *self.store.last_failure.write().await = None;
                Ok(snapshot)
            }
            Err(err) => {
                tracing::warn!("Snapshot refresh failed, keeping previous data: {}", err);
                *self.store.last_failure.write().await = Some(RefreshFailure {
                    at: Utc::now(),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    pub async fn current(&self) -> Option<Arc<Snapshot>> {
        self.store.current.read().await.clone()
    }

    /// Current snapshot, or an error if none has been loaded yet
    pub async fn require(&self) -> AppResult<Arc<Snapshot>> {
        self.current().await.ok_or(AppError::SnapshotUnavailable)
    }

    pub async fn status(&self) -> SnapshotStatus {
        let current = self.current().await;
        let last_failure = self.store.last_failure.read().await.clone();
        SnapshotStatus {
            loaded: current.is_some(),
            fetched_at: current.as_ref().map(|s| s.fetched_at),
            age_seconds: current
                .as_ref()
                .map(|s| (Utc::now() - s.fetched_at).num_seconds()),
            counts: current.as_ref().map(|s| s.counts()),
            last_failure,
        }
    }
}
