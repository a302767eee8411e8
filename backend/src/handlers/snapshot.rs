//! Snapshot status and on-demand refresh

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::services::snapshot::SnapshotStatus;
use crate::AppState;

pub async fn get_snapshot_status(State(state): State<AppState>) -> Json<SnapshotStatus> {
    Json(state.snapshots.status().await)
}

/// Fetch a new snapshot now. A failed refresh keeps the previous data and
/// reports the upstream error.
pub async fn refresh_snapshot(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<SnapshotStatus>> {
    tracing::info!(
        user = %user.subject,
        role = user.role.as_deref().unwrap_or("-"),
        "Manual snapshot refresh requested"
    );
    state.snapshots.refresh().await?;
    Ok(Json(state.snapshots.status().await))
}
