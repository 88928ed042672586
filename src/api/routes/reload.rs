use axum::extract::State;
use axum::Json;
use tracing::{error, info};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::cache::ReloadOutcome;

/// Re-read the source file now instead of waiting for the next stale check.
///
/// A failed reload keeps the previous dataset in place and reports 500.
pub async fn reload(State(state): State<AppState>) -> Result<Json<ReloadOutcome>, ApiError> {
    let run_date = state.run_date();
    let outcome = state.store.write().await.reload(run_date).map_err(|e| {
        error!("Reload failed: {}", e);
        ApiError::from(e)
    })?;

    info!(
        dataset = %outcome.dataset_id,
        records = outcome.records,
        players = outcome.players,
        changed = outcome.changed,
        "Dataset reloaded"
    );
    Ok(Json(outcome))
}
