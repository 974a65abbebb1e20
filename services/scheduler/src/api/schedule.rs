//! Scheduling trigger endpoints.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::api::error::ApiError;
use crate::scheduler::{CycleOutcome, CycleReport, Trigger};
use crate::state::AppState;

/// Create scheduling routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schedule", post(schedule))
        .route("/schedule/last", get(last_cycle))
}

/// Run one scheduling cycle now.
async fn schedule(State(state): State<AppState>) -> Result<Json<CycleReport>, ApiError> {
    let report = state.runner().run(Trigger::Http).await?;
    Ok(Json(report))
}

/// Outcome of the most recent cycle run by this process.
async fn last_cycle(State(state): State<AppState>) -> Result<Json<CycleOutcome>, ApiError> {
    state
        .runner()
        .last_outcome()
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("no_cycle_yet", "no scheduling cycle has run yet"))
}
