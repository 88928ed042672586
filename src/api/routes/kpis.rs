use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::{ApiError, DashboardParams};
use crate::calculate::{format_kpi, RatingSummary};
use crate::filter::{self, FilterSpec};
use crate::resolve::ResolutionReport;

#[derive(Debug, Serialize)]
pub struct KpiDisplay {
    pub classical: String,
    pub rapid: String,
    pub blitz: String,
}

impl From<&RatingSummary> for KpiDisplay {
    fn from(summary: &RatingSummary) -> Self {
        Self {
            classical: format_kpi(summary.classical),
            rapid: format_kpi(summary.rapid),
            blitz: format_kpi(summary.blitz),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct KpiResponse {
    pub dataset_id: String,
    pub run_date: NaiveDate,
    pub records: usize,
    pub resolution: ResolutionReport,
    pub filter: FilterSpec,
    /// Means over every resolved player
    pub global: RatingSummary,
    pub global_display: KpiDisplay,
    /// Means over the players matching the filter
    pub filtered: RatingSummary,
    pub filtered_display: KpiDisplay,
}

pub async fn kpis(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<KpiResponse>, ApiError> {
    let snapshot = state.snapshot().await;
    let players = &snapshot.resolution.players;

    let spec = params.filter_spec();
    let subset = filter::apply(players, &spec);

    let global = RatingSummary::compute(players);
    let filtered = RatingSummary::compute(&subset);

    Ok(Json(KpiResponse {
        dataset_id: snapshot.dataset.id.to_string(),
        run_date: state.run_date(),
        records: snapshot.dataset.len(),
        resolution: snapshot.resolution.report.clone(),
        filter: spec,
        global_display: KpiDisplay::from(&global),
        global,
        filtered_display: KpiDisplay::from(&filtered),
        filtered,
    }))
}
