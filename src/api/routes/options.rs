use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::filter::{self, FilterOptions};
use crate::models::{DistributionKind, RatingKind};

#[derive(Debug, Serialize)]
pub struct RatingOption {
    pub id: RatingKind,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ChartOption {
    pub id: DistributionKind,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    #[serde(flatten)]
    pub filters: FilterOptions,
    pub ratings: Vec<RatingOption>,
    pub default_rating: RatingKind,
    pub charts: Vec<ChartOption>,
}

pub async fn filter_options(
    State(state): State<AppState>,
) -> Result<Json<OptionsResponse>, ApiError> {
    let snapshot = state.snapshot().await;
    let dashboard = &state.config.dashboard;

    let filters = filter::options(
        &snapshot.resolution.players,
        dashboard.min_top_n,
        dashboard.default_top_n,
    );

    Ok(Json(OptionsResponse {
        filters,
        ratings: RatingKind::ALL
            .iter()
            .map(|k| RatingOption {
                id: *k,
                label: k.label(),
            })
            .collect(),
        default_rating: dashboard.default_rating,
        charts: DistributionKind::ALL
            .iter()
            .map(|k| ChartOption {
                id: *k,
                label: k.label(),
            })
            .collect(),
    }))
}
