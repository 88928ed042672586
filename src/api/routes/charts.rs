use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::{ApiError, DashboardParams};
use crate::charts::{ChartOutcome, ChartRequest};
use crate::filter::{self, FilterSpec};

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub view: &'static str,
    pub filter: FilterSpec,
    /// Players passing the country/title filters
    pub matching: usize,
    #[serde(flatten)]
    pub outcome: ChartOutcome,
}

async fn render(
    state: &AppState,
    params: &DashboardParams,
    view: &'static str,
    request: ChartRequest,
) -> ChartResponse {
    let snapshot = state.snapshot().await;
    let spec = params.filter_spec();
    let subset = filter::apply(&snapshot.resolution.players, &spec);
    let outcome = state.renderer.render(&subset, &request);

    ChartResponse {
        view,
        filter: spec,
        matching: subset.len(),
        outcome,
    }
}

/// Rank against the selected rating.
pub async fn ranking_chart(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<ChartResponse>, ApiError> {
    let rating = params.rating(state.config.dashboard.default_rating)?;
    let request = ChartRequest::Ranking { rating };
    Ok(Json(render(&state, &params, "ranking", request).await))
}

/// Histogram, violin or box plot of the selected rating.
pub async fn distribution_chart(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<ChartResponse>, ApiError> {
    let rating = params.rating(state.config.dashboard.default_rating)?;
    let kind = params.chart()?;
    let request = ChartRequest::Distribution { rating, kind };
    Ok(Json(render(&state, &params, "distribution", request).await))
}

/// Scatter matrix of all ratings for the Top-N players.
pub async fn comparison_chart(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<ChartResponse>, ApiError> {
    let top_n = match params.top_n()? {
        Some(n) => n,
        None => {
            let snapshot = state.snapshot().await;
            let dashboard = &state.config.dashboard;
            filter::options(
                &snapshot.resolution.players,
                dashboard.min_top_n,
                dashboard.default_top_n,
            )
            .top_n
            .map_or(dashboard.default_top_n, |b| b.default)
        }
    };
    let request = ChartRequest::Comparison { top_n };
    Ok(Json(render(&state, &params, "comparison", request).await))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::routes::test_support::{get_json, setup_test_state, SAMPLE_ROWS};
    use crate::charts::{NO_MATCHES, NO_TOP_N_MATCHES};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_ranking_chart() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path(), SAMPLE_ROWS);

        let app = build_router(state);
        let uri = "/api/charts/ranking?rating=blitz&countries=USA,NOR";
        let (status, json) = get_json(app, uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "rendered");
        assert_eq!(json["view"], "ranking");
        assert_eq!(json["matching"], 3);
        assert_eq!(json["chart"]["title"], "Ranking vs Blitz Rating");
        assert_eq!(json["chart"]["x_axis"]["reversed"], true);
        assert_eq!(json["chart"]["body"]["type"], "scatter");
        assert_eq!(json["chart"]["body"]["points"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_ranking_chart_no_data() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path(), SAMPLE_ROWS);

        let app = build_router(state);
        let (status, json) = get_json(app, "/api/charts/ranking?countries=ATL").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "no_data");
        assert_eq!(json["message"], NO_MATCHES);
        assert_eq!(json["matching"], 0);
    }

    #[tokio::test]
    async fn test_distribution_chart_kinds() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path(), SAMPLE_ROWS);

        let (_, json) = get_json(build_router(state.clone()), "/api/charts/distribution").await;
        assert_eq!(json["chart"]["body"]["type"], "histogram");
        assert_eq!(json["chart"]["title"], "Classical rating distribution (Histogram)");

        let uri = "/api/charts/distribution?chart=violin&rating=rapid";
        let (_, json) = get_json(build_router(state.clone()), uri).await;
        assert_eq!(json["chart"]["body"]["type"], "violin");
        // Vaishali has no rapid rating, so IND has no group.
        let groups: Vec<&str> = json["chart"]["body"]["groups"]
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g["group"].as_str().unwrap())
            .collect();
        assert_eq!(groups, vec!["CHN", "NOR", "USA", "Unknown"]);

        let (_, json) = get_json(build_router(state), "/api/charts/distribution?chart=box").await;
        assert_eq!(json["chart"]["body"]["type"], "box");
    }

    #[tokio::test]
    async fn test_distribution_bad_chart() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path(), SAMPLE_ROWS);

        let app = build_router(state);
        let (status, json) = get_json(app, "/api/charts/distribution?chart=pie").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_comparison_chart() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path(), SAMPLE_ROWS);

        let app = build_router(state);
        let (status, json) = get_json(app, "/api/charts/comparison?top_n=3").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["chart"]["title"], "Rating comparison (Top 3 by rank)");
        assert_eq!(json["chart"]["body"]["type"], "scatter_matrix");
        assert_eq!(json["chart"]["body"]["points"].as_array().unwrap().len(), 3);
        assert_eq!(json["chart"]["body"]["dimensions"][2], "blitz");
    }

    #[tokio::test]
    async fn test_comparison_default_top_n() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path(), SAMPLE_ROWS);

        let app = build_router(state);
        let (_, json) = get_json(app, "/api/charts/comparison").await;

        // Default is min(50, max rank); Vaishali (60) and Unlisted (90) fall outside.
        assert_eq!(json["chart"]["title"], "Rating comparison (Top 50 by rank)");
        assert_eq!(json["chart"]["body"]["points"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_comparison_top_n_excludes_all() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path(), SAMPLE_ROWS);

        let app = build_router(state);
        let (status, json) = get_json(app, "/api/charts/comparison?countries=IND&top_n=10").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "no_data");
        assert_eq!(json["message"], NO_TOP_N_MATCHES);
        assert_eq!(json["matching"], 1);
    }
}
