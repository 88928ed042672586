use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::{ApiError, DashboardParams, Pagination, PaginationMeta};
use crate::filter::{self, FilterSpec, RankLimit};
use crate::models::ResolvedPlayerRecord;

#[derive(Debug, Serialize)]
pub struct PlayersResponse {
    pub players: Vec<ResolvedPlayerRecord>,
    pub filter: FilterSpec,
    pub pagination: PaginationMeta,
    /// Set when no player matches, so the table can show a placeholder
    pub message: Option<String>,
}

/// Filtered players, best rank first. Unranked players sort last by name.
pub async fn list_players(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<PlayersResponse>, ApiError> {
    let spec = params
        .filter_spec()
        .with_max_rank(RankLimit::from(params.top_n()?));
    let pagination = Pagination::new(params.page, params.page_size);

    let snapshot = state.snapshot().await;
    let mut rows = filter::apply(&snapshot.resolution.players, &spec);
    rows.sort_by(|a, b| {
        let rank = |p: &ResolvedPlayerRecord| p.rank().unwrap_or(u32::MAX);
        rank(a).cmp(&rank(b)).then_with(|| a.name().cmp(b.name()))
    });

    let total = rows.len() as u32;
    let players: Vec<ResolvedPlayerRecord> = rows
        .into_iter()
        .skip(usize::try_from(pagination.offset()).unwrap_or(usize::MAX))
        .take(pagination.page_size as usize)
        .cloned()
        .collect();

    let message = (total == 0).then(|| crate::charts::NO_MATCHES.to_string());

    Ok(Json(PlayersResponse {
        players,
        filter: spec,
        pagination: PaginationMeta::new(&pagination, total),
        message,
    }))
}
