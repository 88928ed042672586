//! REST API endpoints.
//!
//! Axum-based HTTP API serving dashboard KPIs, filter options, the filtered
//! player table and chart specifications for the three views.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::filter::{FilterSpec, Selection};
use crate::models::{DistributionKind, RatingKind};
use crate::storage::LoadError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LoadError> for ApiError {
    fn from(e: LoadError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Pagination parameters.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

impl Pagination {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(50).clamp(1, 100),
        }
    }

    /// Rows to skip. Widened so a huge `page` cannot overflow.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// Pagination metadata in responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u32) -> Self {
        let total_pages = total_items.div_ceil(pagination.page_size);
        Self {
            page: pagination.page,
            page_size: pagination.page_size,
            total_items,
            total_pages,
            has_next: pagination.page < total_pages,
            has_prev: pagination.page > 1,
        }
    }
}

/// Widget values as they arrive in a query string.
///
/// Everything is optional and textual so malformed values produce the JSON
/// error envelope rather than an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardParams {
    pub countries: Option<String>,
    pub titles: Option<String>,
    pub rating: Option<String>,
    pub chart: Option<String>,
    pub top_n: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl DashboardParams {
    /// Country and title filters; rank is left unbounded.
    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec::all()
            .with_countries(Selection::parse(self.countries.as_deref()))
            .with_titles(Selection::parse(self.titles.as_deref()))
    }

    pub fn rating(&self, default: RatingKind) -> Result<RatingKind, ApiError> {
        match self.rating.as_deref() {
            None | Some("") => Ok(default),
            Some(raw) => raw.parse().map_err(ApiError::BadRequest),
        }
    }

    pub fn chart(&self) -> Result<DistributionKind, ApiError> {
        match self.chart.as_deref() {
            None | Some("") => Ok(DistributionKind::default()),
            Some(raw) => raw.parse().map_err(ApiError::BadRequest),
        }
    }

    /// Requested Top-N, if any. Must be a positive integer.
    pub fn top_n(&self) -> Result<Option<u32>, ApiError> {
        match self.top_n.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => Ok(Some(n)),
                _ => Err(ApiError::BadRequest(format!(
                    "top_n must be a positive integer, got '{}'",
                    raw
                ))),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!("Ignoring invalid cors_origin {:?}", origin);
            layer
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/health", get(health))
        .route("/api/kpis", get(routes::kpis::kpis))
        .route("/api/filters/options", get(routes::options::filter_options))
        .route("/api/players", get(routes::players::list_players))
        .route("/api/charts/ranking", get(routes::charts::ranking_chart))
        .route("/api/charts/distribution", get(routes::charts::distribution_chart))
        .route("/api/charts/comparison", get(routes::charts::comparison_chart))
        .route("/api/reload", post(routes::reload::reload))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
