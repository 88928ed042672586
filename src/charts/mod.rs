//! Chart specifications for the three dashboard views.
//!
//! A renderer turns a filtered subset into a drawable description (series data
//! plus axis encodings). Any front-end charting library can draw the result;
//! nothing here knows about pixels.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::calculate::{distribution, histogram, DistributionStats, HistogramBin};
use crate::filter::{by_rank, RankLimit};
use crate::models::{DistributionKind, RatingKind, ResolvedPlayerRecord};

pub const NO_MATCHES: &str = "No players match the selected filters";
pub const NO_TOP_N_MATCHES: &str = "No players within the Top N for the selected filters";

/// Group label for rows with no country.
pub const UNKNOWN_GROUP: &str = "Unknown";

/// What to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartRequest {
    /// Rank against one rating, colored by country.
    Ranking { rating: RatingKind },
    /// Spread of one rating.
    Distribution {
        rating: RatingKind,
        kind: DistributionKind,
    },
    /// All three ratings against each other for the best `top_n` players.
    Comparison { top_n: u32 },
}

/// Renderer result. An empty subset is `NoData`, never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartOutcome {
    Rendered { chart: ChartSpec },
    NoData { message: String },
}

impl ChartOutcome {
    pub fn no_data(message: &str) -> Self {
        ChartOutcome::NoData {
            message: message.to_string(),
        }
    }

    pub fn chart(&self) -> Option<&ChartSpec> {
        match self {
            ChartOutcome::Rendered { chart } => Some(chart),
            ChartOutcome::NoData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub field: String,
    pub label: String,
    pub reversed: bool,
}

impl Axis {
    fn new(field: &str, label: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            label: label.into(),
            reversed: false,
        }
    }

    fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis: Option<Axis>,
    pub y_axis: Option<Axis>,
    /// Field used for color grouping
    pub color: String,
    pub body: ChartBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartBody {
    Scatter {
        points: Vec<ScatterPoint>,
        size_field: String,
    },
    Histogram {
        series: Vec<HistogramSeries>,
        opacity: f64,
        /// Marginal box summary over all groups
        marginal: Option<DistributionStats>,
    },
    Violin {
        groups: Vec<GroupDistribution>,
    },
    Box {
        groups: Vec<GroupDistribution>,
    },
    ScatterMatrix {
        dimensions: Vec<RatingKind>,
        diagonal_visible: bool,
        points: Vec<MatrixPoint>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub name: String,
    pub title: Option<String>,
    pub group: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSeries {
    pub group: String,
    pub bins: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDistribution {
    pub group: String,
    pub stats: DistributionStats,
    pub points: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixPoint {
    pub name: String,
    pub group: String,
    /// Ratings in `dimensions` order
    pub values: Vec<Option<f64>>,
}

/// Presentation adapter seam.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, rows: &[&ResolvedPlayerRecord], request: &ChartRequest) -> ChartOutcome;
}

/// Built-in renderer producing [`ChartSpec`] values.
#[derive(Debug, Clone)]
pub struct SpecRenderer {
    pub histogram_bins: usize,
}

impl Default for SpecRenderer {
    fn default() -> Self {
        Self { histogram_bins: 20 }
    }
}

impl SpecRenderer {
    pub fn new(histogram_bins: usize) -> Self {
        Self { histogram_bins }
    }

    fn ranking(&self, rows: &[&ResolvedPlayerRecord], rating: RatingKind) -> ChartSpec {
        let points = rows
            .iter()
            .filter_map(|p| {
                let rank = p.rank()?;
                let value = p.rating(rating)?;
                Some(ScatterPoint {
                    name: p.name().to_string(),
                    title: p.title().map(str::to_string),
                    group: group_of(p),
                    x: rank as f64,
                    y: value,
                    size: value,
                })
            })
            .collect();

        ChartSpec {
            title: format!("Ranking vs {} Rating", rating.label()),
            x_axis: Some(Axis::new("rank", "Rank (1 = best)").reversed()),
            y_axis: Some(Axis::new(rating.column(), format!("{} rating", rating.label()))),
            color: "country".to_string(),
            body: ChartBody::Scatter {
                points,
                size_field: rating.column().to_string(),
            },
        }
    }

    fn distribution(
        &self,
        rows: &[&ResolvedPlayerRecord],
        rating: RatingKind,
        kind: DistributionKind,
    ) -> ChartSpec {
        let by_group = values_by_group(rows, rating);
        let rating_label = format!("{} rating", rating.label());

        match kind {
            DistributionKind::Histogram => {
                let all: Vec<f64> = by_group.values().flatten().copied().collect();
                let series = by_group
                    .iter()
                    .map(|(group, values)| HistogramSeries {
                        group: group.clone(),
                        bins: self.shared_bins(&all, values),
                    })
                    .collect();

                ChartSpec {
                    title: format!("{} rating distribution (Histogram)", rating.label()),
                    x_axis: Some(Axis::new(rating.column(), rating_label)),
                    y_axis: Some(Axis::new("count", "Number of players")),
                    color: "country".to_string(),
                    body: ChartBody::Histogram {
                        series,
                        opacity: 0.7,
                        marginal: distribution(&all),
                    },
                }
            }
            DistributionKind::Violin | DistributionKind::Box => {
                let groups: Vec<GroupDistribution> = by_group
                    .into_iter()
                    .filter_map(|(group, points)| {
                        let stats = distribution(&points)?;
                        Some(GroupDistribution {
                            group,
                            stats,
                            points,
                        })
                    })
                    .collect();

                let body = if kind == DistributionKind::Violin {
                    ChartBody::Violin { groups }
                } else {
                    ChartBody::Box { groups }
                };

                ChartSpec {
                    title: format!(
                        "{} rating distribution by country ({})",
                        rating.label(),
                        kind.label()
                    ),
                    x_axis: Some(Axis::new("country", "Country")),
                    y_axis: Some(Axis::new(rating.column(), rating_label)),
                    color: "country".to_string(),
                    body,
                }
            }
        }
    }

    /// Bin one group's values on edges computed from every group, so series
    /// stack on a common x axis.
    fn shared_bins(&self, all: &[f64], values: &[f64]) -> Vec<HistogramBin> {
        let mut bins = histogram(all, self.histogram_bins);
        for bin in &mut bins {
            bin.count = 0;
        }
        let Some(first) = bins.first().copied() else {
            return bins;
        };
        let last = bins.len() - 1;
        let width = if last == 0 {
            0.0
        } else {
            bins[0].end - first.start
        };

        for v in values.iter().copied().filter(|v| v.is_finite()) {
            let idx = if width > 0.0 {
                (((v - first.start) / width).floor() as usize).min(last)
            } else {
                0
            };
            bins[idx].count += 1;
        }
        bins
    }

    fn comparison(&self, rows: &[&ResolvedPlayerRecord], top_n: u32) -> ChartOutcome {
        let top = by_rank(rows, RankLimit::AtMost(top_n));
        if top.is_empty() {
            return ChartOutcome::no_data(NO_TOP_N_MATCHES);
        }

        let dimensions = RatingKind::ALL.to_vec();
        let points = top
            .iter()
            .map(|p| MatrixPoint {
                name: p.name().to_string(),
                group: group_of(p),
                values: dimensions.iter().map(|k| p.rating(*k)).collect(),
            })
            .collect();

        ChartOutcome::Rendered {
            chart: ChartSpec {
                title: format!("Rating comparison (Top {} by rank)", top_n),
                x_axis: None,
                y_axis: None,
                color: "country".to_string(),
                body: ChartBody::ScatterMatrix {
                    dimensions,
                    diagonal_visible: false,
                    points,
                },
            },
        }
    }
}

impl ChartRenderer for SpecRenderer {
    fn render(&self, rows: &[&ResolvedPlayerRecord], request: &ChartRequest) -> ChartOutcome {
        if rows.is_empty() {
            return ChartOutcome::no_data(NO_MATCHES);
        }

        match request {
            ChartRequest::Ranking { rating } => ChartOutcome::Rendered {
                chart: self.ranking(rows, *rating),
            },
            ChartRequest::Distribution { rating, kind } => ChartOutcome::Rendered {
                chart: self.distribution(rows, *rating, *kind),
            },
            ChartRequest::Comparison { top_n } => self.comparison(rows, *top_n),
        }
    }
}

fn group_of(p: &ResolvedPlayerRecord) -> String {
    p.country().unwrap_or(UNKNOWN_GROUP).to_string()
}

fn values_by_group(
    rows: &[&ResolvedPlayerRecord],
    rating: RatingKind,
) -> BTreeMap<String, Vec<f64>> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for p in rows {
        if let Some(v) = p.rating(rating) {
            groups.entry(group_of(p)).or_default().push(v);
        }
    }
    groups
}
