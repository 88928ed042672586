//! Statistics calculation engine.
//!
//! Computes summary metrics over a dataset subset:
//! - Mean rating per rating category (KPIs)
//! - Distribution statistics (quartiles, extremes)
//! - Equal-width histograms
//!
//! "No data" is `None`: an empty subset or an all-null column never panics and
//! never yields NaN.

use serde::Serialize;

use crate::models::{Rated, RatingKind};

/// Arithmetic mean, `None` when there are no values.
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Non-null values of one rating column.
pub fn rating_values<T: Rated>(rows: &[T], kind: RatingKind) -> Vec<f64> {
    rows.iter().filter_map(|r| r.rating(kind)).collect()
}

/// Mean of a rating column over its non-null values.
pub fn mean_rating<T: Rated>(rows: &[T], kind: RatingKind) -> Option<f64> {
    mean(rows.iter().filter_map(|r| r.rating(kind)))
}

/// Mean rating per category over a subset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub players: usize,
    pub classical: Option<f64>,
    pub rapid: Option<f64>,
    pub blitz: Option<f64>,
}

impl RatingSummary {
    pub fn compute<T: Rated>(rows: &[T]) -> Self {
        Self {
            players: rows.len(),
            classical: mean_rating(rows, RatingKind::Classical),
            rapid: mean_rating(rows, RatingKind::Rapid),
            blitz: mean_rating(rows, RatingKind::Blitz),
        }
    }

    pub fn get(&self, kind: RatingKind) -> Option<f64> {
        match kind {
            RatingKind::Classical => self.classical,
            RatingKind::Rapid => self.rapid,
            RatingKind::Blitz => self.blitz,
        }
    }
}

/// KPI display text: one decimal, or "no data".
pub fn format_kpi(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => "no data".to_string(),
    }
}

/// Five-number summary plus mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionStats {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

/// Distribution statistics with linearly interpolated quartiles.
pub fn distribution(values: &[f64]) -> Option<DistributionStats> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    Some(DistributionStats {
        count: sorted.len(),
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
        mean: mean(sorted.iter().copied())?,
    })
}

/// Quantile of sorted, non-empty data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// One histogram bar, `[start, end)` except the last which is closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: u32,
}

/// Equal-width histogram over `[min, max]` of the values.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return vec![HistogramBin {
            start: min,
            end: max,
            count: finite.len() as u32,
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for v in finite {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }

    out
}
