//! Rating categories and chart kinds selectable from the dashboard.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rating category (time control).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RatingKind {
    #[default]
    Classical,
    Rapid,
    Blitz,
}

impl RatingKind {
    pub const ALL: [RatingKind; 3] = [RatingKind::Classical, RatingKind::Rapid, RatingKind::Blitz];

    /// Source column holding this rating.
    pub fn column(&self) -> &'static str {
        match self {
            RatingKind::Classical => "classicalrating",
            RatingKind::Rapid => "rapidrating",
            RatingKind::Blitz => "blitzrating",
        }
    }

    /// Human-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            RatingKind::Classical => "Classical",
            RatingKind::Rapid => "Rapid",
            RatingKind::Blitz => "Blitz",
        }
    }
}

impl fmt::Display for RatingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RatingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "classical" | "classicalrating" => Ok(RatingKind::Classical),
            "rapid" | "rapidrating" => Ok(RatingKind::Rapid),
            "blitz" | "blitzrating" => Ok(RatingKind::Blitz),
            other => Err(format!(
                "unknown rating '{}' (expected classical, rapid or blitz)",
                other
            )),
        }
    }
}

/// Chart kind for the distribution view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    #[default]
    Histogram,
    Violin,
    Box,
}

impl DistributionKind {
    pub const ALL: [DistributionKind; 3] = [
        DistributionKind::Histogram,
        DistributionKind::Violin,
        DistributionKind::Box,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DistributionKind::Histogram => "Histogram",
            DistributionKind::Violin => "Violin",
            DistributionKind::Box => "Boxplot",
        }
    }
}

impl FromStr for DistributionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "histogram" => Ok(DistributionKind::Histogram),
            "violin" => Ok(DistributionKind::Violin),
            "box" | "boxplot" => Ok(DistributionKind::Box),
            other => Err(format!(
                "unknown chart '{}' (expected histogram, violin or box)",
                other
            )),
        }
    }
}
