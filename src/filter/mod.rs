//! Filter engine.
//!
//! Filters are immutable values built per request and applied to the resolved
//! base dataset. The result borrows from the base, so subsets are cheap and
//! vanish with the request.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::ResolvedPlayerRecord;

/// Membership filter over a categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", content = "values", rename_all = "lowercase")]
pub enum Selection {
    /// No restriction; null values pass too.
    #[default]
    All,
    /// Only the listed values. Null never matches.
    Only(BTreeSet<String>),
}

impl Selection {
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Only(values.into_iter().map(Into::into).collect())
    }

    /// Parse a widget value: absent, blank or `all` means no restriction,
    /// otherwise a comma-separated list.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Selection::All;
        };
        if raw.trim().eq_ignore_ascii_case("all") {
            return Selection::All;
        }

        let values: BTreeSet<String> = raw
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if values.is_empty() {
            Selection::All
        } else {
            Selection::Only(values)
        }
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(set) => value.is_some_and(|v| set.contains(v)),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

/// Rank ceiling for Top-N views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum RankLimit {
    #[default]
    Unbounded,
    AtMost(u32),
}

impl RankLimit {
    /// A null rank never passes a bounded limit.
    pub fn admits(&self, rank: Option<u32>) -> bool {
        match self {
            RankLimit::Unbounded => true,
            RankLimit::AtMost(max) => rank.is_some_and(|r| r <= *max),
        }
    }
}

impl From<Option<u32>> for RankLimit {
    fn from(value: Option<u32>) -> Self {
        value.map_or(RankLimit::Unbounded, RankLimit::AtMost)
    }
}

/// The complete filter applied to one view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterSpec {
    pub countries: Selection,
    pub titles: Selection,
    pub max_rank: RankLimit,
}

impl FilterSpec {
    /// A spec that passes every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_countries(mut self, countries: Selection) -> Self {
        self.countries = countries;
        self
    }

    pub fn with_titles(mut self, titles: Selection) -> Self {
        self.titles = titles;
        self
    }

    pub fn with_max_rank(mut self, max_rank: RankLimit) -> Self {
        self.max_rank = max_rank;
        self
    }

    pub fn matches(&self, player: &ResolvedPlayerRecord) -> bool {
        self.countries.matches(player.country())
            && self.titles.matches(player.title())
            && self.max_rank.admits(player.rank())
    }
}

/// Apply a full spec to the base dataset.
pub fn apply<'a>(
    players: &'a [ResolvedPlayerRecord],
    spec: &FilterSpec,
) -> Vec<&'a ResolvedPlayerRecord> {
    players.iter().filter(|p| spec.matches(p)).collect()
}

/// Country step on its own.
pub fn by_country<'a>(
    rows: &[&'a ResolvedPlayerRecord],
    countries: &Selection,
) -> Vec<&'a ResolvedPlayerRecord> {
    rows.iter()
        .copied()
        .filter(|p| countries.matches(p.country()))
        .collect()
}

/// Title step on its own.
pub fn by_title<'a>(
    rows: &[&'a ResolvedPlayerRecord],
    titles: &Selection,
) -> Vec<&'a ResolvedPlayerRecord> {
    rows.iter()
        .copied()
        .filter(|p| titles.matches(p.title()))
        .collect()
}

/// Rank step on its own.
pub fn by_rank<'a>(
    rows: &[&'a ResolvedPlayerRecord],
    max_rank: RankLimit,
) -> Vec<&'a ResolvedPlayerRecord> {
    rows.iter()
        .copied()
        .filter(|p| max_rank.admits(p.rank()))
        .collect()
}

/// Bounds for the Top-N control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopNBounds {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

/// Values a front-end offers in its filter widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub countries: Vec<String>,
    pub titles: Vec<String>,
    pub max_rank: Option<u32>,
    /// `None` when no player has a rank
    pub top_n: Option<TopNBounds>,
}

/// Distinct sorted countries and titles, and the Top-N slider bounds.
pub fn options(
    players: &[ResolvedPlayerRecord],
    min_top_n: u32,
    default_top_n: u32,
) -> FilterOptions {
    let countries: BTreeSet<&str> = players.iter().filter_map(|p| p.country()).collect();
    let titles: BTreeSet<&str> = players.iter().filter_map(|p| p.title()).collect();
    let max_rank = players.iter().filter_map(|p| p.rank()).max();

    let top_n = max_rank.map(|max| {
        let max = max.max(min_top_n);
        TopNBounds {
            min: min_top_n,
            max,
            default: default_top_n.clamp(min_top_n, max),
        }
    });

    FilterOptions {
        countries: countries.into_iter().map(str::to_string).collect(),
        titles: titles.into_iter().map(str::to_string).collect(),
        max_rank,
        top_n,
    }
}
