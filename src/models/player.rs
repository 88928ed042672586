//! Player ranking snapshot models.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::RatingKind;

/// The `lastupdated` value of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LastUpdated {
    /// Free-text timestamp as read from the source file.
    Raw(String),
    /// Already a date-time; never re-parsed.
    Structured(NaiveDateTime),
}

impl LastUpdated {
    pub fn raw(s: impl Into<String>) -> Self {
        LastUpdated::Raw(s.into())
    }
}

/// One dated snapshot of a player's rank and ratings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecord {
    /// Player name (not unique across snapshots)
    pub name: String,

    pub country: Option<String>,

    /// FIDE title (GM, IM, WGM, ...)
    pub title: Option<String>,

    /// Global ranking position (1 = best)
    pub rank: Option<u32>,

    pub classicalrating: Option<f64>,
    pub rapidrating: Option<f64>,
    pub blitzrating: Option<f64>,

    pub lastupdated: LastUpdated,
}

impl PlayerRecord {
    /// Create a snapshot with only a name and raw timestamp set.
    pub fn new(name: impl Into<String>, lastupdated: LastUpdated) -> Self {
        Self {
            name: name.into(),
            country: None,
            title: None,
            rank: None,
            classicalrating: None,
            rapidrating: None,
            blitzrating: None,
            lastupdated,
        }
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn with_rating(mut self, kind: RatingKind, value: f64) -> Self {
        match kind {
            RatingKind::Classical => self.classicalrating = Some(value),
            RatingKind::Rapid => self.rapidrating = Some(value),
            RatingKind::Blitz => self.blitzrating = Some(value),
        }
        self
    }

    /// Rating for the given category, if present.
    pub fn rating(&self, kind: RatingKind) -> Option<f64> {
        match kind {
            RatingKind::Classical => self.classicalrating,
            RatingKind::Rapid => self.rapidrating,
            RatingKind::Blitz => self.blitzrating,
        }
    }
}

/// Which parse pass produced a snapshot's timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateSource {
    Primary,
    Fallback,
    Structured,
}

/// The freshest snapshot of one player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPlayerRecord {
    #[serde(flatten)]
    pub record: PlayerRecord,

    /// Parsed `lastupdated`, full precision
    pub updated_at: NaiveDateTime,

    pub date_source: DateSource,
}

impl ResolvedPlayerRecord {
    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn country(&self) -> Option<&str> {
        self.record.country.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.record.title.as_deref()
    }

    pub fn rank(&self) -> Option<u32> {
        self.record.rank
    }

    pub fn rating(&self, kind: RatingKind) -> Option<f64> {
        self.record.rating(kind)
    }

    /// Date-only view of `updated_at`.
    pub fn updated_on(&self) -> NaiveDate {
        self.updated_at.date()
    }
}

/// Anything carrying per-category ratings.
pub trait Rated {
    fn rating(&self, kind: RatingKind) -> Option<f64>;
}

impl Rated for PlayerRecord {
    fn rating(&self, kind: RatingKind) -> Option<f64> {
        PlayerRecord::rating(self, kind)
    }
}

impl Rated for ResolvedPlayerRecord {
    fn rating(&self, kind: RatingKind) -> Option<f64> {
        self.record.rating(kind)
    }
}

impl<T: Rated + ?Sized> Rated for &T {
    fn rating(&self, kind: RatingKind) -> Option<f64> {
        (**self).rating(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let record = PlayerRecord::new("Carlsen, Magnus", LastUpdated::raw("01/15/2024"))
            .with_country("NOR")
            .with_title("GM")
            .with_rank(1)
            .with_rating(RatingKind::Classical, 2830.0);

        assert_eq!(record.country.as_deref(), Some("NOR"));
        assert_eq!(record.title.as_deref(), Some("GM"));
        assert_eq!(record.rank, Some(1));
        assert_eq!(record.rating(RatingKind::Classical), Some(2830.0));
        assert_eq!(record.rating(RatingKind::Blitz), None);
    }

    #[test]
    fn test_resolved_serializes_flat() {
        let record = PlayerRecord::new("A", LastUpdated::raw("01/15/2024")).with_rank(3);
        let resolved = ResolvedPlayerRecord {
            record,
            updated_at: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            date_source: DateSource::Primary,
        };

        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["name"], "A");
        assert_eq!(json["rank"], 3);
        assert_eq!(json["lastupdated"], "01/15/2024");
        assert_eq!(json["updated_at"], "2024-01-15T00:00:00");
        assert_eq!(json["date_source"], "primary");
        assert!(json["country"].is_null());
    }
}
