//! Freshness resolution.
//!
//! Collapses every player's dated snapshots into the single snapshot closest
//! to the run date:
//! - rows whose `lastupdated` fails both parse passes are dropped
//! - distance is measured in whole days between the date part and the run date
//! - equal distances prefer the later full timestamp
//! - exact ties keep the snapshot that came first in the input

pub mod dates;

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info};

use crate::models::{DateSource, PlayerRecord, ResolvedPlayerRecord};

pub use dates::{parse_last_updated, ParsedDate};

/// Counters describing one resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub run_date: Option<NaiveDate>,
    /// Rows handed to the resolver
    pub input_rows: usize,
    /// Rows dropped because `lastupdated` never parsed
    pub dropped_unparseable: usize,
    /// Valid rows shadowed by a fresher snapshot of the same player
    pub superseded: usize,
    pub primary_parsed: usize,
    pub fallback_parsed: usize,
    pub structured: usize,
}

/// Resolver output: one record per player, ordered by name.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub players: Vec<ResolvedPlayerRecord>,
    pub report: ResolutionReport,
}

impl Resolution {
    /// Find a player by exact name.
    pub fn get(&self, name: &str) -> Option<&ResolvedPlayerRecord> {
        self.players
            .binary_search_by(|p| p.name().cmp(name))
            .ok()
            .map(|i| &self.players[i])
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

struct Candidate {
    index: usize,
    distance: i64,
    at: NaiveDateTime,
    source: DateSource,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        self.distance < other.distance || (self.distance == other.distance && self.at > other.at)
    }
}

/// The local calendar date, used as the default run date.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Select the freshest snapshot per player relative to `today`.
pub fn resolve(records: &[PlayerRecord], today: NaiveDate) -> Resolution {
    let mut report = ResolutionReport {
        run_date: Some(today),
        input_rows: records.len(),
        ..Default::default()
    };

    let mut best: HashMap<&str, Candidate> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let Some(parsed) = parse_last_updated(&record.lastupdated) else {
            debug!(
                "Dropping snapshot of {:?}: unparseable lastupdated {:?}",
                record.name, record.lastupdated
            );
            report.dropped_unparseable += 1;
            continue;
        };

        match parsed.source {
            DateSource::Primary => report.primary_parsed += 1,
            DateSource::Fallback => report.fallback_parsed += 1,
            DateSource::Structured => report.structured += 1,
        }

        let candidate = Candidate {
            index,
            distance: (parsed.at.date() - today).num_days().abs(),
            at: parsed.at,
            source: parsed.source,
        };

        match best.entry(record.name.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(candidate);
            }
            Entry::Occupied(mut slot) => {
                report.superseded += 1;
                if candidate.beats(slot.get()) {
                    slot.insert(candidate);
                }
            }
        }
    }

    let mut players: Vec<ResolvedPlayerRecord> = best
        .into_values()
        .map(|c| ResolvedPlayerRecord {
            record: records[c.index].clone(),
            updated_at: c.at,
            date_source: c.source,
        })
        .collect();
    players.sort_by(|a, b| a.name().cmp(b.name()));

    info!(
        "Resolved {} players from {} rows ({} unparseable, {} superseded)",
        players.len(),
        report.input_rows,
        report.dropped_unparseable,
        report.superseded
    );

    Resolution { players, report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LastUpdated;
    use std::collections::HashSet;

    fn date(m: u32, d: u32, y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snap(name: &str, raw: &str) -> PlayerRecord {
        PlayerRecord::new(name, LastUpdated::raw(raw))
    }

    #[test]
    fn test_picks_minimum_distance() {
        let records = vec![snap("A", "01/12/2024"), snap("A", "01/20/2024")];
        let res = resolve(&records, date(1, 15, 2024));

        assert_eq!(res.len(), 1);
        assert_eq!(res.players[0].record.lastupdated, LastUpdated::raw("01/12/2024"));
        assert_eq!(res.report.superseded, 1);
    }

    #[test]
    fn test_future_and_past_measured_absolutely() {
        let records = vec![snap("A", "01/10/2024"), snap("A", "01/17/2024")];
        let res = resolve(&records, date(1, 15, 2024));
        assert_eq!(res.players[0].updated_on(), date(1, 17, 2024));
    }

    #[test]
    fn test_equal_day_distance_prefers_later_timestamp() {
        let records = vec![
            snap("A", "01/15/2024 08:00"),
            snap("A", "01/15/2024 17:30"),
            snap("A", "01/15/2024 12:00"),
        ];
        let res = resolve(&records, date(1, 15, 2024));
        assert_eq!(
            res.players[0].record.lastupdated,
            LastUpdated::raw("01/15/2024 17:30")
        );
    }

    #[test]
    fn test_equidistant_dates_prefer_more_recent() {
        let records = vec![snap("A", "01/20/2024"), snap("A", "01/10/2024")];
        let res = resolve(&records, date(1, 15, 2024));
        assert_eq!(res.players[0].updated_on(), date(1, 20, 2024));

        let reversed = vec![snap("A", "01/10/2024"), snap("A", "01/20/2024")];
        let res = resolve(&reversed, date(1, 15, 2024));
        assert_eq!(res.players[0].updated_on(), date(1, 20, 2024));
    }

    #[test]
    fn test_exact_tie_keeps_first_row() {
        let records = vec![
            snap("A", "01/15/2024").with_rank(4),
            snap("A", "2024-01-15").with_rank(9),
        ];
        let res = resolve(&records, date(1, 15, 2024));
        assert_eq!(res.players[0].rank(), Some(4));
        assert_eq!(res.players[0].date_source, DateSource::Primary);
    }

    #[test]
    fn test_unparseable_rows_dropped() {
        let records = vec![
            snap("A", "garbage"),
            snap("A", "01/14/2024"),
            snap("B", ""),
            snap("C", "2024-01-01"),
        ];
        let res = resolve(&records, date(1, 15, 2024));

        let names: Vec<&str> = res.players.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(res.report.dropped_unparseable, 2);
        assert_eq!(res.report.primary_parsed, 1);
        assert_eq!(res.report.fallback_parsed, 1);
        assert!(res.get("B").is_none());
    }

    #[test]
    fn test_unparseable_never_shadows_valid() {
        let records = vec![snap("A", "01/15/2024 23:59 junk"), snap("A", "06/01/2020")];
        let res = resolve(&records, date(1, 15, 2024));
        assert_eq!(res.players[0].updated_on(), date(6, 1, 2020));
    }

    #[test]
    fn test_structured_dates_used_directly() {
        let at = date(1, 14, 2024).and_hms_opt(10, 0, 0).unwrap();
        let records = vec![
            PlayerRecord::new("A", LastUpdated::Structured(at)),
            snap("A", "01/01/2024"),
        ];
        let res = resolve(&records, date(1, 15, 2024));

        assert_eq!(res.players[0].updated_at, at);
        assert_eq!(res.players[0].date_source, DateSource::Structured);
        assert_eq!(res.report.structured, 1);
    }

    #[test]
    fn test_one_row_per_name_sorted() {
        let records = vec![
            snap("Caruana", "01/01/2024"),
            snap("Anand", "01/02/2024"),
            snap("Caruana", "01/03/2024"),
            snap("Ding", "01/04/2024"),
            snap("Anand", "bad"),
            snap("Anand", "01/09/2024"),
        ];
        let res = resolve(&records, date(1, 15, 2024));

        let names: Vec<&str> = res.players.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Anand", "Caruana", "Ding"]);
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len());
        assert_eq!(res.get("Anand").unwrap().updated_on(), date(1, 9, 2024));
        assert_eq!(res.get("Caruana").unwrap().updated_on(), date(1, 3, 2024));
    }

    #[test]
    fn test_empty_input() {
        let res = resolve(&[], date(1, 15, 2024));
        assert!(res.is_empty());
        assert_eq!(res.report.input_rows, 0);
        assert_eq!(res.report.run_date, Some(date(1, 15, 2024)));
    }
}
