//! `lastupdated` parsing.
//!
//! Source timestamps come in mixed formats. Rather than guess per row, parsing
//! runs two fixed passes:
//!
//! - **primary**: month-first `MM/DD/YYYY` (`-` accepted in place of `/`),
//!   optional `HH:MM[:SS]` after a space or `T`
//! - **fallback**, in order: RFC 3339, year-first `YYYY-MM-DD` / `YYYY/MM/DD`
//!   with optional time, day-first `DD/MM/YYYY` / `DD-MM-YYYY` / `DD.MM.YYYY`,
//!   then month-name forms such as `Jan 5, 2024`, `January 5, 2024` or `5 Jan 2024`
//!
//! An ambiguous `03/04/2024` is always March 4. Day-first slash/dash dates are
//! only reachable when the first token cannot be a month.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};

use crate::models::{DateSource, LastUpdated};

const TIME: &str = r"(?:[ T](\d{1,2}):(\d{2})(?::(\d{2})(?:\.\d+)?)?)?";

static MONTH_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(\d{{1,2}})[/-](\d{{1,2}})[/-](\d{{4}}){}$", TIME))
        .expect("month-first pattern")
});

static YEAR_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(\d{{4}})[/-](\d{{1,2}})[/-](\d{{1,2}}){}$", TIME))
        .expect("year-first pattern")
});

static DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(\d{{1,2}})[/.-](\d{{1,2}})[/.-](\d{{4}}){}$", TIME))
        .expect("day-first pattern")
});

/// Month word followed by its tail, e.g. `January` or `Sept.`
static MONTH_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z]{3})[A-Za-z]*\.?").expect("month word pattern")
});

const MONTH_NAME_FORMATS: [&str; 8] = [
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
    "%d %b, %Y",
];

/// A parsed timestamp and the pass that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub at: NaiveDateTime,
    pub source: DateSource,
}

/// Parse a snapshot timestamp: structured values pass through, raw text tries
/// the primary pass and then the fallback pass.
pub fn parse_last_updated(value: &LastUpdated) -> Option<ParsedDate> {
    match value {
        LastUpdated::Structured(at) => Some(ParsedDate {
            at: *at,
            source: DateSource::Structured,
        }),
        LastUpdated::Raw(raw) => {
            if let Some(at) = parse_primary(raw) {
                return Some(ParsedDate {
                    at,
                    source: DateSource::Primary,
                });
            }
            parse_fallback(raw).map(|at| ParsedDate {
                at,
                source: DateSource::Fallback,
            })
        }
    }
}

/// Strict month-first parse.
pub fn parse_primary(raw: &str) -> Option<NaiveDateTime> {
    let caps = MONTH_FIRST.captures(raw.trim())?;
    build(&caps, 3, 1, 2)
}

/// Secondary formats, tried in a fixed order.
pub fn parse_fallback(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    if let Some(caps) = YEAR_FIRST.captures(s) {
        return build(&caps, 1, 2, 3);
    }

    if let Some(caps) = DAY_FIRST.captures(s) {
        if let Some(dt) = build(&caps, 3, 2, 1) {
            return Some(dt);
        }
    }

    parse_month_name(s)
        .or_else(|| parse_month_name(&MONTH_WORD.replace(s, "$1")))
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn parse_month_name(s: &str) -> Option<NaiveDate> {
    MONTH_NAME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn build(caps: &Captures, year: usize, month: usize, day: usize) -> Option<NaiveDateTime> {
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let date = NaiveDate::from_ymd_opt(num(year)? as i32, num(month)?, num(day)?)?;
    let time = match num(4) {
        Some(h) => NaiveTime::from_hms_opt(h, num(5)?, num(6).unwrap_or(0))?,
        None => NaiveTime::MIN,
    };
    Some(date.and_time(time))
}
