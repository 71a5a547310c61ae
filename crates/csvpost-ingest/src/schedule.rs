//! Post date parsing and time zone conversion

use chrono::{DateTime, NaiveDateTime, Utc};
use csvpost_common::config::SiteTimeZone;
use csvpost_common::{CsvPostError, Result};
use serde::Serialize;

/// Accepted post date layouts, tried in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateFormat {
    /// `YYYY-MM-DD HH:mm`
    IsoDash,
    /// `YYYY/MM/DD HH:mm`
    IsoSlash,
    /// `DD-MM-YYYY HH:mm`
    DayFirstDash,
    /// `MM/DD/YYYY HH:mm`
    MonthFirstSlash,
}

impl DateFormat {
    /// First match wins, so "01-02-2024" style strings are read day-first
    pub const ALL: [DateFormat; 4] = [
        DateFormat::IsoDash,
        DateFormat::IsoSlash,
        DateFormat::DayFirstDash,
        DateFormat::MonthFirstSlash,
    ];

    pub fn pattern(self) -> &'static str {
        match self {
            DateFormat::IsoDash => "%Y-%m-%d %H:%M",
            DateFormat::IsoSlash => "%Y/%m/%d %H:%M",
            DateFormat::DayFirstDash => "%d-%m-%Y %H:%M",
            DateFormat::MonthFirstSlash => "%m/%d/%Y %H:%M",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateFormat::IsoDash => "YYYY-MM-DD HH:mm",
            DateFormat::IsoSlash => "YYYY/MM/DD HH:mm",
            DateFormat::DayFirstDash => "DD-MM-YYYY HH:mm",
            DateFormat::MonthFirstSlash => "MM/DD/YYYY HH:mm",
        }
    }

    /// Try this layout alone
    pub fn parse(self, value: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(value, self.pattern()).ok()
    }
}

/// A post date read from the CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub local: NaiveDateTime,
    pub format: DateFormat,
}

/// Parse a post date with the first layout that accepts it
pub fn parse_post_date(value: &str) -> Result<ParsedDate> {
    let value = value.trim();
    DateFormat::ALL
        .iter()
        .find_map(|&format| format.parse(value).map(|local| ParsedDate { local, format }))
        .ok_or_else(|| CsvPostError::DateFormat {
            value: value.to_string(),
            expected: expected_formats(),
        })
}

/// Parse a post date and convert it from site time to UTC
pub fn schedule_utc(value: &str, time_zone: &SiteTimeZone) -> Result<(ParsedDate, DateTime<Utc>)> {
    let parsed = parse_post_date(value)?;
    let utc = time_zone
        .to_utc(parsed.local)
        .ok_or_else(|| CsvPostError::DateFormat {
            value: value.to_string(),
            expected: format!("a time that exists in {}", time_zone),
        })?;
    Ok((parsed, utc))
}

fn expected_formats() -> String {
    DateFormat::ALL
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}
