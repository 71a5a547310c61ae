//! Import configuration
//!
//! Immutable settings built once at startup and passed down to every
//! component: the CSV field schema, the site time zone, size limits and the
//! import logger settings.

use crate::error::{CsvPostError, Result};
use crate::logging::LogLevel;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

// ============================================================================
// Field Schema Constants
// ============================================================================

pub const FIELD_POST_DATE: &str = "Post Date";
pub const FIELD_TITLE: &str = "Title";
pub const FIELD_CONTENT: &str = "Content";
pub const FIELD_CATEGORY: &str = "Category";
pub const FIELD_TAGS: &str = "Tags";

/// Standard post fields, in default column order.
pub const STANDARD_FIELDS: [&str; 5] = [
    FIELD_POST_DATE,
    FIELD_TITLE,
    FIELD_CONTENT,
    FIELD_CATEGORY,
    FIELD_TAGS,
];

/// Named custom fields stored as post metadata.
pub const CUSTOM_FIELDS: [&str; 6] = [
    "custom_fields_01",
    "custom_fields_02",
    "custom_fields_03",
    "custom_fields_04",
    "custom_fields_05",
    "custom_fields_06",
];

/// Fields an explicit header must contain.
pub const REQUIRED_FIELDS: [&str; 3] = [FIELD_POST_DATE, FIELD_TITLE, FIELD_CONTENT];

/// Default maximum input size (1 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 1024 * 1024;

/// Default import log level.
pub const DEFAULT_IMPORT_LOG_LEVEL: LogLevel = LogLevel::Error;

// ============================================================================
// Field Schema
// ============================================================================

/// Ordered set of known CSV field names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    standard: Vec<String>,
    custom: Vec<String>,
    required: Vec<String>,
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self {
            standard: STANDARD_FIELDS.iter().map(|s| s.to_string()).collect(),
            custom: CUSTOM_FIELDS.iter().map(|s| s.to_string()).collect(),
            required: REQUIRED_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FieldSchema {
    /// Build a schema, rejecting duplicate names and required fields that
    /// are not part of the schema.
    pub fn new(standard: Vec<String>, custom: Vec<String>, required: Vec<String>) -> Result<Self> {
        let schema = Self {
            standard,
            custom,
            required,
        };
        schema.validate()?;
        Ok(schema)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in self.standard.iter().chain(&self.custom) {
            if name.is_empty() {
                return Err(CsvPostError::Config("Field names cannot be empty".to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(CsvPostError::Config(format!("Duplicate field name: {}", name)));
            }
        }
        for name in &self.required {
            if !seen.contains(name.as_str()) {
                return Err(CsvPostError::Config(format!(
                    "Required field '{}' is not part of the schema",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn standard(&self) -> &[String] {
        &self.standard
    }

    pub fn custom(&self) -> &[String] {
        &self.custom
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Every known field, standard first: this is the default header order.
    pub fn all_fields(&self) -> Vec<String> {
        self.standard.iter().chain(&self.custom).cloned().collect()
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.standard.iter().chain(&self.custom).any(|f| f == name)
    }

    /// Required fields absent from `header`, in schema order.
    pub fn missing_required(&self, header: &[String]) -> Vec<String> {
        self.required
            .iter()
            .filter(|f| !header.contains(f))
            .cloned()
            .collect()
    }

    /// Header cells that are not known fields, in header order.
    pub fn unknown_fields(&self, header: &[String]) -> Vec<String> {
        header.iter().filter(|h| !self.is_known(h)).cloned().collect()
    }
}

// ============================================================================
// Site Time Zone
// ============================================================================

/// Time zone scheduled dates are written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SiteTimeZone {
    #[default]
    Utc,
    /// IANA zone such as `Asia/Tokyo`
    Named(Tz),
    /// Fixed offset such as `+09:00` or `UTC-5`
    Fixed(FixedOffset),
}

impl SiteTimeZone {
    /// Convert a site-local wall clock time to UTC.
    ///
    /// Ambiguous local times resolve to the earlier instant. Times inside a
    /// DST gap are moved forward one hour.
    pub fn to_utc(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            SiteTimeZone::Utc => Some(Utc.from_utc_datetime(&local)),
            SiteTimeZone::Fixed(offset) => offset
                .from_local_datetime(&local)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
            SiteTimeZone::Named(tz) => tz
                .from_local_datetime(&local)
                .earliest()
                .or_else(|| {
                    let shifted = local.checked_add_signed(TimeDelta::hours(1))?;
                    tz.from_local_datetime(&shifted).earliest()
                })
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    fn parse_offset(s: &str) -> Option<FixedOffset> {
        let body = s
            .strip_prefix("UTC")
            .or_else(|| s.strip_prefix("GMT"))
            .unwrap_or(s);
        let (sign, rest) = match body.chars().next()? {
            '+' => (1, &body[1..]),
            '-' => (-1, &body[1..]),
            _ => return None,
        };
        if rest.is_empty() {
            return None;
        }

        let seconds = if let Some((h, m)) = rest.split_once(':') {
            hours_minutes(h.parse().ok()?, m.parse().ok()?)?
        } else if rest.contains('.') {
            // gmt-offset style, e.g. "+5.5"
            let hours: f64 = rest.parse().ok()?;
            if !hours.is_finite() || !(0.0..=14.0).contains(&hours) {
                return None;
            }
            (hours * 3600.0).round() as i32
        } else if rest.len() == 4 && rest.bytes().all(|b| b.is_ascii_digit()) {
            hours_minutes(rest[..2].parse().ok()?, rest[2..].parse().ok()?)?
        } else {
            hours_minutes(rest.parse().ok()?, 0)?
        };

        if seconds > MAX_OFFSET_SECONDS {
            return None;
        }
        FixedOffset::east_opt(sign * seconds)
    }
}

const MAX_OFFSET_SECONDS: i32 = 14 * 3600;

fn hours_minutes(hours: i32, minutes: i32) -> Option<i32> {
    if !(0..60).contains(&minutes) || !(0..=14).contains(&hours) {
        return None;
    }
    hours.checked_mul(3600)?.checked_add(minutes * 60)
}

impl std::str::FromStr for SiteTimeZone {
    type Err = CsvPostError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("utc") || s == "Z" {
            return Ok(SiteTimeZone::Utc);
        }
        if let Some(offset) = Self::parse_offset(s) {
            return Ok(SiteTimeZone::Fixed(offset));
        }
        s.parse::<Tz>()
            .map(SiteTimeZone::Named)
            .map_err(|e| CsvPostError::Config(format!("Invalid time zone '{}': {}", s, e)))
    }
}

impl std::fmt::Display for SiteTimeZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SiteTimeZone::Utc => write!(f, "UTC"),
            SiteTimeZone::Named(tz) => write!(f, "{}", tz.name()),
            SiteTimeZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

impl TryFrom<String> for SiteTimeZone {
    type Error = CsvPostError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SiteTimeZone> for String {
    fn from(value: SiteTimeZone) -> Self {
        value.to_string()
    }
}

// ============================================================================
// Import Configuration
// ============================================================================

/// Settings for the injected import logger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportLogSettings {
    /// Debug mode: nothing is logged unless enabled
    pub enabled: bool,
    /// Most verbose level that is still written
    pub level: LogLevel,
    /// Log file written by the file sink
    pub file: Option<PathBuf>,
}

impl Default for ImportLogSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: DEFAULT_IMPORT_LOG_LEVEL,
            file: None,
        }
    }
}

/// Main import configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub schema: FieldSchema,
    pub time_zone: SiteTimeZone,
    /// Author stamped on every post request
    pub author_id: Option<u64>,
    pub max_input_bytes: u64,
    pub log: ImportLogSettings,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            schema: FieldSchema::default(),
            time_zone: SiteTimeZone::Utc,
            author_id: None,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            log: ImportLogSettings::default(),
        }
    }
}

impl ImportConfig {
    /// Load configuration from `.env` and environment variables
    ///
    /// Environment variables:
    /// - `CSVPOST_TIMEZONE`: IANA name or fixed offset (default UTC)
    /// - `CSVPOST_AUTHOR_ID`: author id for created posts
    /// - `CSVPOST_MAX_INPUT_BYTES`: maximum accepted input size
    /// - `CSVPOST_DEBUG`: enable the import log (true/false)
    /// - `CSVPOST_LOG_LEVEL`: error, warning, info or debug
    /// - `CSVPOST_LOG_FILE`: path of the import log file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let time_zone = match std::env::var("CSVPOST_TIMEZONE") {
            Ok(tz) => tz.parse::<SiteTimeZone>()?,
            Err(_) => SiteTimeZone::Utc,
        };

        let level = match std::env::var("CSVPOST_LOG_LEVEL") {
            Ok(level) => level
                .parse::<LogLevel>()
                .map_err(|e| CsvPostError::Config(format!("CSVPOST_LOG_LEVEL: {}", e)))?,
            Err(_) => DEFAULT_IMPORT_LOG_LEVEL,
        };

        let config = Self {
            schema: FieldSchema::default(),
            time_zone,
            author_id: std::env::var("CSVPOST_AUTHOR_ID")
                .ok()
                .and_then(|s| s.parse().ok()),
            max_input_bytes: std::env::var("CSVPOST_MAX_INPUT_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_INPUT_BYTES),
            log: ImportLogSettings {
                enabled: std::env::var("CSVPOST_DEBUG")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(false),
                level,
                file: std::env::var("CSVPOST_LOG_FILE").ok().map(PathBuf::from),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.schema.validate()?;
        if self.max_input_bytes == 0 {
            return Err(CsvPostError::Config(
                "CSVPOST_MAX_INPUT_BYTES must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ImportConfigBuilder {
        ImportConfigBuilder::default()
    }
}

/// Builder for ImportConfig
#[derive(Default)]
pub struct ImportConfigBuilder {
    config: ImportConfig,
}

impl ImportConfigBuilder {
    pub fn schema(mut self, schema: FieldSchema) -> Self {
        self.config.schema = schema;
        self
    }

    pub fn time_zone(mut self, time_zone: SiteTimeZone) -> Self {
        self.config.time_zone = time_zone;
        self
    }

    pub fn author_id(mut self, author_id: u64) -> Self {
        self.config.author_id = Some(author_id);
        self
    }

    pub fn max_input_bytes(mut self, max: u64) -> Self {
        self.config.max_input_bytes = max;
        self
    }

    pub fn log(mut self, log: ImportLogSettings) -> Self {
        self.config.log = log;
        self
    }

    pub fn build(self) -> Result<ImportConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_default_schema_order() {
        let schema = FieldSchema::default();
        assert_eq!(
            schema.all_fields(),
            vec![
                "Post Date",
                "Title",
                "Content",
                "Category",
                "Tags",
                "custom_fields_01",
                "custom_fields_02",
                "custom_fields_03",
                "custom_fields_04",
                "custom_fields_05",
                "custom_fields_06",
            ]
        );
        assert!(schema.is_known("Tags"));
        assert!(!schema.is_known("tags"));
    }

    #[test]
    fn test_schema_rejects_duplicates_and_foreign_required() {
        let dup = FieldSchema::new(
            vec!["Title".into(), "Title".into()],
            vec![],
            vec!["Title".into()],
        );
        assert!(dup.is_err());

        let foreign = FieldSchema::new(vec!["Title".into()], vec![], vec!["Post Date".into()]);
        assert!(foreign.is_err());
    }

    #[test]
    fn test_missing_and_unknown_fields() {
        let schema = FieldSchema::default();
        let header: Vec<String> = vec!["Title".into(), "Foo".into(), "Content".into()];
        assert_eq!(schema.missing_required(&header), vec!["Post Date"]);
        assert_eq!(schema.unknown_fields(&header), vec!["Foo"]);
    }

    #[test]
    fn test_time_zone_parsing() {
        assert_eq!("".parse::<SiteTimeZone>().unwrap(), SiteTimeZone::Utc);
        assert_eq!("UTC".parse::<SiteTimeZone>().unwrap(), SiteTimeZone::Utc);
        assert_eq!(
            "Asia/Tokyo".parse::<SiteTimeZone>().unwrap(),
            SiteTimeZone::Named(chrono_tz::Asia::Tokyo)
        );
        assert_eq!(
            "UTC+9".parse::<SiteTimeZone>().unwrap(),
            SiteTimeZone::Fixed(FixedOffset::east_opt(9 * 3600).unwrap())
        );
        assert_eq!(
            "-05:30".parse::<SiteTimeZone>().unwrap(),
            SiteTimeZone::Fixed(FixedOffset::west_opt(5 * 3600 + 1800).unwrap())
        );
        assert_eq!(
            "+5.5".parse::<SiteTimeZone>().unwrap(),
            SiteTimeZone::Fixed(FixedOffset::east_opt(5 * 3600 + 1800).unwrap())
        );
        assert!("Mars/Olympus".parse::<SiteTimeZone>().is_err());
    }

    #[test]
    fn test_out_of_range_offsets_are_config_errors() {
        for input in ["+99999999", "-2147483647", "+15", "+14:30", "+9999", "+99999999.5", "+NaN.0", "--1.5"] {
            let err = input.parse::<SiteTimeZone>().unwrap_err();
            assert_eq!(err.code(), "config_error", "{input}");
            assert!(err.to_string().contains("Invalid time zone"), "{input}");
        }
        assert_eq!(
            "+14".parse::<SiteTimeZone>().unwrap(),
            SiteTimeZone::Fixed(FixedOffset::east_opt(14 * 3600).unwrap())
        );
    }

    #[test]
    fn test_named_zone_to_utc() {
        let tz = SiteTimeZone::Named(chrono_tz::Asia::Tokyo);
        let utc = tz.to_utc(at(2024, 1, 1, 9, 0)).unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_dst_gap_moves_forward() {
        // 02:30 does not exist in New York on 2024-03-10
        let tz = SiteTimeZone::Named(chrono_tz::America::New_York);
        let utc = tz.to_utc(at(2024, 3, 10, 2, 30)).unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-03-10T07:30:00+00:00");
    }

    #[test]
    fn test_dst_overlap_takes_earlier_instant() {
        // 01:30 happens twice in New York on 2024-11-03
        let tz = SiteTimeZone::Named(chrono_tz::America::New_York);
        let utc = tz.to_utc(at(2024, 11, 3, 1, 30)).unwrap();
        assert_eq!(utc.to_rfc3339(), "2024-11-03T05:30:00+00:00");
    }

    #[test]
    fn test_time_zone_serde_uses_names() {
        let tz = SiteTimeZone::Named(chrono_tz::Europe::Berlin);
        let json = serde_json::to_string(&tz).unwrap();
        assert_eq!(json, "\"Europe/Berlin\"");
        let back: SiteTimeZone = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tz);
    }

    #[test]
    fn test_builder_validates() {
        let config = ImportConfig::builder()
            .time_zone(SiteTimeZone::Utc)
            .author_id(7)
            .build()
            .unwrap();
        assert_eq!(config.author_id, Some(7));
        assert_eq!(config.max_input_bytes, DEFAULT_MAX_INPUT_BYTES);
        assert!(!config.log.enabled);

        assert!(ImportConfig::builder().max_input_bytes(0).build().is_err());
    }

    proptest! {
        #[test]
        fn prop_fixed_offset_shifts_by_offset(hours in -12i32..=14, minute in 0u32..60) {
            let offset = FixedOffset::east_opt(hours * 3600).unwrap();
            let local = at(2024, 6, 15, 12, minute);
            let utc = SiteTimeZone::Fixed(offset).to_utc(local).unwrap();
            prop_assert_eq!(utc.naive_utc() + TimeDelta::hours(hours as i64), local);
        }
    }
}
