//! Header detection and validation

use crate::model::{Header, RawRow};
use crate::schedule::DateFormat;
use csvpost_common::config::{FieldSchema, FIELD_POST_DATE, FIELD_TITLE};
use csvpost_common::logging::ImportLogger;
use serde::Serialize;

/// Non-fatal problems found in an explicit header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "fields", rename_all = "snake_case")]
pub enum HeaderWarning {
    /// Required fields were absent; the default field order was used instead
    MissingRequired(Vec<String>),
    /// Columns outside the schema; they become custom fields
    UnknownFields(Vec<String>),
}

impl std::fmt::Display for HeaderWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderWarning::MissingRequired(fields) => {
                write!(f, "Missing required fields in header: {}", fields.join(", "))
            },
            HeaderWarning::UnknownFields(fields) => {
                write!(f, "Unknown fields in header: {}", fields.join(", "))
            },
        }
    }
}

/// Outcome of header resolution for a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHeader {
    pub header: Header,
    /// Whether row 0 was consumed as a header
    pub has_header: bool,
    /// Index of the first data row
    pub first_data_row: usize,
    pub warnings: Vec<HeaderWarning>,
}

/// Coarse type of a cell, used to tell a label row from a data row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Empty,
    Numeric,
    Date,
    Text,
}

impl CellKind {
    pub fn of(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() {
            CellKind::Empty
        } else if cell.parse::<f64>().is_ok_and(f64::is_finite) {
            CellKind::Numeric
        } else if looks_like_date(cell) {
            CellKind::Date
        } else {
            CellKind::Text
        }
    }
}

fn looks_like_date(cell: &str) -> bool {
    if DateFormat::ALL.iter().any(|f| f.parse(cell).is_some()) {
        return true;
    }
    // bare dates such as 2024-01-05 or 05/01/2024
    ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%m/%d/%Y"]
        .iter()
        .any(|p| chrono::NaiveDate::parse_from_str(cell, p).is_ok())
}

/// Decides whether the first row is a header and validates it
pub struct HeaderResolver<'a> {
    schema: &'a FieldSchema,
    logger: &'a ImportLogger,
}

impl<'a> HeaderResolver<'a> {
    pub fn new(schema: &'a FieldSchema, logger: &'a ImportLogger) -> Self {
        Self { schema, logger }
    }

    /// Whether `first` is a header row.
    ///
    /// A row holding both "Post Date" and "Title" verbatim is a header.
    /// Otherwise, with a second row to compare against, the first row is a
    /// header when some column holds text in the first row but a number or
    /// date in the second. Empty cells never count.
    pub fn detect(&self, first: &RawRow, second: Option<&RawRow>) -> bool {
        let has_marker = |name: &str| first.cells.iter().any(|c| c == name);
        if has_marker(FIELD_POST_DATE) && has_marker(FIELD_TITLE) {
            return true;
        }

        let Some(second) = second else {
            return false;
        };
        first
            .cells
            .iter()
            .zip(&second.cells)
            .any(|(a, b)| match (CellKind::of(a), CellKind::of(b)) {
                (CellKind::Empty, _) | (_, CellKind::Empty) => false,
                (CellKind::Text, kind) => kind != CellKind::Text,
                _ => false,
            })
    }

    /// Check an explicit header against the schema.
    ///
    /// When a required field is missing the whole header is replaced by the
    /// default field order. Unknown fields are reported and kept.
    pub fn validate(&self, cells: &[String]) -> (Header, Vec<HeaderWarning>) {
        let missing = self.schema.missing_required(cells);
        if !missing.is_empty() {
            let warning = HeaderWarning::MissingRequired(missing);
            self.logger.warning(warning.to_string());
            return (Header::new(self.schema.all_fields()), vec![warning]);
        }

        let mut warnings = Vec::new();
        let unknown = self.schema.unknown_fields(cells);
        if !unknown.is_empty() {
            let warning = HeaderWarning::UnknownFields(unknown);
            self.logger.warning(warning.to_string());
            warnings.push(warning);
        }

        (Header::new(cells.to_vec()), warnings)
    }

    /// Resolve the header for a batch of rows (must not be empty)
    pub fn resolve(&self, rows: &[RawRow]) -> ResolvedHeader {
        let has_header = match rows.first() {
            Some(first) => self.detect(first, rows.get(1)),
            None => false,
        };

        if has_header {
            let (header, warnings) = self.validate(&rows[0].cells);
            self.logger.debug(format!(
                "Header detected with {} columns: {}",
                header.len(),
                header.fields().join(", ")
            ));
            ResolvedHeader {
                header,
                has_header,
                first_data_row: 1,
                warnings,
            }
        } else {
            self.logger
                .debug("No header detected, using the default field order");
            ResolvedHeader {
                header: Header::new(self.schema.all_fields()),
                has_header,
                first_data_row: 0,
                warnings: Vec::new(),
            }
        }
    }
}
