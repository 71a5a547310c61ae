//! Positional mapping of rows onto header fields

use crate::model::{Header, RawRow, Record};
use crate::sanitize::{contains_iframe, IframeSanitizer};
use csvpost_common::config::FieldSchema;
use csvpost_common::logging::ImportLogger;
use csvpost_common::{CsvPostError, Result};

/// Zips data rows with the header into records
pub struct RowMapper<'a> {
    schema: &'a FieldSchema,
    iframe: &'a IframeSanitizer,
    logger: &'a ImportLogger,
}

impl<'a> RowMapper<'a> {
    pub fn new(schema: &'a FieldSchema, iframe: &'a IframeSanitizer, logger: &'a ImportLogger) -> Self {
        Self {
            schema,
            iframe,
            logger,
        }
    }

    /// Map one row. The row must have exactly one cell per header field.
    pub fn map(&self, header: &Header, row: &RawRow) -> Result<Record> {
        if row.len() != header.len() {
            return Err(CsvPostError::ColumnCount {
                line: row.line,
                expected: header.len(),
                actual: row.len(),
            });
        }

        let mut record = Record {
            line: row.line,
            ..Record::default()
        };
        for (name, cell) in header.fields().iter().zip(&row.cells) {
            // cells that only mention "<iframe" are kept as typed
            let value = if contains_iframe(cell) {
                self.iframe
                    .rebuild_first(cell)
                    .unwrap_or_else(|| cell.clone())
            } else {
                cell.clone()
            };

            if self.schema.is_known(name) {
                record.fields.insert(name.clone(), value);
            } else {
                record.custom_fields.insert(name.clone(), value);
            }
        }

        self.logger.debug(format!(
            "Mapped line {}: {} fields, {} custom fields",
            row.line,
            record.fields.len(),
            record.custom_fields.len()
        ));
        Ok(record)
    }

    /// Map every row, stopping at the first column count mismatch
    pub fn map_all(&self, header: &Header, rows: &[RawRow]) -> Result<Vec<Record>> {
        rows.iter().map(|row| self.map(header, row)).collect()
    }
}
