//! CSV reader for pasted text and uploaded files
//!
//! Both input paths go through the same CSV-aware reader, so quoted cells may
//! contain delimiters, doubled quotes and line breaks wherever they come from.

use crate::model::RawRow;
use csv::{ReaderBuilder, Trim};
use csvpost_common::{CsvPostError, Result};
use std::io::Read;
use std::path::Path;

/// Parses CSV input into trimmed rows
#[derive(Debug, Clone, Default)]
pub struct CsvParser {
    /// Inputs larger than this are rejected
    max_bytes: Option<u64>,
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Parse a pasted CSV blob
    pub fn parse_str(&self, text: &str) -> Result<Vec<RawRow>> {
        self.check_size(text.len() as u64)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        self.read_rows(text.as_bytes())
    }

    /// Parse raw bytes, which must be UTF-8 (a leading BOM is dropped)
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Vec<RawRow>> {
        self.check_size(bytes.len() as u64)?;
        let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
        if had_errors {
            return Err(CsvPostError::Format(
                "CSV content is not valid UTF-8".to_string(),
            ));
        }
        self.read_rows(text.as_bytes())
    }

    /// Parse everything a reader yields
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<Vec<RawRow>> {
        let mut bytes = Vec::new();
        match self.max_bytes {
            // one byte past the limit is enough to know it was exceeded
            Some(max) => reader.take(max.saturating_add(1)).read_to_end(&mut bytes)?,
            None => {
                let mut reader = reader;
                reader.read_to_end(&mut bytes)?
            },
        };
        self.parse_bytes(&bytes)
    }

    /// Parse a CSV file; fails with an IO error when it cannot be opened
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Vec<RawRow>> {
        let file = std::fs::File::open(path.as_ref())?;
        self.check_size(file.metadata()?.len())?;
        self.parse_reader(file)
    }

    fn check_size(&self, size: u64) -> Result<()> {
        match self.max_bytes {
            Some(max) if size > max => Err(CsvPostError::InputTooLarge { size, max }),
            _ => Ok(()),
        }
    }

    fn read_rows(&self, data: &[u8]) -> Result<Vec<RawRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // column counts are checked against the header later
            .trim(Trim::All)
            .from_reader(data);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(csv_error)?;
            // rows of nothing but empty cells carry no data
            if record.iter().all(str::is_empty) {
                continue;
            }
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            rows.push(RawRow::new(line, record.iter().map(str::to_string).collect()));
        }

        Ok(rows)
    }
}

fn csv_error(err: csv::Error) -> CsvPostError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => CsvPostError::Io(e),
        _ => CsvPostError::Format(message),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cells(rows: &[RawRow]) -> Vec<Vec<&str>> {
        rows.iter()
            .map(|r| r.cells.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_parse_str_trims_cells() {
        let rows = CsvParser::new()
            .parse_str("Post Date , Title,Content\n 2024-01-01 09:00,Hello ,  World  ")
            .unwrap();
        assert_eq!(
            cells(&rows),
            vec![
                vec!["Post Date", "Title", "Content"],
                vec!["2024-01-01 09:00", "Hello", "World"],
            ]
        );
        assert_eq!(rows[0].line, 1);
        assert_eq!(rows[1].line, 2);
    }

    #[test]
    fn test_quoted_cells_keep_commas_quotes_and_newlines() {
        let text = "a,\"b, c\",\"say \"\"hi\"\"\"\n\"multi\nline\",x,y\n";
        let rows = CsvParser::new().parse_str(text).unwrap();
        assert_eq!(
            cells(&rows),
            vec![vec!["a", "b, c", "say \"hi\""], vec!["multi\nline", "x", "y"]]
        );
        assert_eq!(rows[1].line, 2);
    }

    #[test]
    fn test_ragged_rows_are_kept_and_blank_rows_skipped() {
        let rows = CsvParser::new().parse_str("a,b,c\n\n,,\nd,e\n").unwrap();
        assert_eq!(cells(&rows), vec![vec!["a", "b", "c"], vec!["d", "e"]]);
        assert_eq!(rows[1].line, 4);
    }

    #[test]
    fn test_parse_bytes_strips_bom() {
        let rows = CsvParser::new()
            .parse_bytes(b"\xEF\xBB\xBFPost Date,Title\n")
            .unwrap();
        assert_eq!(cells(&rows), vec![vec!["Post Date", "Title"]]);
    }

    #[test]
    fn test_invalid_utf8_is_a_format_error() {
        let err = CsvParser::new().parse_bytes(b"Title\n\xFF\xFE\xFD").unwrap_err();
        assert!(matches!(err, CsvPostError::Format(_)));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = CsvParser::new()
            .parse_file("/definitely/not/here.csv")
            .unwrap_err();
        assert!(matches!(err, CsvPostError::Io(_)));
    }

    #[test]
    fn test_parse_file_reads_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Post Date,Title,Content").unwrap();
        writeln!(file, "2024-01-01 09:00,\"Hello, again\",World").unwrap();

        let rows = CsvParser::new().parse_file(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].cells[1], "Hello, again");
    }

    #[test]
    fn test_size_limit() {
        let parser = CsvParser::new().with_max_bytes(8);
        let err = parser.parse_str("Title,Content\n").unwrap_err();
        assert!(matches!(err, CsvPostError::InputTooLarge { size: 14, max: 8 }));

        let err = parser
            .parse_reader(std::io::Cursor::new(vec![b'a'; 64]))
            .unwrap_err();
        assert!(matches!(err, CsvPostError::InputTooLarge { size: 9, max: 8 }));
    }
}
