//! Batch orchestration
//!
//! One call imports one submission: parse, resolve the header, map every
//! row, then build and store posts row by row. Parse, header and mapping
//! failures abort the batch before anything is written. A row that fails to
//! build or store is logged and recorded, and the batch moves on.

use crate::builder::PostRequestBuilder;
use crate::header::{HeaderResolver, HeaderWarning, ResolvedHeader};
use crate::mapper::RowMapper;
use crate::model::{CategoryId, Header, PostId, RawRow, Record};
use crate::parser::CsvParser;
use crate::sanitize::FieldSanitizer;
use crate::store::ContentStore;
use csvpost_common::config::ImportConfig;
use csvpost_common::logging::ImportLogger;
use csvpost_common::{CsvPostError, Result};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

/// Where a batch came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputSource {
    /// Pasted CSV text
    Text,
    /// An uploaded or local file
    File { path: String },
    /// Bytes from a reader such as stdin
    Stream,
}

/// Result of one data row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Created {
        line: u64,
        post_id: PostId,
        category_id: Option<CategoryId>,
        /// Metadata values the store refused
        meta_failures: usize,
    },
    Failed {
        line: u64,
        code: String,
        message: String,
    },
}

impl RowOutcome {
    pub fn line(&self) -> u64 {
        match self {
            RowOutcome::Created { line, .. } | RowOutcome::Failed { line, .. } => *line,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, RowOutcome::Created { .. })
    }
}

/// Summary of an imported batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub source: InputSource,
    pub has_header: bool,
    /// Header the rows were mapped with
    pub header: Header,
    pub warnings: Vec<HeaderWarning>,
    pub rows: Vec<RowOutcome>,
    pub created: usize,
    pub failed: usize,
    pub meta_failures: usize,
}

impl ImportReport {
    fn new(source: InputSource, resolved: &ResolvedHeader) -> Self {
        Self {
            source,
            has_header: resolved.has_header,
            header: resolved.header.clone(),
            warnings: resolved.warnings.clone(),
            rows: Vec::new(),
            created: 0,
            failed: 0,
            meta_failures: 0,
        }
    }

    fn push(&mut self, outcome: RowOutcome) {
        match &outcome {
            RowOutcome::Created { meta_failures, .. } => {
                self.created += 1;
                self.meta_failures += meta_failures;
            },
            RowOutcome::Failed { .. } => self.failed += 1,
        }
        self.rows.push(outcome);
    }

    pub fn post_ids(&self) -> Vec<PostId> {
        self.rows
            .iter()
            .filter_map(|r| match r {
                RowOutcome::Created { post_id, .. } => Some(*post_id),
                RowOutcome::Failed { .. } => None,
            })
            .collect()
    }

    /// Whether every data row produced a post
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    /// Message shown to the submitter
    pub fn summary_message(&self) -> &'static str {
        match self.source {
            InputSource::File { .. } => "CSV file was successfully uploaded and processed.",
            InputSource::Text | InputSource::Stream => "CSV data was successfully processed.",
        }
    }
}

/// Imports CSV batches into a [`ContentStore`]
pub struct PostImporter<S: ContentStore> {
    config: ImportConfig,
    logger: ImportLogger,
    store: S,
    parser: CsvParser,
    sanitizer: FieldSanitizer,
}

impl<S: ContentStore> PostImporter<S> {
    /// Importer logging through the configured import log
    pub fn new(config: ImportConfig, store: S) -> Result<Self> {
        let logger = ImportLogger::from_settings(&config.log);
        Self::with_logger(config, store, logger)
    }

    pub fn with_logger(config: ImportConfig, store: S, logger: ImportLogger) -> Result<Self> {
        config.validate()?;
        let parser = CsvParser::new().with_max_bytes(config.max_input_bytes);
        Ok(Self {
            config,
            logger,
            store,
            parser,
            sanitizer: FieldSanitizer::new()?,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn logger(&self) -> &ImportLogger {
        &self.logger
    }

    /// Import pasted CSV text
    pub fn import_text(&self, text: &str) -> Result<ImportReport> {
        self.run(InputSource::Text, || self.parser.parse_str(text))
    }

    /// Import raw CSV bytes
    pub fn import_bytes(&self, bytes: &[u8]) -> Result<ImportReport> {
        self.run(InputSource::Stream, || self.parser.parse_bytes(bytes))
    }

    /// Import everything a reader yields
    pub fn import_reader<R: Read>(&self, reader: R) -> Result<ImportReport> {
        self.run(InputSource::Stream, || self.parser.parse_reader(reader))
    }

    /// Import a CSV file
    pub fn import_file(&self, path: impl AsRef<Path>) -> Result<ImportReport> {
        let path = path.as_ref();
        let source = InputSource::File {
            path: path.display().to_string(),
        };
        self.run(source, || self.parser.parse_file(path))
    }

    fn run<F>(&self, source: InputSource, parse: F) -> Result<ImportReport>
    where
        F: FnOnce() -> Result<Vec<RawRow>>,
    {
        self.process(source, parse).inspect_err(|e| {
            self.logger
                .error(format!("Error processing CSV data: {}", e));
        })
    }

    fn process<F>(&self, source: InputSource, parse: F) -> Result<ImportReport>
    where
        F: FnOnce() -> Result<Vec<RawRow>>,
    {
        let rows = parse()?;
        if rows.is_empty() {
            return Err(CsvPostError::NoData);
        }
        self.logger
            .debug(format!("Parsed {} CSV rows", rows.len()));

        let resolved = HeaderResolver::new(&self.config.schema, &self.logger).resolve(&rows);
        let records = RowMapper::new(&self.config.schema, self.sanitizer.iframe(), &self.logger)
            .map_all(&resolved.header, &rows[resolved.first_data_row..])?;

        let builder =
            PostRequestBuilder::new(&self.config, &self.sanitizer, &self.store, &self.logger);
        let mut report = ImportReport::new(source, &resolved);
        for record in &records {
            report.push(self.import_record(&builder, record));
        }

        self.logger.info(format!(
            "Import finished: {} created, {} failed",
            report.created, report.failed
        ));
        Ok(report)
    }

    fn import_record(&self, builder: &PostRequestBuilder<'_>, record: &Record) -> RowOutcome {
        match self.create_post(builder, record) {
            Ok((post_id, category_id, meta_failures)) => RowOutcome::Created {
                line: record.line,
                post_id,
                category_id,
                meta_failures,
            },
            Err(e) => {
                self.logger
                    .error(format!("Error creating post from line {}: {}", record.line, e));
                RowOutcome::Failed {
                    line: record.line,
                    code: e.code().to_string(),
                    message: e.to_string(),
                }
            },
        }
    }

    fn create_post(
        &self,
        builder: &PostRequestBuilder<'_>,
        record: &Record,
    ) -> Result<(PostId, Option<CategoryId>, usize)> {
        let request = builder.build(record)?;
        let post_id = self.store.create_post(&request)?;
        self.logger
            .info(format!("Post created successfully. ID: {}", post_id));

        let mut meta_failures = 0;
        for (key, value) in &request.custom_field_values {
            if let Err(e) = self.store.set_meta(post_id, key, value) {
                self.logger.error(format!(
                    "Error saving field '{}' for post {}: {}",
                    key, post_id, e
                ));
                meta_failures += 1;
            }
        }

        Ok((post_id, request.category_id, meta_failures))
    }
}
