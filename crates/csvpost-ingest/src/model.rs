//! Data passed between pipeline stages

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a post in the content store
pub type PostId = u64;

/// Identifier of a category in the content store
pub type CategoryId = u64;

/// One CSV row of trimmed cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line where the row starts in the source
    pub line: u64,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new(line: u64, cells: Vec<String>) -> Self {
        Self { line, cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Field names governing column-to-field mapping for a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header(Vec<String>);

impl Header {
    pub fn new(fields: Vec<String>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A mapped, not yet sanitized post draft
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Source line of the data row
    pub line: u64,
    /// Values of schema fields
    pub fields: BTreeMap<String, String>,
    /// Values of columns outside the schema
    pub custom_fields: BTreeMap<String, String>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Field value, treating absent and empty alike
    pub fn non_empty(&self, field: &str) -> Option<&str> {
        self.get(field).filter(|v| !v.is_empty())
    }
}

/// Publication state requested for imported posts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Scheduled for the post date
    #[default]
    Future,
}

/// Sanitized instruction to create one scheduled post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRequest {
    pub title: String,
    /// Content after rich HTML sanitizing
    pub content: String,
    pub status: PostStatus,
    pub author_id: Option<u64>,
    /// Wall clock time in the site time zone
    pub scheduled_local: NaiveDateTime,
    pub scheduled_utc: DateTime<Utc>,
    /// Slug exactly as given in the CSV
    pub category_slug: Option<String>,
    /// Resolved category, absent when resolution failed
    pub category_id: Option<CategoryId>,
    pub tags: Vec<String>,
    /// Sanitized metadata values by field name
    pub custom_field_values: BTreeMap<String, String>,
}
