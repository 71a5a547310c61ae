//! CSV Post Ingest Library
//!
//! Turns CSV rows describing blog posts into scheduled post requests.
//!
//! # Pipeline
//!
//! - **Parser** ([`parser`]): CSV text or bytes into trimmed rows
//! - **Header** ([`header`]): header detection and validation
//! - **Mapper** ([`mapper`]): positional mapping onto schema fields
//! - **Sanitizer** ([`sanitize`]): iframe, URL and text cleaning
//! - **Builder** ([`builder`]): dates, categories, tags and metadata
//! - **Importer** ([`importer`]): batch orchestration against a [`store::ContentStore`]
//!
//! # Example
//!
//! ```no_run
//! use csvpost_common::config::ImportConfig;
//! use csvpost_ingest::importer::PostImporter;
//! use csvpost_ingest::store::MemoryStore;
//!
//! fn main() -> csvpost_common::Result<()> {
//!     let importer = PostImporter::new(ImportConfig::from_env()?, MemoryStore::new()?)?;
//!     let report = importer.import_text("Post Date,Title,Content\n2024-01-01 09:00,Hello,World")?;
//!     println!("{} ({} created)", report.summary_message(), report.created);
//!     Ok(())
//! }
//! ```
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod builder;
pub mod header;
pub mod importer;
pub mod mapper;
pub mod model;
pub mod parser;
pub mod sanitize;
pub mod schedule;
pub mod store;

pub use importer::{ImportReport, PostImporter, RowOutcome};
pub use store::{ContentStore, MemoryStore};
