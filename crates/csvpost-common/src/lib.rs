//! CSV Post Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared configuration, logging and error handling for the CSV post import
//! workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`CsvPostError`] and the [`Result`] alias, with stable
//!   error codes for callers
//! - **Configuration**: [`config::ImportConfig`], the field schema and the site
//!   time zone
//! - **Logging**: tracing subscriber setup and the injected
//!   [`logging::ImportLogger`]
//!
//! # Example
//!
//! ```no_run
//! use csvpost_common::config::ImportConfig;
//! use csvpost_common::logging::ImportLogger;
//!
//! fn setup() -> csvpost_common::Result<(ImportConfig, ImportLogger)> {
//!     let config = ImportConfig::from_env()?;
//!     let logger = ImportLogger::from_settings(&config.log);
//!     Ok((config, logger))
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{CsvPostError, Result};
