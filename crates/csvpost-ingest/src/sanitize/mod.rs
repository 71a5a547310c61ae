//! Field value sanitizers
//!
//! - [`iframe`]: allow-list rebuild of embedded players
//! - [`url`](self::url): URL detection and cleaning
//! - [`html`]: plain text and post body cleaning used by the in-memory store
//!
//! [`FieldSanitizer`] picks the right one for a metadata value.

pub mod html;
pub mod iframe;
pub mod url;

pub use self::html::HtmlSanitizer;
pub use self::iframe::{contains_iframe, IframeSanitizer};
pub use self::url::{is_url, sanitize_url};

use crate::store::ContentStore;
use csvpost_common::Result;

/// How a metadata value was cleaned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Iframe,
    Url,
    Text,
}

impl FieldKind {
    pub fn classify(value: &str) -> Self {
        if contains_iframe(value) {
            FieldKind::Iframe
        } else if is_url(value) {
            FieldKind::Url
        } else {
            FieldKind::Text
        }
    }
}

/// Dispatches metadata values to the iframe, URL or text sanitizer
#[derive(Debug, Clone)]
pub struct FieldSanitizer {
    iframe: IframeSanitizer,
}

impl FieldSanitizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            iframe: IframeSanitizer::new()?,
        })
    }

    pub fn iframe(&self) -> &IframeSanitizer {
        &self.iframe
    }

    /// Clean a custom field value
    pub fn dispatch(&self, value: &str, store: &dyn ContentStore) -> String {
        match FieldKind::classify(value) {
            FieldKind::Iframe => self.iframe.sanitize(value),
            FieldKind::Url => store.validate_url(value),
            FieldKind::Text => store.sanitize_plain_text(value),
        }
    }
}

/// Escape text for use inside an element
pub(crate) fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for use inside a double-quoted attribute
pub(crate) fn escape_attribute(value: &str) -> String {
    escape_html(value).replace('"', "&quot;")
}
