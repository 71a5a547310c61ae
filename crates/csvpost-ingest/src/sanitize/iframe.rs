//! Iframe allow-list rebuild
//!
//! Embedded players arrive as raw (sometimes percent-encoded) HTML. The first
//! `<iframe>` element is rebuilt from scratch with a fixed set of attributes,
//! so nothing else from the source markup survives.

use super::escape_html;
use super::url::raw_url_decode;
use csvpost_common::Result;
use regex::Regex;
use scraper::{ElementRef, Html};

/// Attributes copied to the rebuilt iframe, in output order
pub const ALLOWED_ATTRIBUTES: [&str; 6] = [
    "width",
    "height",
    "src",
    "scrolling",
    "frameborder",
    "allowfullscreen",
];

// Exactly what `rebuild` emits: allow-listed attributes in order, quote-free
// values, frameborder 0/1 and a bare allowfullscreen.
const CANONICAL_PATTERN: &str = r#"^<iframe(?: width="[^"'\\<>]*")?(?: height="[^"'\\<>]*")?(?: src="[^"'\\<>]*")?(?: scrolling="[^"'\\<>]*")?(?: frameborder="[01]")?(?: allowfullscreen)?></iframe>$"#;

/// Whether the value contains an iframe tag (case-insensitive)
pub fn contains_iframe(value: &str) -> bool {
    value.to_ascii_lowercase().contains("<iframe")
}

#[derive(Debug, Clone)]
pub struct IframeSanitizer {
    canonical: Regex,
}

impl IframeSanitizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            canonical: Regex::new(CANONICAL_PATTERN)?,
        })
    }

    /// Whether the value is already a rebuilt iframe
    pub fn is_canonical(&self, value: &str) -> bool {
        self.canonical.is_match(value)
    }

    /// Rebuild the first iframe in `value`.
    ///
    /// Returns the value untouched when it is already canonical and an empty
    /// string when no iframe element can be found.
    pub fn sanitize(&self, value: &str) -> String {
        self.rebuild_first(value).unwrap_or_default()
    }

    /// Like [`sanitize`](Self::sanitize), but `None` when the value holds no
    /// iframe element.
    pub fn rebuild_first(&self, value: &str) -> Option<String> {
        if self.is_canonical(value) {
            return Some(value.to_string());
        }

        let decoded = raw_url_decode(value);
        let fragment = Html::parse_fragment(&decoded);
        let iframe = fragment
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "iframe")?;
        Some(rebuild(iframe))
    }
}

fn rebuild(iframe: ElementRef<'_>) -> String {
    let mut out = String::from("<iframe");
    for name in ALLOWED_ATTRIBUTES {
        let Some(raw) = iframe.value().attr(name) else {
            continue;
        };
        let value = match name {
            "allowfullscreen" => {
                out.push_str(" allowfullscreen");
                continue;
            },
            "frameborder" => match strip_quotes(raw).as_str() {
                "0" | "no" => "0".to_string(),
                _ => "1".to_string(),
            },
            "src" => strip_quotes(&raw_url_decode(raw)),
            _ => strip_quotes(raw),
        };
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_html(&value));
        out.push('"');
    }
    out.push_str("></iframe>");
    out
}

fn strip_quotes(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '\'' | '"' | '\\'))
        .collect()
}
