//! Plain text and post body cleaning

use super::url::has_safe_scheme;
use super::{escape_attribute, escape_html};
use csvpost_common::Result;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Tags kept in post content
const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "caption", "cite", "code", "del", "div", "em",
    "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "ins", "li",
    "ol", "p", "pre", "q", "s", "span", "strong", "sub", "sup", "table", "tbody", "td", "tfoot",
    "th", "thead", "tr", "u", "ul",
];

/// Tags removed together with everything inside them
const DROPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "object", "embed"];

const VOID_TAGS: &[&str] = &["br", "hr", "img"];

const GLOBAL_ATTRIBUTES: &[&str] = &["class", "title", "id"];

fn attribute_allowed(tag: &str, attribute: &str) -> bool {
    if GLOBAL_ATTRIBUTES.contains(&attribute) {
        return true;
    }
    match tag {
        "a" => matches!(attribute, "href" | "rel" | "target"),
        "img" => matches!(attribute, "src" | "alt" | "width" | "height"),
        "td" | "th" => matches!(attribute, "colspan" | "rowspan"),
        "ol" => matches!(attribute, "start"),
        _ => false,
    }
}

/// Regex and tree based HTML cleaning
#[derive(Debug, Clone)]
pub struct HtmlSanitizer {
    script: Regex,
    style: Regex,
    tag: Regex,
    whitespace: Regex,
}

impl HtmlSanitizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            script: Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>")?,
            style: Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>")?,
            tag: Regex::new(r"<[^>]*>")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Strip all markup and collapse whitespace
    pub fn plain_text(&self, value: &str) -> String {
        let text = self.script.replace_all(value, "");
        let text = self.style.replace_all(&text, "");
        let text = self.tag.replace_all(&text, "");
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }

    /// Rebuild post content keeping only allow-listed tags and attributes
    pub fn rich_html(&self, value: &str) -> String {
        let fragment = Html::parse_fragment(value);
        let mut out = String::with_capacity(value.len());
        write_children(fragment.root_element(), &mut out);
        out
    }
}

fn write_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(child, out);
                }
            },
            _ => {},
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if DROPPED_TAGS.contains(&name) {
        return;
    }
    if !ALLOWED_TAGS.contains(&name) {
        // unwrap unknown tags but keep their content
        write_children(element, out);
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attribute, value) in element.value().attrs() {
        if !attribute_allowed(name, attribute) {
            continue;
        }
        if matches!(attribute, "href" | "src") && !has_safe_scheme(value) {
            continue;
        }
        out.push(' ');
        out.push_str(attribute);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }
    out.push('>');

    if VOID_TAGS.contains(&name) {
        return;
    }
    write_children(element, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}
