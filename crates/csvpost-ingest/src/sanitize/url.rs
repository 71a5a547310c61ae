//! URL detection and cleaning

use url::Url;

/// Schemes a URL field may keep
pub const ALLOWED_SCHEMES: [&str; 12] = [
    "http", "https", "ftp", "ftps", "mailto", "news", "irc", "gopher", "nntp", "feed", "telnet",
    "sms",
];

/// Percent-decode a value once. `+` is left alone.
pub fn raw_url_decode(value: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(value.as_bytes())).into_owned()
}

/// Whether the value is a syntactically valid absolute URL.
///
/// `note:remember this` parses as a URL with scheme `note`, so values
/// without a host only count when their scheme is one we would keep.
pub fn is_url(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    match Url::parse(value) {
        Ok(url) => url.has_host() || ALLOWED_SCHEMES.contains(&url.scheme()),
        Err(_) => false,
    }
}

/// Clean a URL for storage, returning an empty string when it is unusable
pub fn sanitize_url(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    match Url::parse(&cleaned) {
        Ok(url) if ALLOWED_SCHEMES.contains(&url.scheme()) => cleaned,
        _ => String::new(),
    }
}

/// Whether a link target is relative or uses an allowed scheme
pub fn has_safe_scheme(value: &str) -> bool {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    match cleaned.find(':') {
        // a colon after the first path, query or fragment delimiter is not a scheme separator
        Some(idx) if !cleaned[..idx].contains(['/', '?', '#']) => {
            let scheme = cleaned[..idx].to_ascii_lowercase();
            ALLOWED_SCHEMES.contains(&scheme.as_str())
        },
        _ => true,
    }
}
