//! Escaping for plain-text fields and URL vetting for author-supplied links.

use url::Url;

const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "mailto", "tel"];

/// Escape text for use in element content or a quoted attribute value.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Accept relative links and `http`, `https`, `mailto`, `tel` URLs; reject everything else.
pub fn safe_url(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_control) {
        return None;
    }

    if is_relative(trimmed) {
        return Some(trimmed);
    }

    match Url::parse(trimmed) {
        Ok(parsed) if ALLOWED_SCHEMES.contains(&parsed.scheme()) => Some(trimmed),
        _ => None,
    }
}

fn is_relative(href: &str) -> bool {
    if href.starts_with("//") {
        return false;
    }
    if href.starts_with('/')
        || href.starts_with("./")
        || href.starts_with("../")
        || href.starts_with('#')
        || href.starts_with('?')
    {
        return true;
    }
    match href.find(':') {
        None => true,
        // A colon after the first path separator is not a scheme delimiter.
        Some(colon) => href[..colon].contains(['/', '?', '#']),
    }
}

/// Reduce a class prefix to CSS-safe characters, defaulting to `page`.
pub fn normalize_class_prefix(prefix: &str) -> String {
    let cleaned: String = prefix
        .trim()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_')
        .collect::<String>()
        .to_ascii_lowercase();
    if cleaned.is_empty() {
        "page".to_string()
    } else {
        cleaned
    }
}

/// `value` when it is a single CSS class made of ASCII letters, digits, `-` or `_`.
pub fn css_class_token(value: &str) -> Option<&str> {
    let value = value.trim();
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    valid.then_some(value)
}
