//! Allow-list sanitization for rich-text element fields.

use std::{borrow::Cow, collections::HashSet, sync::Arc};

use ammonia::Builder as AmmoniaBuilder;
use once_cell::sync::Lazy;

/// Presentation attributes accepted on every allowed tag.
const GLOBAL_ATTRIBUTES: [&str; 6] = ["class", "style", "title", "align", "lang", "dir"];

/// Ammonia-backed sanitizer applied to every author-supplied HTML fragment.
pub struct HtmlSanitizer {
    builder: AmmoniaBuilder<'static>,
}

impl HtmlSanitizer {
    pub fn new() -> Self {
        Self {
            builder: build_rich_text_policy(),
        }
    }

    pub fn clean(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }
}

impl Default for HtmlSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

static SHARED_SANITIZER: Lazy<Arc<HtmlSanitizer>> = Lazy::new(|| Arc::new(HtmlSanitizer::new()));

/// Process-wide sanitizer, built on first use.
pub fn shared_sanitizer() -> Arc<HtmlSanitizer> {
    Arc::clone(&SHARED_SANITIZER)
}

fn build_rich_text_policy() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "abbr",
        "b",
        "blockquote",
        "br",
        "caption",
        "cite",
        "code",
        "dd",
        "del",
        "div",
        "dl",
        "dt",
        "em",
        "figcaption",
        "figure",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "i",
        "img",
        "ins",
        "kbd",
        "li",
        "mark",
        "ol",
        "p",
        "pre",
        "q",
        "s",
        "small",
        "span",
        "strong",
        "sub",
        "sup",
        "table",
        "tbody",
        "td",
        "tfoot",
        "th",
        "thead",
        "tr",
        "u",
        "ul",
    ]);
    builder.tags(tags);
    builder.generic_attributes(HashSet::from(GLOBAL_ATTRIBUTES));

    builder.add_tag_attributes("a", &["href", "target"]);
    builder.add_tag_attributes(
        "img",
        &["src", "alt", "width", "height", "loading", "decoding"],
    );
    builder.add_tag_attributes("ol", &["start", "reversed"]);
    builder.add_tag_attributes("th", &["colspan", "rowspan", "scope"]);
    builder.add_tag_attributes("td", &["colspan", "rowspan"]);
    builder.add_tag_attributes("blockquote", &["cite"]);

    builder.url_schemes(HashSet::from(["http", "https", "mailto", "tel"]));

    builder.attribute_filter(|_element, attribute, value| {
        if attribute.eq_ignore_ascii_case("style") {
            sanitize_style_attribute(value).map(Cow::Owned)
        } else {
            Some(Cow::Borrowed(value))
        }
    });

    builder
}

fn sanitize_style_attribute(value: &str) -> Option<String> {
    let sanitized: Vec<&str> = value
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty() && is_safe_style_declaration(decl))
        .collect();

    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized.join("; "))
    }
}

fn is_safe_style_declaration(decl: &str) -> bool {
    const FORBIDDEN: [&str; 8] = [
        "expression(",
        "javascript:",
        "vbscript:",
        "-moz-binding",
        "behavior:",
        "behaviour:",
        "@import",
        "url(",
    ];

    let lower = decl.to_ascii_lowercase();
    !FORBIDDEN.iter().any(|needle| lower.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_but_keeps_formatting() {
        let sanitizer = HtmlSanitizer::new();
        assert_eq!(sanitizer.clean("<b>Hi</b><script>x</script>"), "<b>Hi</b>");
    }

    #[test]
    fn keeps_presentation_attributes_globally() {
        let sanitizer = HtmlSanitizer::new();
        let html = sanitizer.clean(r#"<p class="lead" align="center" onclick="x()">Hi</p>"#);
        assert!(html.contains(r#"class="lead""#));
        assert!(html.contains(r#"align="center""#));
        assert!(!html.contains("onclick"));
    }

    #[test]
    fn filters_unsafe_style_declarations() {
        let sanitizer = HtmlSanitizer::new();
        let html = sanitizer.clean(
            r#"<span style="color: red; background: url('javascript:alert(1)')">x</span>"#,
        );
        assert!(html.contains(r#"style="color: red""#));
        assert!(!html.contains("javascript"));
    }

    #[test]
    fn drops_javascript_links() {
        let sanitizer = HtmlSanitizer::new();
        let html = sanitizer.clean(r#"<a href="javascript:alert(1)">x</a>"#);
        assert!(!html.contains("javascript"));
    }

    #[test]
    fn shared_sanitizer_is_built_once() {
        assert!(Arc::ptr_eq(&shared_sanitizer(), &shared_sanitizer()));
    }

    #[test]
    fn style_attribute_dropped_when_only_unsafe() {
        assert!(sanitize_style_attribute("behavior: url(x.htc)").is_none());
        assert_eq!(
            sanitize_style_attribute("color: red; padding: 4px;").as_deref(),
            Some("color: red; padding: 4px")
        );
    }
}
