//! Built-in element renderers.
//!
//! Every renderer reads its own keys from the element content and degrades
//! to empty output when they are missing or malformed.

mod media;
mod profile;
mod text;
mod widgets;

use serde::Deserialize;

use crate::{
    application::{
        registry::{ElementDescriptor, MetadataRegistry, RegistrationError},
        render::escape::{escape_html, safe_url},
    },
    domain::sections::Element,
};

/// Register every built-in element type, panic-isolated, with its metadata.
pub fn register_builtin_elements(registry: &MetadataRegistry) -> Result<(), RegistrationError> {
    let descriptors: Vec<ElementDescriptor> = [
        text::descriptors()?,
        media::descriptors()?,
        widgets::descriptors()?,
        profile::descriptors()?,
    ]
    .into_iter()
    .flatten()
    .collect();

    for descriptor in descriptors {
        registry.register_with_metadata(descriptor)?;
    }
    Ok(())
}

/// Outer wrapper shared by all built-in elements; empty inner markup renders nothing.
pub(crate) fn element_wrapper(class_prefix: &str, element: &Element, inner: &str) -> String {
    if inner.trim().is_empty() {
        return String::new();
    }
    let kind = escape_html(&element.element_type);
    format!(
        r#"<div class="{class_prefix}-element {class_prefix}-element--{kind}" data-element-id="{id}">{inner}</div>"#,
        id = escape_html(&element.id),
    )
}

/// A labelled link as stored in element content.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct LinkContent {
    pub label: Option<String>,
    pub url: Option<String>,
}

impl LinkContent {
    /// `<a>` markup, or `None` when the URL is missing or unsafe.
    pub(crate) fn anchor(&self, class: &str, fallback_label: &str) -> Option<String> {
        let href = self.url.as_deref().and_then(safe_url)?;
        let label = self
            .label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(fallback_label);
        Some(format!(
            r#"<a class="{class}" href="{}">{}</a>"#,
            escape_html(href),
            escape_html(label)
        ))
    }
}

/// Escape plain text and keep author line breaks.
pub(crate) fn escape_multiline(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .map(escape_html)
        .collect::<Vec<_>>()
        .join("<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::definitions::BUILTIN_ELEMENT_TYPES;
    use crate::domain::sections::ElementContent;

    #[test]
    fn every_builtin_type_is_registered_with_metadata() {
        let registry = MetadataRegistry::new();
        register_builtin_elements(&registry).expect("builtins");

        for (element_type, _) in BUILTIN_ELEMENT_TYPES {
            assert!(registry.get(element_type).is_some(), "{element_type}");
            assert!(registry.metadata(element_type).is_some(), "{element_type}");
        }
        assert_eq!(registry.list_metadata().len(), BUILTIN_ELEMENT_TYPES.len());
    }

    #[test]
    fn wrapper_skips_blank_markup() {
        let mut element = Element::new("quote", ElementContent::new());
        element.id = "e1".to_string();
        assert_eq!(element_wrapper("page", &element, "  "), "");
        assert_eq!(
            element_wrapper("page", &element, "<p>x</p>"),
            r#"<div class="page-element page-element--quote" data-element-id="e1"><p>x</p></div>"#
        );
    }

    #[test]
    fn link_rejects_script_urls() {
        let link = LinkContent {
            label: Some("Go".to_string()),
            url: Some("javascript:alert(1)".to_string()),
        };
        assert!(link.anchor("x", "Link").is_none());

        let link = LinkContent {
            label: None,
            url: Some("/about".to_string()),
        };
        assert_eq!(
            link.anchor("x", "Read more").as_deref(),
            Some(r#"<a class="x" href="/about">Read more</a>"#)
        );
    }

    #[test]
    fn multiline_text_is_escaped_per_line() {
        assert_eq!(escape_multiline("a <b>\nc"), "a &lt;b&gt;<br>c");
    }
}
