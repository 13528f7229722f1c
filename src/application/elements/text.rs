use comrak::{Options, markdown_to_html};

use super::{element_wrapper, escape_multiline};
use crate::{
    application::{
        registry::{
            DescriptorBuilder, ElementDescriptor, FieldKind, RegistrationError, renderer_fn,
        },
        render::{RenderContext, RenderedFragment, escape::escape_html},
    },
    domain::sections::Element,
};

const ALIGNMENTS: [&str; 3] = ["left", "center", "right"];

pub(super) fn descriptors() -> Result<Vec<ElementDescriptor>, RegistrationError> {
    Ok(vec![
        DescriptorBuilder::new("paragraph")
            .name("Paragraph")
            .description("Formatted body text")
            .icon("pilcrow")
            .rich_text_field("text", "Text")
            .required()
            .enum_field("align", "Alignment", &ALIGNMENTS)
            .renderer(renderer_fn(render_paragraph))
            .build()?,
        DescriptorBuilder::new("heading")
            .name("Heading")
            .description("Section sub-heading")
            .icon("heading")
            .string_field("text", "Text")
            .required()
            .number_field("level", "Level", Some(2.0), Some(6.0))
            .help("2 to 6; defaults to 2")
            .renderer(renderer_fn(render_heading))
            .build()?,
        DescriptorBuilder::new("markdown")
            .name("Markdown")
            .description("Markdown converted to sanitized HTML")
            .icon("markdown")
            .string_field("markdown", "Markdown")
            .required()
            .renderer(renderer_fn(render_markdown))
            .build()?,
        DescriptorBuilder::new("quote")
            .name("Quote")
            .description("Pull quote with optional attribution")
            .icon("quote")
            .string_field("text", "Quote")
            .required()
            .string_field("cite", "Attribution")
            .renderer(renderer_fn(render_quote))
            .build()?,
        DescriptorBuilder::new("list")
            .name("List")
            .description("Bulleted or numbered list")
            .icon("list")
            .string_field("title", "Title")
            .array_field("items", "Items", Some(FieldKind::String { rich_text: false }))
            .required()
            .boolean_field("ordered", "Numbered")
            .renderer(renderer_fn(render_list))
            .build()?,
    ])
}

fn render_paragraph(
    ctx: &dyn RenderContext,
    class_prefix: &str,
    element: &Element,
) -> RenderedFragment {
    let Some(text) = element.content.str("text") else {
        return RenderedFragment::empty();
    };
    let html = ctx.sanitize_html(text);

    let align = element
        .content
        .str("align")
        .map(str::to_ascii_lowercase)
        .filter(|align| ALIGNMENTS.contains(&align.as_str()));
    let class = match align {
        Some(align) => format!("{class_prefix}-paragraph {class_prefix}-paragraph--{align}"),
        None => format!("{class_prefix}-paragraph"),
    };

    RenderedFragment::html(element_wrapper(
        class_prefix,
        element,
        &format!(r#"<div class="{class}">{html}</div>"#),
    ))
}

fn render_heading(
    _ctx: &dyn RenderContext,
    class_prefix: &str,
    element: &Element,
) -> RenderedFragment {
    let Some(text) = element.content.str("text") else {
        return RenderedFragment::empty();
    };
    let level = element.content.i64("level").unwrap_or(2).clamp(2, 6);

    RenderedFragment::html(element_wrapper(
        class_prefix,
        element,
        &format!(
            r#"<h{level} class="{class_prefix}-heading">{}</h{level}>"#,
            escape_html(text)
        ),
    ))
}

fn render_markdown(
    ctx: &dyn RenderContext,
    class_prefix: &str,
    element: &Element,
) -> RenderedFragment {
    let Some(source) = element.content.str("markdown") else {
        return RenderedFragment::empty();
    };
    let html = ctx.sanitize_html(&markdown_to_html(source, &markdown_options()));

    RenderedFragment::html(element_wrapper(
        class_prefix,
        element,
        &format!(r#"<div class="{class_prefix}-markdown">{html}</div>"#),
    ))
}

fn markdown_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.superscript = true;
    options.extension.subscript = true;
    options.extension.underline = true;
    // Raw HTML passes through comrak and is filtered by the sanitizer.
    options.render.r#unsafe = true;
    options
}

fn render_quote(
    _ctx: &dyn RenderContext,
    class_prefix: &str,
    element: &Element,
) -> RenderedFragment {
    let Some(text) = element.content.str("text") else {
        return RenderedFragment::empty();
    };
    let caption = element
        .content
        .str("cite")
        .map(|cite| format!("<figcaption>{}</figcaption>", escape_html(cite)))
        .unwrap_or_default();

    RenderedFragment::html(element_wrapper(
        class_prefix,
        element,
        &format!(
            r#"<figure class="{class_prefix}-quote"><blockquote><p>{}</p></blockquote>{caption}</figure>"#,
            escape_multiline(text)
        ),
    ))
}

fn render_list(
    _ctx: &dyn RenderContext,
    class_prefix: &str,
    element: &Element,
) -> RenderedFragment {
    let items = element.content.string_list("items");
    if items.is_empty() {
        return RenderedFragment::empty();
    }
    let tag = if element.content.bool("ordered").unwrap_or(false) {
        "ol"
    } else {
        "ul"
    };

    let mut html = String::new();
    if let Some(title) = element.content.str("title") {
        html.push_str(&format!(
            r#"<p class="{class_prefix}-list__title">{}</p>"#,
            escape_html(title)
        ));
    }
    html.push_str(&format!(r#"<{tag} class="{class_prefix}-list">"#));
    for item in items {
        html.push_str(&format!("<li>{}</li>", escape_html(item)));
    }
    html.push_str(&format!("</{tag}>"));

    RenderedFragment::html(element_wrapper(class_prefix, element, &html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render::EngineContext;
    use crate::domain::sections::ElementContent;
    use serde_json::json;

    fn element(kind: &str, content: serde_json::Value) -> Element {
        let mut element = Element::new(kind, ElementContent::from_value(content));
        element.id = "el".to_string();
        element
    }

    #[test]
    fn paragraph_is_sanitized_not_escaped() {
        let ctx = EngineContext::default();
        let fragment = render_paragraph(
            &ctx,
            "page",
            &element(
                "paragraph",
                json!({"text": "<b>Hi</b><script>x</script>", "align": "Center"}),
            ),
        );
        assert_eq!(
            fragment.html,
            r#"<div class="page-element page-element--paragraph" data-element-id="el"><div class="page-paragraph page-paragraph--center"><b>Hi</b></div></div>"#
        );
        assert!(fragment.scripts.is_empty());
    }

    #[test]
    fn paragraph_without_text_is_empty() {
        let ctx = EngineContext::default();
        let fragment = render_paragraph(&ctx, "page", &element("paragraph", json!({"text": 42})));
        assert!(fragment.is_empty());
    }

    #[test]
    fn heading_clamps_level_and_escapes() {
        let ctx = EngineContext::default();
        let fragment = render_heading(
            &ctx,
            "post",
            &element("heading", json!({"text": "A & B", "level": 1})),
        );
        assert!(fragment.html.contains(r#"<h2 class="post-heading">A &amp; B</h2>"#));
    }

    #[test]
    fn heading_accepts_whole_float_levels() {
        let ctx = EngineContext::default();
        let fragment = render_heading(
            &ctx,
            "post",
            &element("heading", json!({"text": "Deep", "level": 3.0})),
        );
        assert!(fragment.html.contains(r#"<h3 class="post-heading">Deep</h3>"#));
    }

    #[test]
    fn markdown_is_converted_then_sanitized() {
        let ctx = EngineContext::default();
        let fragment = render_markdown(
            &ctx,
            "page",
            &element(
                "markdown",
                json!({"markdown": "**bold** <script>alert(1)</script>\n\n- one"}),
            ),
        );
        assert!(fragment.html.contains("<strong>bold</strong>"));
        assert!(fragment.html.contains("<li>one</li>"));
        assert!(!fragment.html.contains("<script"));
    }

    #[test]
    fn list_skips_non_string_items() {
        let ctx = EngineContext::default();
        let fragment = render_list(
            &ctx,
            "page",
            &element("list", json!({"items": ["a", 1, "<b>"], "ordered": true})),
        );
        assert!(
            fragment
                .html
                .contains(r#"<ol class="page-list"><li>a</li><li>&lt;b&gt;</li></ol>"#)
        );
    }

    #[test]
    fn quote_includes_attribution() {
        let ctx = EngineContext::default();
        let fragment = render_quote(
            &ctx,
            "page",
            &element("quote", json!({"text": "Less is more", "cite": "Mies"})),
        );
        assert!(fragment.html.contains(
            "<blockquote><p>Less is more</p></blockquote><figcaption>Mies</figcaption>"
        ));
    }
}
