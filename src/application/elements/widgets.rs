use serde::Deserialize;
use tracing::debug;

use super::{LinkContent, element_wrapper, escape_multiline};
use crate::{
    application::{
        registry::{DescriptorBuilder, ElementDescriptor, RegistrationError, renderer_fn},
        render::{
            RenderContext, RenderedFragment,
            escape::{escape_html, safe_url},
        },
    },
    domain::sections::Element,
};

const TARGET: &str = "application::elements::widgets";

pub(super) fn descriptors() -> Result<Vec<ElementDescriptor>, RegistrationError> {
    Ok(vec![
        DescriptorBuilder::new("search")
            .name("Search")
            .description("Site search box")
            .category("interactive")
            .icon("search")
            .string_field("placeholder", "Placeholder")
            .string_field("button_label", "Button label")
            .renderer(renderer_fn(render_search))
            .build()?,
        DescriptorBuilder::new("feature_item")
            .name("Feature item")
            .description("Icon, title and short text, usually inside a grid")
            .icon("star")
            .string_field("icon", "Icon")
            .string_field("title", "Title")
            .required()
            .rich_text_field("text", "Text")
            .renderer(renderer_fn(render_feature_item))
            .build()?,
        DescriptorBuilder::new("contact")
            .name("Contact")
            .description("Email, phone and postal address")
            .category("interactive")
            .icon("envelope")
            .string_field("email", "Email")
            .string_field("phone", "Phone")
            .string_field("address", "Address")
            .validator(|content| {
                if ["email", "phone", "address"]
                    .iter()
                    .any(|key| content.str(key).is_some())
                {
                    Ok(())
                } else {
                    Err("at least one of email, phone or address is required".to_string())
                }
            })
            .renderer(renderer_fn(render_contact))
            .build()?,
    ])
}

fn render_search(
    ctx: &dyn RenderContext,
    class_prefix: &str,
    element: &Element,
) -> RenderedFragment {
    let Some(search) = ctx.services().search() else {
        debug!(
            target = TARGET,
            element_id = %element.id,
            "Search collaborator absent; skipping search element"
        );
        return RenderedFragment::empty();
    };
    let Some(action) = safe_url(&search.action_url()).map(str::to_string) else {
        return RenderedFragment::empty();
    };

    let placeholder = element
        .content
        .str("placeholder")
        .map(str::to_string)
        .or_else(|| search.placeholder())
        .unwrap_or_else(|| "Search".to_string());
    let button = element.content.str("button_label").unwrap_or("Search");

    let html = format!(
        r#"<form class="{class_prefix}-search" action="{}" method="get" role="search"><input class="{class_prefix}-search__input" type="search" name="q" placeholder="{placeholder}" aria-label="{placeholder}"><button class="{class_prefix}-search__button" type="submit">{}</button></form>"#,
        escape_html(&action),
        escape_html(button),
        placeholder = escape_html(&placeholder),
    );
    RenderedFragment::html(element_wrapper(class_prefix, element, &html))
        .with_scripts(search.scripts())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeatureItem {
    icon: Option<String>,
    title: Option<String>,
    text: Option<String>,
    link: Option<LinkContent>,
}

fn render_feature_item(
    ctx: &dyn RenderContext,
    class_prefix: &str,
    element: &Element,
) -> RenderedFragment {
    let Some(item) = element.content.decode::<FeatureItem>() else {
        return RenderedFragment::empty();
    };
    let title = item.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let text = item.text.as_deref().map(str::trim).filter(|t| !t.is_empty());
    if title.is_none() && text.is_none() {
        return RenderedFragment::empty();
    }

    let mut html = format!(r#"<div class="{class_prefix}-feature">"#);
    if let Some(icon) = item.icon.as_deref().map(str::trim).filter(|i| !i.is_empty()) {
        html.push_str(&format!(
            r#"<span class="{class_prefix}-feature__icon" aria-hidden="true">{}</span>"#,
            escape_html(icon)
        ));
    }
    if let Some(title) = title {
        html.push_str(&format!(
            r#"<h3 class="{class_prefix}-feature__title">{}</h3>"#,
            escape_html(title)
        ));
    }
    if let Some(text) = text {
        html.push_str(&format!(
            r#"<div class="{class_prefix}-feature__text">{}</div>"#,
            ctx.sanitize_html(text)
        ));
    }
    if let Some(anchor) = item
        .link
        .as_ref()
        .and_then(|link| link.anchor(&format!("{class_prefix}-feature__link"), "Learn more"))
    {
        html.push_str(&anchor);
    }
    html.push_str("</div>");

    RenderedFragment::html(element_wrapper(class_prefix, element, &html))
}

fn render_contact(
    _ctx: &dyn RenderContext,
    class_prefix: &str,
    element: &Element,
) -> RenderedFragment {
    let mut rows = Vec::new();

    if let Some(email) = element
        .content
        .str("email")
        .filter(|email| email.contains('@'))
    {
        rows.push(format!(
            r#"<dt>Email</dt><dd><a href="mailto:{0}">{0}</a></dd>"#,
            escape_html(email)
        ));
    }
    if let Some(phone) = element.content.str("phone") {
        let dial: String = phone
            .chars()
            .filter(|ch| ch.is_ascii_digit() || *ch == '+')
            .collect();
        if !dial.is_empty() {
            rows.push(format!(
                r#"<dt>Phone</dt><dd><a href="tel:{}">{}</a></dd>"#,
                dial,
                escape_html(phone)
            ));
        }
    }
    if let Some(address) = element.content.str("address") {
        rows.push(format!(
            "<dt>Address</dt><dd><address>{}</address></dd>",
            escape_multiline(address)
        ));
    }
    if rows.is_empty() {
        return RenderedFragment::empty();
    }

    let html = format!(r#"<dl class="{class_prefix}-contact">{}</dl>"#, rows.concat());
    RenderedFragment::html(element_wrapper(class_prefix, element, &html))
}
