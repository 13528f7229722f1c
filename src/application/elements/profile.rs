use serde::Deserialize;

use super::{LinkContent, element_wrapper};
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

pub(super) fn descriptors() -> Result<Vec<ElementDescriptor>, RegistrationError> {
    Ok(vec![
        DescriptorBuilder::new("profile_bio")
            .name("Profile bio")
            .description("Author or instructor introduction")
            .category("profile")
            .icon("user")
            .string_field("name", "Name")
            .required()
            .string_field("role", "Role")
            .string_field("avatar", "Avatar URL")
            .rich_text_field("bio", "Biography")
            .renderer(renderer_fn(render_profile_bio))
            .build()?,
        DescriptorBuilder::new("profile_links")
            .name("Profile links")
            .description("Links to social profiles or personal sites")
            .category("profile")
            .icon("link")
            .array_field("links", "Links", None)
            .required()
            .renderer(renderer_fn(render_profile_links))
            .build()?,
    ])
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileBio {
    name: Option<String>,
    role: Option<String>,
    avatar: Option<String>,
    bio: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn render_profile_bio(
    ctx: &dyn RenderContext,
    class_prefix: &str,
    element: &Element,
) -> RenderedFragment {
    let Some(profile) = element.content.decode::<ProfileBio>() else {
        return RenderedFragment::empty();
    };
    let Some(name) = non_blank(&profile.name) else {
        return RenderedFragment::empty();
    };

    let mut html = format!(r#"<div class="{class_prefix}-profile">"#);
    if let Some(avatar) = profile.avatar.as_deref().and_then(safe_url) {
        html.push_str(&format!(
            r#"<img class="{class_prefix}-profile__avatar" src="{}" alt="{}" loading="lazy">"#,
            escape_html(avatar),
            escape_html(name)
        ));
    }
    html.push_str(&format!(
        r#"<p class="{class_prefix}-profile__name">{}</p>"#,
        escape_html(name)
    ));
    if let Some(role) = non_blank(&profile.role) {
        html.push_str(&format!(
            r#"<p class="{class_prefix}-profile__role">{}</p>"#,
            escape_html(role)
        ));
    }
    if let Some(bio) = non_blank(&profile.bio) {
        html.push_str(&format!(
            r#"<div class="{class_prefix}-profile__bio">{}</div>"#,
            ctx.sanitize_html(bio)
        ));
    }
    html.push_str("</div>");

    RenderedFragment::html(element_wrapper(class_prefix, element, &html))
}

fn render_profile_links(
    _ctx: &dyn RenderContext,
    class_prefix: &str,
    element: &Element,
) -> RenderedFragment {
    let link_class = format!("{class_prefix}-profile-links__link");
    let items: Vec<String> = element
        .content
        .object_list("links")
        .iter()
        .filter_map(|entry| entry.decode::<LinkContent>())
        .filter_map(|link| {
            let fallback = link.url.clone().unwrap_or_default();
            link.anchor(&link_class, fallback.trim())
        })
        .map(|anchor| format!("<li>{anchor}</li>"))
        .collect();
    if items.is_empty() {
        return RenderedFragment::empty();
    }

    let html = format!(
        r#"<ul class="{class_prefix}-profile-links">{}</ul>"#,
        items.concat()
    );
    RenderedFragment::html(element_wrapper(class_prefix, element, &html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render::EngineContext;
    use crate::domain::sections::ElementContent;
    use insta::assert_snapshot;
    use serde_json::json;

    fn element(kind: &str, content: serde_json::Value) -> Element {
        let mut element = Element::new(kind, ElementContent::from_value(content));
        element.id = "p1".to_string();
        element
    }

    #[test]
    fn bio_requires_name() {
        let ctx = EngineContext::default();
        let fragment = render_profile_bio(
            &ctx,
            "page",
            &element("profile_bio", json!({"role": "Editor"})),
        );
        assert!(fragment.is_empty());
    }

    #[test]
    fn bio_markup() {
        let ctx = EngineContext::default();
        let fragment = render_profile_bio(
            &ctx,
            "page",
            &element(
                "profile_bio",
                json!({
                    "name": "Ada",
                    "role": "Instructor",
                    "avatar": "/media/ada.jpg",
                    "bio": "<p>Writes <strong>notes</strong>.</p><iframe></iframe>"
                }),
            ),
        );
        assert_snapshot!(fragment.html, @r#"<div class="page-element page-element--profile_bio" data-element-id="p1"><div class="page-profile"><img class="page-profile__avatar" src="/media/ada.jpg" alt="Ada" loading="lazy"><p class="page-profile__name">Ada</p><p class="page-profile__role">Instructor</p><div class="page-profile__bio"><p>Writes <strong>notes</strong>.</p></div></div></div>"#);
    }

    #[test]
    fn links_drop_unsafe_urls_and_fall_back_to_url_label() {
        let ctx = EngineContext::default();
        let fragment = render_profile_links(
            &ctx,
            "page",
            &element(
                "profile_links",
                json!({"links": [
                    {"label": "Site", "url": "https://ada.example"},
                    {"url": "mailto:ada@example.com"},
                    {"label": "Bad", "url": "data:text/html,hi"}
                ]}),
            ),
        );
        assert!(fragment.html.contains(">Site</a>"));
        assert!(fragment.html.contains(">mailto:ada@example.com</a>"));
        assert!(!fragment.html.contains("Bad"));
    }
}
