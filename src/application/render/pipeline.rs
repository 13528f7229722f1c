//! Read-time rendering of normalized sections.
//!
//! Nothing in here fails: a broken element, an absent collaborator or a bad
//! card template degrades to an empty or placeholder fragment for that block
//! only, and is logged with the section and element identifiers.

use metrics::counter;
use tracing::{debug, warn};

use super::{
    RenderContext, RenderedContent, RenderedFragment,
    escape::{css_class_token, escape_html, normalize_class_prefix, safe_url},
    live,
    scripts::ScriptList,
};
use crate::{
    application::{registry::RendererRegistry, services::Feature},
    domain::{
        definitions::normalize_type_key,
        sections::{
            Element, SECTION_CATEGORIES_LIST, SECTION_COURSES_LIST, SECTION_GRID, SECTION_HERO,
            SECTION_POSTS_LIST, Section,
        },
    },
};

const TARGET: &str = "application::render::pipeline";

/// Render `sections` in order into one HTML fragment plus de-duplicated scripts.
pub fn render_sections(
    sections: &[Section],
    class_prefix: &str,
    ctx: &dyn RenderContext,
    registry: &RendererRegistry,
) -> RenderedContent {
    let prefix = normalize_class_prefix(class_prefix);
    let mut html = String::new();
    let mut scripts = ScriptList::new();

    for section in sections {
        let section_type = normalize_type_key(&section.section_type);

        if let Some(feature) = required_feature(&section_type)
            && !ctx.services().is_enabled(feature)
        {
            debug!(
                target = TARGET,
                section_id = %section.id,
                section_type = %section_type,
                feature = feature.as_str(),
                "Skipping section for disabled feature"
            );
            continue;
        }

        let body = match section_type.as_str() {
            SECTION_HERO => RenderedFragment::empty(),
            SECTION_POSTS_LIST => live::render_posts(section, &prefix, ctx),
            SECTION_CATEGORIES_LIST => live::render_categories(section, &prefix, ctx),
            SECTION_COURSES_LIST => live::render_courses(section, &prefix, ctx),
            SECTION_GRID => render_grid(section, &prefix, ctx, registry),
            _ => render_elements(section, &prefix, ctx, registry),
        };

        html.push_str(&open_section(section, &section_type, &prefix, ctx));
        html.push_str(&body.html);
        html.push_str("</section>");
        scripts.extend(body.scripts);
        counter!("tessera_render_sections_total").increment(1);
    }

    RenderedContent {
        html,
        scripts: scripts.into_vec(),
    }
}

fn required_feature(section_type: &str) -> Option<Feature> {
    match section_type {
        SECTION_POSTS_LIST | SECTION_CATEGORIES_LIST => Some(Feature::Blog),
        SECTION_COURSES_LIST => Some(Feature::Courses),
        _ => None,
    }
}

fn open_section(
    section: &Section,
    section_type: &str,
    prefix: &str,
    ctx: &dyn RenderContext,
) -> String {
    let type_class = css_class_token(section_type).unwrap_or("unknown");
    let mut classes = vec![
        format!("{prefix}-section"),
        format!("{prefix}-section--{type_class}"),
    ];
    if let Some(themes) = ctx.services().themes() {
        classes.extend(
            themes
                .section_classes(section_type)
                .iter()
                .filter_map(|class| css_class_token(class))
                .map(str::to_string),
        );
    }
    if let Some(padding) = section.padding_vertical {
        classes.push(format!("{prefix}-section--py-{padding}"));
    }
    if let Some(margin) = section.margin_vertical {
        classes.push(format!("{prefix}-section--my-{margin}"));
    }

    let mut html = format!(
        r#"<section id="section-{}" class="{}" data-section-type="{}">"#,
        escape_html(&section.id),
        classes.join(" "),
        escape_html(section_type)
    );
    if let Some(title) = section.display_title() {
        html.push_str(&format!(
            r#"<h2 class="{prefix}-section__title">{}</h2>"#,
            escape_html(title)
        ));
    }
    if let Some(image) = section.display_image().and_then(safe_url) {
        html.push_str(&format!(
            r#"<img class="{prefix}-section__image" src="{}" alt="" loading="lazy">"#,
            escape_html(image)
        ));
    }
    html
}

/// Dispatch one element, degrading to an empty fragment when no renderer exists.
fn render_element(
    section: &Section,
    element: &Element,
    prefix: &str,
    ctx: &dyn RenderContext,
    registry: &RendererRegistry,
) -> RenderedFragment {
    match registry.get(&element.element_type) {
        Some(renderer) => renderer(ctx, prefix, element),
        None => {
            warn!(
                target = TARGET,
                section_id = %section.id,
                section_type = %section.section_type,
                element_id = %element.id,
                element_type = %element.element_type,
                "No renderer registered for element type"
            );
            counter!("tessera_render_degraded_total", "reason" => "missing_renderer")
                .increment(1);
            RenderedFragment::empty()
        }
    }
}

fn render_elements(
    section: &Section,
    prefix: &str,
    ctx: &dyn RenderContext,
    registry: &RendererRegistry,
) -> RenderedFragment {
    let mut fragment = RenderedFragment::empty();
    for element in &section.elements {
        let rendered = render_element(section, element, prefix, ctx, registry);
        fragment.html.push_str(&rendered.html);
        fragment.scripts.extend(rendered.scripts);
    }
    fragment
}

fn render_grid(
    section: &Section,
    prefix: &str,
    ctx: &dyn RenderContext,
    registry: &RendererRegistry,
) -> RenderedFragment {
    let item_class = if section.styles_grid_items() {
        format!("{prefix}-grid__item {prefix}-grid__item--styled")
    } else {
        format!("{prefix}-grid__item")
    };

    let mut fragment = RenderedFragment::empty();
    let mut opened = false;
    for element in &section.elements {
        let rendered = render_element(section, element, prefix, ctx, registry);
        fragment.scripts.extend(rendered.scripts);
        if rendered.html.trim().is_empty() {
            continue;
        }
        if !opened {
            fragment
                .html
                .push_str(&format!(r#"<div class="{prefix}-grid">"#));
            opened = true;
        }
        fragment.html.push_str(&format!(
            r#"<div class="{item_class}">{}</div>"#,
            rendered.html
        ));
    }
    if opened {
        fragment.html.push_str("</div>");
    }
    fragment
}
