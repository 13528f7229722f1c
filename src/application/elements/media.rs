use serde::Deserialize;

use super::element_wrapper;
use crate::{
    application::{
        registry::{DescriptorBuilder, ElementDescriptor, RegistrationError, renderer_fn},
        render::{
            RenderContext, RenderedFragment,
            escape::{escape_html, safe_url},
        },
    },
    domain::sections::{Element, ElementContent},
    util::bytes::format_file_size,
};

const DEFAULT_COLUMNS: i64 = 3;

pub(super) fn descriptors() -> Result<Vec<ElementDescriptor>, RegistrationError> {
    Ok(vec![
        DescriptorBuilder::new("image")
            .name("Image")
            .description("Single image with optional caption and link")
            .category("media")
            .icon("image")
            .string_field("src", "Image URL")
            .required()
            .string_field("alt", "Alternative text")
            .string_field("caption", "Caption")
            .string_field("link", "Link URL")
            .renderer(renderer_fn(render_image))
            .build()?,
        DescriptorBuilder::new("image_group")
            .name("Image group")
            .description("Gallery of images laid out in columns")
            .category("media")
            .icon("images")
            .array_field("images", "Images", None)
            .required()
            .number_field("columns", "Columns", Some(1.0), Some(6.0))
            .renderer(renderer_fn(render_image_group))
            .build()?,
        DescriptorBuilder::new("file_group")
            .name("File group")
            .description("Downloadable files")
            .category("media")
            .icon("paperclip")
            .string_field("title", "Title")
            .array_field("files", "Files", None)
            .required()
            .renderer(renderer_fn(render_file_group))
            .build()?,
    ])
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageContent {
    src: Option<String>,
    alt: Option<String>,
    caption: Option<String>,
    link: Option<String>,
}

impl ImageContent {
    fn figure(&self, class_prefix: &str) -> Option<String> {
        let src = self.src.as_deref().and_then(safe_url)?;
        let alt = self.alt.as_deref().map(str::trim).unwrap_or_default();
        let mut img = format!(
            r#"<img src="{}" alt="{}" loading="lazy">"#,
            escape_html(src),
            escape_html(alt)
        );
        if let Some(link) = self.link.as_deref().and_then(safe_url) {
            img = format!(r#"<a href="{}">{img}</a>"#, escape_html(link));
        }
        let caption = self
            .caption
            .as_deref()
            .map(str::trim)
            .filter(|caption| !caption.is_empty())
            .map(|caption| format!("<figcaption>{}</figcaption>", escape_html(caption)))
            .unwrap_or_default();

        Some(format!(
            r#"<figure class="{class_prefix}-image">{img}{caption}</figure>"#
        ))
    }
}

fn render_image(
    _ctx: &dyn RenderContext,
    class_prefix: &str,
    element: &Element,
) -> RenderedFragment {
    let figure = element
        .content
        .decode::<ImageContent>()
        .and_then(|image| image.figure(class_prefix))
        .unwrap_or_default();
    RenderedFragment::html(element_wrapper(class_prefix, element, &figure))
}

fn render_image_group(
    _ctx: &dyn RenderContext,
    class_prefix: &str,
    element: &Element,
) -> RenderedFragment {
    let figures: Vec<String> = element
        .content
        .object_list("images")
        .iter()
        .filter_map(ElementContent::decode::<ImageContent>)
        .filter_map(|image| image.figure(class_prefix))
        .collect();
    if figures.is_empty() {
        return RenderedFragment::empty();
    }

    let columns = element
        .content
        .i64("columns")
        .unwrap_or(DEFAULT_COLUMNS)
        .clamp(1, 6);
    let html = format!(
        r#"<div class="{class_prefix}-image-group {class_prefix}-image-group--cols-{columns}">{}</div>"#,
        figures.concat()
    );
    RenderedFragment::html(element_wrapper(class_prefix, element, &html))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileEntry {
    name: Option<String>,
    url: Option<String>,
    size: Option<u64>,
}

fn render_file_group(
    _ctx: &dyn RenderContext,
    class_prefix: &str,
    element: &Element,
) -> RenderedFragment {
    let items: Vec<String> = element
        .content
        .object_list("files")
        .iter()
        .filter_map(ElementContent::decode::<FileEntry>)
        .filter_map(|file| {
            let url = file.url.as_deref().and_then(safe_url)?;
            let name = file
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(url);
            let size = file
                .size
                .map(|bytes| {
                    format!(
                        r#" <span class="{class_prefix}-files__size">{}</span>"#,
                        format_file_size(bytes)
                    )
                })
                .unwrap_or_default();
            Some(format!(
                r#"<li class="{class_prefix}-files__item"><a href="{}" download>{}</a>{size}</li>"#,
                escape_html(url),
                escape_html(name)
            ))
        })
        .collect();
    if items.is_empty() {
        return RenderedFragment::empty();
    }

    let mut html = String::new();
    if let Some(title) = element.content.str("title") {
        html.push_str(&format!(
            r#"<p class="{class_prefix}-files__title">{}</p>"#,
            escape_html(title)
        ));
    }
    html.push_str(&format!(
        r#"<ul class="{class_prefix}-files">{}</ul>"#,
        items.concat()
    ));
    RenderedFragment::html(element_wrapper(class_prefix, element, &html))
}
