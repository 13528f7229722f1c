use minijinja::{Value, context};
use serde::Serialize;
use tracing::error;

use super::{
    RenderContext, RenderError, escape::normalize_class_prefix, pipeline::render_sections,
};
use crate::{application::registry::RendererRegistry, domain::sections::Section};

const TARGET: &str = "application::render::page";

/// Render `sections` and splice them into the top-level template `template_name`.
///
/// Unlike [`render_sections`], this fails when no template set is loaded or
/// the page template does not exist; those are deployment defects, not
/// content problems. `extra` is exposed to the template as `page`.
pub fn render_page<S: Serialize>(
    template_name: &str,
    sections: &[Section],
    class_prefix: &str,
    ctx: &dyn RenderContext,
    registry: &RendererRegistry,
    extra: S,
) -> Result<String, RenderError> {
    let templates = ctx.clone_templates().map_err(|err| {
        error!(
            target = TARGET,
            template = template_name,
            error = %err,
            "No template set available for page render"
        );
        RenderError::NoTemplates(err)
    })?;

    if !templates.has_template(template_name) {
        error!(
            target = TARGET,
            template = template_name,
            theme = templates.theme(),
            "Page template is not defined"
        );
        return Err(RenderError::MissingTemplate {
            name: template_name.to_string(),
        });
    }

    let class_prefix = normalize_class_prefix(class_prefix);
    let content = render_sections(sections, &class_prefix, ctx, registry);
    templates
        .render(
            template_name,
            context! {
                content_html => Value::from_safe_string(content.html),
                scripts => content.scripts,
                class_prefix => &class_prefix,
                page => Value::from_serialize(&extra),
            },
        )
        .map_err(|source| {
            error!(
                target = TARGET,
                template = template_name,
                error = %source,
                "Page template failed to render"
            );
            RenderError::Template {
                name: template_name.to_string(),
                source,
            }
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::registry::renderer_fn;
    use crate::application::render::{EngineContext, RenderedFragment};
    use crate::application::services::Services;
    use crate::domain::sections::{Element, ElementContent};
    use crate::presentation::templates::{TemplateSet, TemplateStore};
    use serde_json::json;

    fn ctx_with(sources: &[(&str, &str)]) -> EngineContext {
        let set = TemplateSet::from_sources(
            "test",
            sources
                .iter()
                .map(|(name, source)| (name.to_string(), source.to_string())),
        )
        .expect("templates");
        EngineContext::new(
            Arc::new(TemplateStore::with_set(set)),
            Arc::new(Services::new()),
        )
    }

    fn registry() -> RendererRegistry {
        let registry = RendererRegistry::new();
        registry
            .register(
                "raw",
                renderer_fn(|_, _, _| {
                    RenderedFragment::html("<p>x</p>").with_scripts(["/a.js"])
                }),
            )
            .expect("register");
        registry
    }

    fn sections() -> Vec<Section> {
        vec![Section::new("standard").with_element(Element::new(
            "raw",
            ElementContent::from_value(json!({"k": 1})),
        ))]
    }

    #[test]
    fn splices_unescaped_content_and_scripts() {
        let ctx = ctx_with(&[(
            "page.html",
            concat!(
                "<title>{{ page.title }}</title>{{ content_html }}",
                "{% for s in scripts %}<script src=\"{{ s }}\"></script>{% endfor %}",
            ),
        )]);
        let html = render_page(
            "page.html",
            &sections(),
            "page",
            &ctx,
            &registry(),
            json!({"title": "Home & Away"}),
        )
        .expect("page");

        assert!(html.starts_with("<title>Home &amp; Away</title>"));
        assert!(html.contains("<p>x</p>"));
        assert_eq!(html.matches("a.js\"></script>").count(), 1);
    }

    #[test]
    fn page_and_sections_share_the_normalized_prefix() {
        let ctx = ctx_with(&[("page.html", "{{ class_prefix }}|{{ content_html }}")]);
        let html = render_page("page.html", &sections(), "Blog Page", &ctx, &registry(), ())
            .expect("page");

        assert!(html.starts_with("blogpage|"));
        assert!(html.contains(r#"class="blogpage-section blogpage-section--standard""#));
    }

    #[test]
    fn missing_template_set_is_fatal() {
        let ctx = EngineContext::default();
        let err = render_page("page.html", &sections(), "page", &ctx, &registry(), ())
            .expect_err("no templates");
        assert!(matches!(err, RenderError::NoTemplates(_)));
    }

    #[test]
    fn missing_page_template_is_fatal() {
        let ctx = ctx_with(&[("other.html", "x")]);
        let err = render_page("page.html", &sections(), "page", &ctx, &registry(), ())
            .expect_err("missing template");
        assert!(matches!(err, RenderError::MissingTemplate { ref name } if name == "page.html"));
    }
}
