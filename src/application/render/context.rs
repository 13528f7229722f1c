use std::sync::Arc;

use crate::{
    application::{
        render::sanitizer::{HtmlSanitizer, shared_sanitizer},
        services::{ServiceProvider, Services},
    },
    presentation::templates::{TemplateError, TemplateSet, TemplateStore},
};

/// Everything a renderer may reach during one render call.
pub trait RenderContext: Send + Sync {
    /// Allow-list sanitize author-supplied rich text.
    fn sanitize_html(&self, html: &str) -> String;

    /// Private snapshot of the active template set.
    fn clone_templates(&self) -> Result<TemplateSet, TemplateError>;

    fn services(&self) -> &dyn ServiceProvider;
}

/// Default [`RenderContext`] wiring the shared sanitizer, template store and
/// collaborator provider. Cheap to clone per request.
#[derive(Clone)]
pub struct EngineContext {
    sanitizer: Arc<HtmlSanitizer>,
    templates: Arc<TemplateStore>,
    services: Arc<dyn ServiceProvider>,
}

impl EngineContext {
    pub fn new(templates: Arc<TemplateStore>, services: Arc<dyn ServiceProvider>) -> Self {
        Self {
            sanitizer: shared_sanitizer(),
            templates,
            services,
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: Arc<HtmlSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn templates(&self) -> &Arc<TemplateStore> {
        &self.templates
    }
}

impl Default for EngineContext {
    /// No templates loaded and no collaborators attached.
    fn default() -> Self {
        Self::new(Arc::new(TemplateStore::new()), Arc::new(Services::new()))
    }
}

impl RenderContext for EngineContext {
    fn sanitize_html(&self, html: &str) -> String {
        self.sanitizer.clean(html)
    }

    fn clone_templates(&self) -> Result<TemplateSet, TemplateError> {
        self.templates.clone_set()
    }

    fn services(&self) -> &dyn ServiceProvider {
        self.services.as_ref()
    }
}
