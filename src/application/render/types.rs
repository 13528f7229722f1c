use serde::Serialize;
use thiserror::Error;

use crate::presentation::templates::TemplateError;

/// Output of a single element or section renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedFragment {
    pub html: String,
    pub scripts: Vec<String>,
}

impl RenderedFragment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            scripts: Vec::new(),
        }
    }

    pub fn with_scripts<I, S>(mut self, scripts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scripts.extend(scripts.into_iter().map(Into::into));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty() && self.scripts.is_empty()
    }
}

/// Markup and ordered, de-duplicated script URLs for a whole section list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedContent {
    pub html: String,
    pub scripts: Vec<String>,
}

/// Conditions that abort a page render. Everything else degrades in place.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no template set is available: {0}")]
    NoTemplates(#[source] TemplateError),
    #[error("page template `{name}` is not defined")]
    MissingTemplate { name: String },
    #[error("page template `{name}` failed: {source}")]
    Template {
        name: String,
        #[source]
        source: TemplateError,
    },
}
