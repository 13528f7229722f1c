//! Template composition shared by the rendering pipeline.

pub mod templates;

pub use templates::{TemplateError, TemplateSet, TemplateStore};
