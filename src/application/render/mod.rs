//! Read-time rendering of normalized sections.
//!
//! [`render_sections`] is the degrade-in-place entry point used for content
//! fragments; [`render_page`] wraps it in a top-level theme template and is
//! the only call that can fail.

mod context;
pub mod escape;
mod live;
mod page;
mod pipeline;
mod sanitizer;
mod scripts;
mod types;

pub use context::{EngineContext, RenderContext};
pub use live::{CATEGORY_CARD_TEMPLATE, COURSE_CARD_TEMPLATE, POST_CARD_TEMPLATE};
pub use page::render_page;
pub use pipeline::render_sections;
pub use sanitizer::HtmlSanitizer;
pub use scripts::ScriptList;
pub use types::{RenderError, RenderedContent, RenderedFragment};
