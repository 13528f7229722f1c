//! Structured-content rendering engine.
//!
//! Authored pages are ordered [`Section`](domain::sections::Section)s holding
//! typed [`Element`](domain::sections::Element)s. Writes go through
//! [`prepare_sections`](application::normalize::prepare_sections); reads go
//! through [`render_sections`](application::render::render_sections), which
//! produces sanitized HTML plus the client scripts the page needs.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub mod util;
