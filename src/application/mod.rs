//! Element registry, normalization and rendering.

pub mod elements;
pub mod error;
pub mod normalize;
pub mod registry;
pub mod render;
pub mod services;
