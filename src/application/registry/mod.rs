//! Type-keyed renderer dispatch.
//!
//! A registry is constructed once at startup, shared read-mostly across
//! renders, and cloned when a caller needs to add types for itself.

mod builder;
mod metadata;
mod schema;

use std::{
    any::Any,
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, RwLock},
};

use metrics::counter;
use thiserror::Error;
use tracing::error;

use crate::{
    application::render::{RenderContext, RenderedFragment},
    domain::{definitions::normalize_type_key, sections::Element},
    util::lock::{rw_read, rw_write},
};

pub use builder::DescriptorBuilder;
pub use metadata::{ElementDescriptor, ElementMetadata, MetadataRegistry, Validator};
pub use schema::{FieldKind, SchemaField, SettingsSchema};

const TARGET: &str = "application::registry";

/// Renders one element into markup plus the script URLs it needs.
pub type Renderer =
    Arc<dyn Fn(&dyn RenderContext, &str, &Element) -> RenderedFragment + Send + Sync>;

/// Wrap a closure as a [`Renderer`].
pub fn renderer_fn<F>(render: F) -> Renderer
where
    F: Fn(&dyn RenderContext, &str, &Element) -> RenderedFragment + Send + Sync + 'static,
{
    Arc::new(render)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("element type must not be empty")]
    EmptyType,
    #[error("no renderer was provided for `{0}`")]
    MissingRenderer(String),
}

#[derive(Default)]
pub struct RendererRegistry {
    renderers: RwLock<HashMap<String, Renderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `renderer` under `element_type`, replacing any earlier entry.
    pub fn register(
        &self,
        element_type: &str,
        renderer: Renderer,
    ) -> Result<(), RegistrationError> {
        let key = normalize_type_key(element_type);
        if key.is_empty() {
            return Err(RegistrationError::EmptyType);
        }
        rw_write(&self.renderers, TARGET, "register").insert(key, renderer);
        Ok(())
    }

    /// Like [`register`](Self::register), but a panic inside the renderer
    /// yields an empty fragment instead of unwinding into the page render.
    pub fn register_safe(
        &self,
        element_type: &str,
        renderer: Renderer,
    ) -> Result<(), RegistrationError> {
        let key = normalize_type_key(element_type);
        if key.is_empty() {
            return Err(RegistrationError::EmptyType);
        }
        self.register(&key, isolate(key.clone(), renderer))
    }

    /// Case-insensitive lookup.
    pub fn get(&self, element_type: &str) -> Option<Renderer> {
        let key = normalize_type_key(element_type);
        rw_read(&self.renderers, TARGET, "get").get(&key).cloned()
    }

    pub fn contains(&self, element_type: &str) -> bool {
        self.get(element_type).is_some()
    }

    /// Registered type keys, sorted.
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = rw_read(&self.renderers, TARGET, "types")
            .keys()
            .cloned()
            .collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        rw_read(&self.renderers, TARGET, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Clone for RendererRegistry {
    fn clone(&self) -> Self {
        let snapshot = rw_read(&self.renderers, TARGET, "clone").clone();
        Self {
            renderers: RwLock::new(snapshot),
        }
    }
}

fn isolate(element_type: String, inner: Renderer) -> Renderer {
    renderer_fn(move |ctx, class_prefix, element| {
        match panic::catch_unwind(AssertUnwindSafe(|| inner(ctx, class_prefix, element))) {
            Ok(fragment) => fragment,
            Err(payload) => {
                error!(
                    target = TARGET,
                    element_type = %element_type,
                    element_id = %element.id,
                    panic = %panic_message(payload.as_ref()),
                    "Renderer panicked; substituting empty output"
                );
                counter!("tessera_renderer_panic_total").increment(1);
                RenderedFragment::empty()
            }
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
