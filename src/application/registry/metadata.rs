use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, RwLock},
};

use serde::Serialize;

use super::{RegistrationError, Renderer, RendererRegistry, SettingsSchema};
use crate::{
    domain::{definitions::normalize_type_key, sections::ElementContent},
    util::lock::{rw_read, rw_write},
};

const TARGET: &str = "application::registry::metadata";

/// Extra content check run after the schema passes.
pub type Validator = Arc<dyn Fn(&ElementContent) -> Result<(), String> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementMetadata {
    #[serde(rename = "type")]
    pub element_type: String,
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Clone, Serialize)]
pub struct ElementDescriptor {
    #[serde(flatten)]
    pub metadata: ElementMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SettingsSchema>,
    #[serde(skip)]
    pub renderer: Option<Renderer>,
    #[serde(skip)]
    pub validator: Option<Validator>,
    /// Register through [`RendererRegistry::register_safe`].
    #[serde(skip)]
    pub isolated: bool,
}

impl fmt::Debug for ElementDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementDescriptor")
            .field("metadata", &self.metadata)
            .field("schema", &self.schema)
            .field("has_renderer", &self.renderer.is_some())
            .field("has_validator", &self.validator.is_some())
            .field("isolated", &self.isolated)
            .finish()
    }
}

/// Renderer registry that also carries display metadata and settings schemas.
///
/// Descriptors sit behind their own lock so admin lookups never contend with
/// renderer lookups on the render path.
#[derive(Default)]
pub struct MetadataRegistry {
    renderers: RendererRegistry,
    descriptors: RwLock<HashMap<String, ElementDescriptor>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in element type.
    pub fn with_builtins() -> Result<Self, RegistrationError> {
        let registry = Self::new();
        crate::application::elements::register_builtin_elements(&registry)?;
        Ok(registry)
    }

    pub fn register_with_metadata(
        &self,
        mut descriptor: ElementDescriptor,
    ) -> Result<(), RegistrationError> {
        let key = normalize_type_key(&descriptor.metadata.element_type);
        if key.is_empty() {
            return Err(RegistrationError::EmptyType);
        }
        let renderer = descriptor
            .renderer
            .clone()
            .ok_or_else(|| RegistrationError::MissingRenderer(key.clone()))?;

        if descriptor.isolated {
            self.renderers.register_safe(&key, renderer)?;
        } else {
            self.renderers.register(&key, renderer)?;
        }

        descriptor.metadata.element_type = key.clone();
        rw_write(&self.descriptors, TARGET, "register_with_metadata").insert(key, descriptor);
        Ok(())
    }

    pub fn renderers(&self) -> &RendererRegistry {
        &self.renderers
    }

    pub fn get(&self, element_type: &str) -> Option<Renderer> {
        self.renderers.get(element_type)
    }

    pub fn descriptor(&self, element_type: &str) -> Option<ElementDescriptor> {
        let key = normalize_type_key(element_type);
        rw_read(&self.descriptors, TARGET, "descriptor")
            .get(&key)
            .cloned()
    }

    pub fn metadata(&self, element_type: &str) -> Option<ElementMetadata> {
        self.descriptor(element_type)
            .map(|descriptor| descriptor.metadata)
    }

    pub fn validator(&self, element_type: &str) -> Option<Validator> {
        self.descriptor(element_type)
            .and_then(|descriptor| descriptor.validator)
    }

    /// All descriptors, sorted by element type.
    pub fn list_metadata(&self) -> Vec<ElementDescriptor> {
        let mut descriptors: Vec<ElementDescriptor> =
            rw_read(&self.descriptors, TARGET, "list_metadata")
                .values()
                .cloned()
                .collect();
        descriptors.sort_by(|a, b| a.metadata.element_type.cmp(&b.metadata.element_type));
        descriptors
    }

    /// Run the schema and then the custom validator for `element_type`.
    ///
    /// Types registered without metadata pass unchecked.
    pub fn validate(&self, element_type: &str, content: &ElementContent) -> Result<(), String> {
        let Some(descriptor) = self.descriptor(element_type) else {
            return Ok(());
        };
        if let Some(schema) = &descriptor.schema {
            schema.validate(content)?;
        }
        if let Some(validator) = &descriptor.validator {
            validator(content)?;
        }
        Ok(())
    }
}

impl fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataRegistry")
            .field("types", &self.renderers.types())
            .finish()
    }
}

impl Clone for MetadataRegistry {
    fn clone(&self) -> Self {
        let descriptors = rw_read(&self.descriptors, TARGET, "clone").clone();
        Self {
            renderers: self.renderers.clone(),
            descriptors: RwLock::new(descriptors),
        }
    }
}
