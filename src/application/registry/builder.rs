use std::sync::Arc;

use serde_json::Value;

use super::{
    ElementDescriptor, ElementMetadata, FieldKind, RegistrationError, Renderer, SchemaField,
    SettingsSchema,
};
use crate::domain::{definitions::normalize_type_key, sections::ElementContent};

/// Fluent construction of an [`ElementDescriptor`].
///
/// Field modifiers such as [`required`](Self::required) apply to the most
/// recently added field.
pub struct DescriptorBuilder {
    element_type: String,
    name: Option<String>,
    description: String,
    category: String,
    icon: Option<String>,
    fields: Vec<SchemaField>,
    renderer: Option<Renderer>,
    validator: Option<super::Validator>,
    isolated: bool,
}

impl DescriptorBuilder {
    pub fn new(element_type: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            name: None,
            description: String::new(),
            category: "content".to_string(),
            icon: None,
            fields: Vec::new(),
            renderer: None,
            validator: None,
            isolated: true,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn field(mut self, key: &str, label: &str, kind: FieldKind) -> Self {
        self.fields.push(SchemaField::new(key, label, kind));
        self
    }

    pub fn string_field(self, key: &str, label: &str) -> Self {
        self.field(key, label, FieldKind::String { rich_text: false })
    }

    pub fn rich_text_field(self, key: &str, label: &str) -> Self {
        self.field(key, label, FieldKind::String { rich_text: true })
    }

    pub fn number_field(self, key: &str, label: &str, min: Option<f64>, max: Option<f64>) -> Self {
        self.field(key, label, FieldKind::Number { min, max })
    }

    pub fn boolean_field(self, key: &str, label: &str) -> Self {
        self.field(key, label, FieldKind::Boolean)
    }

    pub fn enum_field(self, key: &str, label: &str, options: &[&str]) -> Self {
        let options = options.iter().map(|option| option.to_string()).collect();
        self.field(key, label, FieldKind::Enum { options })
    }

    pub fn array_field(self, key: &str, label: &str, items: Option<FieldKind>) -> Self {
        self.field(
            key,
            label,
            FieldKind::Array {
                items: items.map(Box::new),
            },
        )
    }

    pub fn required(mut self) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.required = true;
        }
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.help = Some(help.into());
        }
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.default = Some(value);
        }
        self
    }

    pub fn renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&ElementContent) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Register the renderer without panic isolation.
    pub fn unisolated(mut self) -> Self {
        self.isolated = false;
        self
    }

    pub fn build(self) -> Result<ElementDescriptor, RegistrationError> {
        let element_type = normalize_type_key(&self.element_type);
        if element_type.is_empty() {
            return Err(RegistrationError::EmptyType);
        }
        let Some(renderer) = self.renderer else {
            return Err(RegistrationError::MissingRenderer(element_type));
        };

        let name = self.name.unwrap_or_else(|| element_type.clone());
        let schema = if self.fields.is_empty() {
            None
        } else {
            Some(SettingsSchema {
                fields: self.fields,
            })
        };

        Ok(ElementDescriptor {
            metadata: ElementMetadata {
                element_type,
                name,
                description: self.description,
                category: self.category,
                icon: self.icon,
            },
            schema,
            renderer: Some(renderer),
            validator: self.validator,
            isolated: self.isolated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::renderer_fn;
    use crate::application::render::RenderedFragment;

    fn noop() -> Renderer {
        renderer_fn(|_, _, _| RenderedFragment::empty())
    }

    #[test]
    fn build_requires_type_and_renderer() {
        assert_eq!(
            DescriptorBuilder::new(" ").renderer(noop()).build().unwrap_err(),
            RegistrationError::EmptyType
        );
        assert_eq!(
            DescriptorBuilder::new("Quote").build().unwrap_err(),
            RegistrationError::MissingRenderer("quote".to_string())
        );
    }

    #[test]
    fn modifiers_apply_to_last_field() {
        let descriptor = DescriptorBuilder::new("list")
            .string_field("title", "Title")
            .array_field("items", "Items", Some(FieldKind::String { rich_text: false }))
            .required()
            .help("One entry per line")
            .boolean_field("ordered", "Numbered")
            .default_value(Value::Bool(false))
            .renderer(noop())
            .build()
            .expect("descriptor");

        let schema = descriptor.schema.expect("schema");
        assert!(!schema.field("title").expect("title").required);
        let items = schema.field("items").expect("items");
        assert!(items.required);
        assert_eq!(items.help.as_deref(), Some("One entry per line"));
        assert_eq!(
            schema.field("ordered").and_then(|f| f.default.clone()),
            Some(Value::Bool(false))
        );
        assert_eq!(descriptor.metadata.name, "list");
        assert!(descriptor.isolated);
    }

    #[test]
    fn descriptor_without_fields_has_no_schema() {
        let descriptor = DescriptorBuilder::new("divider")
            .renderer(noop())
            .unisolated()
            .build()
            .expect("descriptor");
        assert!(descriptor.schema.is_none());
        assert!(!descriptor.isolated);
    }
}
