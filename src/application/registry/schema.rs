//! Declarative settings schemas attached to element descriptors.
//!
//! The schema serializes for admin tooling and doubles as the first
//! validation pass over element content during normalization.

use serde::Serialize;
use serde_json::Value;

use crate::domain::sections::ElementContent;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    String {
        /// Rich-text fields are sanitized, plain ones escaped.
        rich_text: bool,
    },
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Boolean,
    Enum {
        options: Vec<String>,
    },
    Array {
        #[serde(skip_serializing_if = "Option::is_none")]
        items: Option<Box<FieldKind>>,
    },
}

impl FieldKind {
    fn check(&self, key: &str, value: &Value) -> Result<(), String> {
        match self {
            FieldKind::String { .. } => {
                if value.is_string() {
                    Ok(())
                } else {
                    Err(format!("`{key}` must be a string"))
                }
            }
            FieldKind::Number { min, max } => {
                let number = value
                    .as_f64()
                    .ok_or_else(|| format!("`{key}` must be a number"))?;
                if let Some(min) = min
                    && number < *min
                {
                    return Err(format!("`{key}` must be at least {min}"));
                }
                if let Some(max) = max
                    && number > *max
                {
                    return Err(format!("`{key}` must be at most {max}"));
                }
                Ok(())
            }
            FieldKind::Boolean => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(format!("`{key}` must be true or false"))
                }
            }
            FieldKind::Enum { options } => {
                let candidate = value
                    .as_str()
                    .map(str::trim)
                    .ok_or_else(|| format!("`{key}` must be one of: {}", options.join(", ")))?;
                if options
                    .iter()
                    .any(|option| option.eq_ignore_ascii_case(candidate))
                {
                    Ok(())
                } else {
                    Err(format!("`{key}` must be one of: {}", options.join(", ")))
                }
            }
            FieldKind::Array { items } => {
                let entries = value
                    .as_array()
                    .ok_or_else(|| format!("`{key}` must be a list"))?;
                if let Some(items) = items {
                    for (index, entry) in entries.iter().enumerate() {
                        items.check(&format!("{key}[{index}]"), entry)?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaField {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl SchemaField {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            required: false,
            help: None,
            default: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsSchema {
    pub fields: Vec<SchemaField>,
}

impl SettingsSchema {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, key: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|field| field.key == key)
    }

    /// Check required fields and the kind of every present field.
    ///
    /// Keys the schema does not declare are ignored.
    pub fn validate(&self, content: &ElementContent) -> Result<(), String> {
        for field in &self.fields {
            match content.get(&field.key) {
                Some(Value::String(text)) if field.required && text.trim().is_empty() => {
                    return Err(format!("`{}` is required", field.key));
                }
                Some(value) => field.kind.check(&field.key, value)?,
                None if field.required => {
                    return Err(format!("`{}` is required", field.key));
                }
                None => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> SettingsSchema {
        let mut text = SchemaField::new("text", "Text", FieldKind::String { rich_text: true });
        text.required = true;
        SettingsSchema {
            fields: vec![
                text,
                SchemaField::new(
                    "level",
                    "Level",
                    FieldKind::Number {
                        min: Some(2.0),
                        max: Some(6.0),
                    },
                ),
                SchemaField::new(
                    "align",
                    "Alignment",
                    FieldKind::Enum {
                        options: vec!["left".to_string(), "center".to_string()],
                    },
                ),
                SchemaField::new(
                    "items",
                    "Items",
                    FieldKind::Array {
                        items: Some(Box::new(FieldKind::String { rich_text: false })),
                    },
                ),
            ],
        }
    }

    #[test]
    fn accepts_conforming_content() {
        let content = ElementContent::from_value(json!({
            "text": "hello",
            "level": 3,
            "align": "CENTER",
            "items": ["a", "b"],
            "extra": {"ignored": true}
        }));
        assert_eq!(schema().validate(&content), Ok(()));
    }

    #[test]
    fn rejects_missing_or_blank_required_field() {
        let missing = ElementContent::from_value(json!({"level": 3}));
        assert_eq!(schema().validate(&missing), Err("`text` is required".to_string()));

        let blank = ElementContent::from_value(json!({"text": "  "}));
        assert!(schema().validate(&blank).is_err());
    }

    #[test]
    fn rejects_out_of_range_numbers_and_unknown_options() {
        let level = ElementContent::from_value(json!({"text": "x", "level": 9}));
        assert_eq!(
            schema().validate(&level),
            Err("`level` must be at most 6".to_string())
        );

        let align = ElementContent::from_value(json!({"text": "x", "align": "justify"}));
        assert!(schema().validate(&align).is_err());
    }

    #[test]
    fn checks_array_entries() {
        let content = ElementContent::from_value(json!({"text": "x", "items": ["a", 1]}));
        assert_eq!(
            schema().validate(&content),
            Err("`items[1]` must be a string".to_string())
        );
    }

    #[test]
    fn serializes_kind_inline() {
        let field = SchemaField::new("ordered", "Ordered", FieldKind::Boolean);
        let value = serde_json::to_value(&field).expect("serialize");
        assert_eq!(
            value,
            json!({"key": "ordered", "label": "Ordered", "type": "boolean", "required": false})
        );
    }
}
