//! Section and element content model.
//!
//! Sections are the visual blocks of a page, post, or course; elements are the
//! leaf units inside a section. Both are persisted exactly as serialized here,
//! so normalization output can be re-read and re-rendered without a second
//! pass.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::debug;

pub const DEFAULT_SECTION_TYPE: &str = "standard";

pub const SECTION_HERO: &str = "hero";
pub const SECTION_GRID: &str = "grid";
pub const SECTION_POSTS_LIST: &str = "posts_list";
pub const SECTION_CATEGORIES_LIST: &str = "categories_list";
pub const SECTION_COURSES_LIST: &str = "courses_list";

/// Allowed vertical padding values, ascending.
pub const PADDING_VERTICAL_STEPS: [i32; 9] = [0, 8, 16, 24, 32, 48, 64, 96, 128];

/// Allowed vertical margin values, ascending.
pub const MARGIN_VERTICAL_STEPS: [i32; 7] = [0, 8, 16, 24, 32, 48, 64];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub section_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_vertical: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_vertical: Option<i32>,
    #[serde(default)]
    pub order: i32,
    /// Grid sections only; `None` keeps the default item styling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_item_styling: Option<bool>,
}

impl Section {
    pub fn new(section_type: impl Into<String>) -> Self {
        Self {
            section_type: section_type.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Title with surrounding whitespace removed, or `None` when blank.
    pub fn display_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
    }

    pub fn display_image(&self) -> Option<&str> {
        self.image
            .as_deref()
            .map(str::trim)
            .filter(|image| !image.is_empty())
    }

    pub fn styles_grid_items(&self) -> bool {
        self.grid_item_styling.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub element_type: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub content: ElementContent,
}

impl Element {
    pub fn new(element_type: impl Into<String>, content: ElementContent) -> Self {
        Self {
            element_type: element_type.into(),
            content,
            ..Self::default()
        }
    }
}

/// Untyped, author-controlled payload of an element.
///
/// Each renderer reads its own keys; every accessor tolerates missing or
/// mistyped values by returning `None` or an empty collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ElementContent(Map<String, Value>);

impl<'de> Deserialize<'de> for ElementContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Option::<Map<String, Value>>::deserialize(deserializer)?;
        Ok(Self(value.unwrap_or_default()))
    }
}

impl ElementContent {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builds content from a JSON value; anything but an object yields empty content.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Trimmed, non-empty string value for `key`.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Integer value; floats are accepted when they are whole numbers.
    pub fn i64(&self, key: &str) -> Option<i64> {
        let value = self.get(key)?;
        value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|number| number.fract() == 0.0 && number.abs() < 9.0e15)
                .map(|number| number as i64)
        })
    }

    /// Non-empty strings from an array value; non-string entries are skipped.
    pub fn string_list(&self, key: &str) -> Vec<&str> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Object entries of an array value wrapped as nested content.
    pub fn object_list(&self, key: &str) -> Vec<ElementContent> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|map| ElementContent(map.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Decode into a typed payload, returning `None` when the shape does not fit.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        match serde_json::from_value(Value::Object(self.0.clone())) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                debug!(
                    target = "domain::sections",
                    error = %err,
                    "element content did not match expected shape"
                );
                None
            }
        }
    }
}

impl From<Map<String, Value>> for ElementContent {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Snap `value` to the nearest entry of `steps`; ties resolve to the earlier step.
pub fn snap_to_step(value: i32, steps: &[i32]) -> i32 {
    let mut best = match steps.first() {
        Some(&first) => first,
        None => return value,
    };
    let mut best_distance = (i64::from(value) - i64::from(best)).abs();

    for &step in &steps[1..] {
        let distance = (i64::from(value) - i64::from(step)).abs();
        if distance < best_distance {
            best = step;
            best_distance = distance;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snap_prefers_lower_value_on_ties() {
        assert_eq!(snap_to_step(12, &PADDING_VERTICAL_STEPS), 8);
        assert_eq!(snap_to_step(20, &PADDING_VERTICAL_STEPS), 16);
        assert_eq!(snap_to_step(40, &MARGIN_VERTICAL_STEPS), 32);
    }

    #[test]
    fn snap_clamps_outside_range() {
        assert_eq!(snap_to_step(-40, &PADDING_VERTICAL_STEPS), 0);
        assert_eq!(snap_to_step(1_000, &PADDING_VERTICAL_STEPS), 128);
        assert_eq!(snap_to_step(1_000, &MARGIN_VERTICAL_STEPS), 64);
        assert_eq!(snap_to_step(5, &[]), 5);
    }

    #[test]
    fn content_accessors_tolerate_bad_shapes() {
        let content = ElementContent::from_value(json!({
            "text": "  hello ",
            "blank": "   ",
            "count": "seven",
            "items": ["a", 3, "", "b"],
            "links": [{"label": "x"}, "nope"],
            "gone": null
        }));

        assert_eq!(content.str("text"), Some("hello"));
        assert_eq!(content.str("blank"), None);
        assert_eq!(content.i64("count"), None);

        let numbers = ElementContent::from_value(json!({"whole": 3.0, "half": 2.5, "int": 4}));
        assert_eq!(numbers.i64("whole"), Some(3));
        assert_eq!(numbers.i64("half"), None);
        assert_eq!(numbers.i64("int"), Some(4));
        assert_eq!(content.string_list("items"), vec!["a", "b"]);
        assert_eq!(content.object_list("links").len(), 1);
        assert!(content.get("gone").is_none());
        assert!(content.string_list("missing").is_empty());
    }

    #[test]
    fn null_content_deserializes_as_empty() {
        let element: Element =
            serde_json::from_value(json!({"type": "paragraph", "content": null})).expect("element");
        assert!(element.content.is_empty());
    }

    #[test]
    fn optional_fields_are_omitted_when_serialized() {
        let section = Section::new("standard");
        let value = serde_json::to_value(&section).expect("serialize");
        assert_eq!(value, json!({"id": "", "type": "standard", "order": 0}));
    }
}
