//! Section and element type definitions.
//!
//! Definitions come from the active theme; when a theme ships none the
//! built-in set applies. They are read-only inputs to normalization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::sections::{
    DEFAULT_SECTION_TYPE, SECTION_CATEGORIES_LIST, SECTION_COURSES_LIST, SECTION_GRID,
    SECTION_HERO, SECTION_POSTS_LIST,
};

pub const COURSES_MODE_CATALOG: &str = "catalog";
pub const COURSES_MODE_OWNED: &str = "owned";

/// Limit constants from before list types declared their own `limit` setting.
const LEGACY_POSTS_LIMIT: LimitSetting = LimitSetting {
    default: 6,
    min: 1,
    max: 12,
};
const LEGACY_CATEGORIES_LIMIT: LimitSetting = LimitSetting {
    default: 8,
    min: 1,
    max: 24,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitSetting {
    pub default: i32,
    pub min: i32,
    pub max: i32,
}

impl LimitSetting {
    /// Legacy limits for list types whose definition omits a `limit` setting.
    pub fn legacy_for(section_type: &str) -> Option<LimitSetting> {
        match section_type {
            SECTION_POSTS_LIST => Some(LEGACY_POSTS_LIMIT),
            SECTION_CATEGORIES_LIST => Some(LEGACY_CATEGORIES_LIMIT),
            _ => None,
        }
    }

    /// Clamp `value` into `[min, max]`; non-positive or missing values take the default.
    pub fn clamp(&self, value: Option<i32>) -> i32 {
        let (min, max) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        let candidate = match value {
            Some(value) if value > 0 => value,
            _ => self.default,
        };
        candidate.clamp(min, max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSetting {
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub options: Vec<String>,
}

impl ModeSetting {
    fn find_option(&self, candidate: &str) -> Option<&str> {
        self.options
            .iter()
            .map(String::as_str)
            .find(|option| option.trim().eq_ignore_ascii_case(candidate))
    }

    /// Resolve a requested mode against the declared options.
    ///
    /// Falls back to the declared default when it is itself an option, then to
    /// the first option, and only then keeps the normalized input.
    pub fn resolve(&self, requested: Option<&str>) -> String {
        let normalized = requested
            .map(|mode| mode.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if !normalized.is_empty()
            && let Some(option) = self.find_option(&normalized)
        {
            return option.trim().to_ascii_lowercase();
        }

        let default = self.default.trim().to_ascii_lowercase();
        if !default.is_empty()
            && let Some(option) = self.find_option(&default)
        {
            return option.trim().to_ascii_lowercase();
        }

        if let Some(first) = self
            .options
            .iter()
            .map(|option| option.trim())
            .find(|option| !option.is_empty())
        {
            return first.to_ascii_lowercase();
        }

        normalized
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDefinition {
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_true")]
    pub allows_elements: bool,
    #[serde(default)]
    pub requires_title: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<LimitSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ModeSetting>,
    /// Extra CSS classes applied to the section wrapper.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl SectionDefinition {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            allows_elements: true,
            requires_title: false,
            limit: None,
            mode: None,
            classes: Vec::new(),
        }
    }

    pub fn without_elements(mut self) -> Self {
        self.allows_elements = false;
        self
    }

    pub fn with_limit(mut self, default: i32, min: i32, max: i32) -> Self {
        self.limit = Some(LimitSetting { default, min, max });
        self
    }

    pub fn with_mode(mut self, default: &str, options: &[&str]) -> Self {
        self.mode = Some(ModeSetting {
            default: default.to_string(),
            options: options.iter().map(|option| option.to_string()).collect(),
        });
        self
    }

    pub fn requiring_title(mut self) -> Self {
        self.requires_title = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDefinition {
    #[serde(default)]
    pub label: String,
}

impl ElementDefinition {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// Element types shipped with the engine, paired with their display labels.
pub const BUILTIN_ELEMENT_TYPES: [(&str, &str); 13] = [
    ("paragraph", "Paragraph"),
    ("heading", "Heading"),
    ("markdown", "Markdown"),
    ("image", "Image"),
    ("image_group", "Image group"),
    ("list", "List"),
    ("quote", "Quote"),
    ("search", "Search"),
    ("file_group", "File group"),
    ("feature_item", "Feature item"),
    ("contact", "Contact"),
    ("profile_bio", "Profile bio"),
    ("profile_links", "Profile links"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinitions {
    #[serde(default)]
    pub sections: BTreeMap<String, SectionDefinition>,
    #[serde(default)]
    pub elements: BTreeMap<String, ElementDefinition>,
}

impl TypeDefinitions {
    pub fn builtin() -> Self {
        let mut sections = BTreeMap::new();
        sections.insert(
            DEFAULT_SECTION_TYPE.to_string(),
            SectionDefinition::new("Standard"),
        );
        sections.insert(
            SECTION_HERO.to_string(),
            SectionDefinition::new("Hero").without_elements(),
        );
        sections.insert(SECTION_GRID.to_string(), SectionDefinition::new("Grid"));
        sections.insert(
            SECTION_POSTS_LIST.to_string(),
            SectionDefinition::new("Recent posts")
                .without_elements()
                .with_limit(6, 1, 12),
        );
        sections.insert(
            SECTION_CATEGORIES_LIST.to_string(),
            SectionDefinition::new("Categories")
                .without_elements()
                .with_limit(8, 1, 24),
        );
        sections.insert(
            SECTION_COURSES_LIST.to_string(),
            SectionDefinition::new("Courses")
                .without_elements()
                .with_limit(6, 1, 12)
                .with_mode(
                    COURSES_MODE_CATALOG,
                    &[COURSES_MODE_CATALOG, COURSES_MODE_OWNED],
                ),
        );

        let elements = BUILTIN_ELEMENT_TYPES
            .iter()
            .map(|(key, label)| (key.to_string(), ElementDefinition::new(*label)))
            .collect();

        Self { sections, elements }
    }

    /// Parse definitions from a theme's TOML. Missing tables fall back to the built-in ones.
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        let parsed: TypeDefinitions = toml::from_str(source)?;
        Ok(parsed.or_builtin())
    }

    /// Replace empty section or element tables with the built-in ones.
    pub fn or_builtin(self) -> Self {
        let builtin = Self::builtin();
        let sections = if self.sections.is_empty() {
            builtin.sections
        } else {
            lowercase_keys(self.sections)
        };
        let elements = if self.elements.is_empty() {
            builtin.elements
        } else {
            lowercase_keys(self.elements)
        };
        Self { sections, elements }
    }

    pub fn section(&self, section_type: &str) -> Option<&SectionDefinition> {
        self.sections.get(section_type)
    }

    pub fn element(&self, element_type: &str) -> Option<&ElementDefinition> {
        self.elements.get(element_type)
    }

    pub fn insert_section(&mut self, section_type: &str, definition: SectionDefinition) {
        self.sections
            .insert(normalize_type_key(section_type), definition);
    }

    pub fn insert_element(&mut self, element_type: &str, definition: ElementDefinition) {
        self.elements
            .insert(normalize_type_key(element_type), definition);
    }
}

fn lowercase_keys<V>(map: BTreeMap<String, V>) -> BTreeMap<String, V> {
    map.into_iter()
        .map(|(key, value)| (normalize_type_key(&key), value))
        .collect()
}

/// Canonical form of a type key: trimmed and lowercased.
pub fn normalize_type_key(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn courses_mode() -> ModeSetting {
        ModeSetting {
            default: "catalog".to_string(),
            options: vec!["catalog".to_string(), "owned".to_string()],
        }
    }

    #[test]
    fn limit_clamp_uses_default_for_non_positive_values() {
        let limit = LimitSetting {
            default: 6,
            min: 2,
            max: 12,
        };
        assert_eq!(limit.clamp(None), 6);
        assert_eq!(limit.clamp(Some(0)), 6);
        assert_eq!(limit.clamp(Some(-3)), 6);
        assert_eq!(limit.clamp(Some(1)), 2);
        assert_eq!(limit.clamp(Some(999)), 12);
        assert_eq!(limit.clamp(Some(7)), 7);
    }

    #[test]
    fn mode_resolution_matches_case_insensitively() {
        assert_eq!(courses_mode().resolve(Some(" OWNED ")), "owned");
    }

    #[test]
    fn mode_resolution_falls_back_to_default_then_first_option() {
        assert_eq!(courses_mode().resolve(Some("bogus")), "catalog");
        assert_eq!(courses_mode().resolve(None), "catalog");

        let invalid_default = ModeSetting {
            default: "everything".to_string(),
            options: vec!["owned".to_string(), "catalog".to_string()],
        };
        assert_eq!(invalid_default.resolve(Some("bogus")), "owned");
    }

    #[test]
    fn mode_resolution_keeps_input_without_options() {
        let empty = ModeSetting {
            default: String::new(),
            options: Vec::new(),
        };
        assert_eq!(empty.resolve(Some(" Custom ")), "custom");
    }

    #[test]
    fn legacy_limits_cover_posts_and_categories_only() {
        assert!(LimitSetting::legacy_for("posts_list").is_some());
        assert!(LimitSetting::legacy_for("categories_list").is_some());
        assert!(LimitSetting::legacy_for("courses_list").is_none());
    }

    #[test]
    fn theme_toml_replaces_sections_and_keeps_builtin_elements() {
        let definitions = TypeDefinitions::from_toml(
            r#"
            [sections.Standard]
            label = "Plain"

            [sections.posts_list]
            label = "Posts"
            allows_elements = false
            limit = { default = 3, min = 1, max = 5 }
            "#,
        )
        .expect("valid toml");

        assert_eq!(definitions.sections.len(), 2);
        assert!(definitions.section("standard").is_some());
        let posts = definitions.section("posts_list").expect("posts definition");
        assert_eq!(posts.limit.map(|limit| limit.max), Some(5));
        assert!(definitions.element("paragraph").is_some());
    }
}
