//! Write-time validation and repair of author-submitted sections.
//!
//! Output of [`prepare_sections`] is what gets persisted; feeding it back in
//! yields the same list, so rendering never needs a second pass.

use tracing::debug;
use uuid::Uuid;

use crate::{
    application::registry::MetadataRegistry,
    domain::{
        definitions::{LimitSetting, TypeDefinitions, normalize_type_key},
        error::SectionValidationError,
        sections::{
            DEFAULT_SECTION_TYPE, Element, MARGIN_VERTICAL_STEPS, PADDING_VERTICAL_STEPS, Section,
            snap_to_step,
        },
    },
};

const TARGET: &str = "application::normalize";

#[derive(Debug, Clone, Copy, Default)]
pub struct PrepareOptions<'a> {
    /// Snap vertical padding and margin to the allowed steps.
    pub normalize_spacing: bool,
    /// When present, element content must satisfy the registered schema and validator.
    pub registry: Option<&'a MetadataRegistry>,
}

impl<'a> PrepareOptions<'a> {
    pub fn with_spacing(mut self, normalize_spacing: bool) -> Self {
        self.normalize_spacing = normalize_spacing;
        self
    }

    pub fn with_registry(mut self, registry: &'a MetadataRegistry) -> Self {
        self.registry = Some(registry);
        self
    }
}

/// Validate `raw` against `definitions` and return the list ready to persist.
///
/// Any invalid section rejects the whole list; the error names its input index.
pub fn prepare_sections(
    raw: Vec<Section>,
    definitions: &TypeDefinitions,
    options: PrepareOptions<'_>,
) -> Result<Vec<Section>, SectionValidationError> {
    let mut prepared = raw
        .into_iter()
        .enumerate()
        .map(|(index, section)| prepare_section(index, section, definitions, options))
        .collect::<Result<Vec<_>, _>>()?;

    prepared.sort_by_key(|section| section.order);

    debug!(
        target = TARGET,
        sections = prepared.len(),
        normalize_spacing = options.normalize_spacing,
        "Sections prepared"
    );
    Ok(prepared)
}

fn prepare_section(
    index: usize,
    mut section: Section,
    definitions: &TypeDefinitions,
    options: PrepareOptions<'_>,
) -> Result<Section, SectionValidationError> {
    let mut section_type = normalize_type_key(&section.section_type);
    if section_type.is_empty() {
        section_type = DEFAULT_SECTION_TYPE.to_string();
    }

    let definition = definitions.section(&section_type).ok_or_else(|| {
        SectionValidationError::UnknownSectionType {
            index,
            section_type: section_type.clone(),
        }
    })?;

    section.title = trimmed(section.title);
    section.image = trimmed(section.image);
    if definition.requires_title && section.title.is_none() {
        return Err(SectionValidationError::MissingTitle {
            index,
            section_type,
        });
    }

    if definition.allows_elements {
        let mut elements = std::mem::take(&mut section.elements)
            .into_iter()
            .enumerate()
            .map(|(position, element)| {
                prepare_element(index, position, element, definitions, options)
            })
            .collect::<Result<Vec<_>, _>>()?;
        elements.sort_by_key(|element| element.order);
        section.elements = elements;
    } else {
        section.elements.clear();
    }

    let limit_setting = definition
        .limit
        .or_else(|| LimitSetting::legacy_for(&section_type));
    if let Some(setting) = limit_setting {
        section.limit = Some(setting.clamp(section.limit));
    }

    if let Some(mode) = definition
        .mode
        .as_ref()
        .filter(|mode| !mode.options.is_empty())
    {
        section.mode = Some(mode.resolve(section.mode.as_deref()));
    }

    section.id = ensure_id(&section.id);
    if section.order == 0 {
        section.order = one_based(index);
    }

    if options.normalize_spacing {
        section.padding_vertical = section
            .padding_vertical
            .map(|value| snap_to_step(value, &PADDING_VERTICAL_STEPS));
        section.margin_vertical = section
            .margin_vertical
            .map(|value| snap_to_step(value, &MARGIN_VERTICAL_STEPS));
    }

    section.section_type = section_type;
    Ok(section)
}

fn prepare_element(
    index: usize,
    position: usize,
    mut element: Element,
    definitions: &TypeDefinitions,
    options: PrepareOptions<'_>,
) -> Result<Element, SectionValidationError> {
    let element_type = normalize_type_key(&element.element_type);
    if element_type.is_empty() || definitions.element(&element_type).is_none() {
        return Err(SectionValidationError::UnknownElementType {
            index,
            element: position,
            element_type,
        });
    }

    if element.content.is_empty() {
        return Err(SectionValidationError::MissingContent {
            index,
            element: position,
        });
    }

    if let Some(registry) = options.registry {
        registry
            .validate(&element_type, &element.content)
            .map_err(|message| SectionValidationError::InvalidElement {
                index,
                element: position,
                element_type: element_type.clone(),
                message,
            })?;
    }

    element.id = ensure_id(&element.id);
    if element.order == 0 {
        element.order = one_based(position);
    }
    element.element_type = element_type;
    Ok(element)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn ensure_id(id: &str) -> String {
    let id = id.trim();
    if id.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        id.to_string()
    }
}

fn one_based(index: usize) -> i32 {
    i32::try_from(index)
        .ok()
        .and_then(|index| index.checked_add(1))
        .unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::{DescriptorBuilder, renderer_fn};
    use crate::application::render::RenderedFragment;
    use crate::domain::{
        definitions::SectionDefinition,
        sections::ElementContent,
    };
    use serde_json::json;

    fn paragraph(text: &str) -> Element {
        Element::new(
            "Paragraph",
            ElementContent::from_value(json!({ "text": text })),
        )
    }

    fn prepare(raw: Vec<Section>) -> Result<Vec<Section>, SectionValidationError> {
        prepare_sections(
            raw,
            &TypeDefinitions::builtin(),
            PrepareOptions::default().with_spacing(true),
        )
    }

    #[test]
    fn assigns_defaults_ids_and_order() {
        let raw = vec![
            Section::new("").with_element(paragraph("a")),
            Section::new(" HERO ").with_element(paragraph("dropped")),
        ];
        let prepared = prepare(raw).expect("prepared");

        assert_eq!(prepared[0].section_type, "standard");
        assert_eq!(prepared[0].order, 1);
        assert_eq!(prepared[0].elements[0].element_type, "paragraph");
        assert_eq!(prepared[0].elements[0].order, 1);
        assert!(Uuid::parse_str(&prepared[0].id).is_ok());
        assert!(!prepared[0].elements[0].id.is_empty());

        assert_eq!(prepared[1].section_type, "hero");
        assert_eq!(prepared[1].order, 2);
        assert!(prepared[1].elements.is_empty());
    }

    #[test]
    fn second_pass_is_identical() {
        let mut courses = Section::new("courses_list").with_mode("BOGUS");
        courses.padding_vertical = Some(20);
        courses.margin_vertical = Some(1_000);
        let raw = vec![
            Section::new("standard")
                .with_title("  Intro  ")
                .with_element(paragraph("hello")),
            Section::new("posts_list").with_limit(999),
            courses,
        ];

        let first = prepare(raw).expect("first pass");
        let second = prepare(first.clone()).expect("second pass");
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).expect("json"),
            serde_json::to_string(&second).expect("json")
        );
        assert_eq!(first[0].title.as_deref(), Some("Intro"));
        assert_eq!(first[2].padding_vertical, Some(16));
        assert_eq!(first[2].margin_vertical, Some(64));
    }

    #[test]
    fn clamps_limits_into_declared_range() {
        let prepared = prepare(vec![
            Section::new("posts_list").with_limit(0),
            Section::new("posts_list").with_limit(999),
            Section::new("categories_list").with_limit(-5),
            Section::new("courses_list").with_limit(3),
        ])
        .expect("prepared");

        let limits: Vec<_> = prepared.iter().map(|section| section.limit).collect();
        assert_eq!(limits, vec![Some(6), Some(12), Some(8), Some(3)]);
    }

    #[test]
    fn clamps_below_minimum() {
        let mut definitions = TypeDefinitions::builtin();
        definitions.insert_section(
            "posts_list",
            SectionDefinition::new("Posts")
                .without_elements()
                .with_limit(6, 3, 12),
        );
        let prepared = prepare_sections(
            vec![Section::new("posts_list").with_limit(1)],
            &definitions,
            PrepareOptions::default(),
        )
        .expect("prepared");
        assert_eq!(prepared[0].limit, Some(3));
    }

    #[test]
    fn legacy_limits_apply_when_definition_has_none() {
        let mut definitions = TypeDefinitions::builtin();
        definitions.insert_section(
            "categories_list",
            SectionDefinition::new("Categories").without_elements(),
        );
        let prepared = prepare_sections(
            vec![Section::new("categories_list").with_limit(500)],
            &definitions,
            PrepareOptions::default(),
        )
        .expect("prepared");
        assert_eq!(prepared[0].limit, Some(24));
    }

    #[test]
    fn mode_falls_back_through_default_and_first_option() {
        let prepared = prepare(vec![Section::new("courses_list").with_mode("bogus")])
            .expect("prepared");
        assert_eq!(prepared[0].mode.as_deref(), Some("catalog"));

        let mut definitions = TypeDefinitions::builtin();
        definitions.insert_section(
            "courses_list",
            SectionDefinition::new("Courses")
                .without_elements()
                .with_mode("everything", &["owned", "catalog"]),
        );
        let prepared = prepare_sections(
            vec![Section::new("courses_list").with_mode("bogus")],
            &definitions,
            PrepareOptions::default(),
        )
        .expect("prepared");
        assert_eq!(prepared[0].mode.as_deref(), Some("owned"));
    }

    #[test]
    fn unknown_section_type_reports_index() {
        let err = prepare(vec![
            Section::new("standard"),
            Section::new("not_a_real_type"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            SectionValidationError::UnknownSectionType {
                index: 1,
                section_type: "not_a_real_type".to_string(),
            }
        );
        assert_eq!(err.section_index(), 1);
    }

    #[test]
    fn element_failures_name_section_and_element() {
        let unknown = prepare(vec![
            Section::new("standard").with_element(Element::new(
                "marquee",
                ElementContent::from_value(json!({"text": "x"})),
            )),
        ])
        .unwrap_err();
        assert!(matches!(
            unknown,
            SectionValidationError::UnknownElementType { index: 0, element: 0, .. }
        ));

        let empty = prepare(vec![
            Section::new("standard")
                .with_element(paragraph("ok"))
                .with_element(Element::new("paragraph", ElementContent::new())),
        ])
        .unwrap_err();
        assert_eq!(
            empty,
            SectionValidationError::MissingContent {
                index: 0,
                element: 1
            }
        );
    }

    #[test]
    fn required_title_is_enforced() {
        let mut definitions = TypeDefinitions::builtin();
        definitions.insert_section("hero", SectionDefinition::new("Hero").requiring_title());
        let err = prepare_sections(
            vec![Section::new("hero").with_title("   ")],
            &definitions,
            PrepareOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SectionValidationError::MissingTitle { index: 0, .. }));
    }

    #[test]
    fn registry_schema_rejects_invalid_content() {
        let registry = MetadataRegistry::new();
        registry
            .register_with_metadata(
                DescriptorBuilder::new("paragraph")
                    .rich_text_field("text", "Text")
                    .required()
                    .renderer(renderer_fn(|_, _, _| RenderedFragment::empty()))
                    .build()
                    .expect("descriptor"),
            )
            .expect("register");

        let raw = vec![Section::new("standard").with_element(Element::new(
            "paragraph",
            ElementContent::from_value(json!({"body": "wrong key"})),
        ))];
        let err = prepare_sections(
            raw,
            &TypeDefinitions::builtin(),
            PrepareOptions::default().with_registry(&registry),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SectionValidationError::InvalidElement { index: 0, element: 0, ref message, .. }
                if message == "`text` is required"
        ));
    }

    #[test]
    fn explicit_order_sorts_output() {
        let mut late = Section::new("standard");
        late.order = 5;
        late.id = "late".to_string();
        let mut early = Section::new("standard");
        early.order = 2;
        early.id = "early".to_string();

        let prepared = prepare(vec![late, early]).expect("prepared");
        let ids: Vec<_> = prepared.iter().map(|section| section.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[test]
    fn options_are_debuggable_with_a_registry() {
        let registry = MetadataRegistry::with_builtins().expect("builtins");
        let options = PrepareOptions::default()
            .with_spacing(true)
            .with_registry(&registry);
        let rendered = format!("{options:?}");
        assert!(rendered.contains("normalize_spacing: true"));
        assert!(rendered.contains("paragraph"));
    }

    #[test]
    fn spacing_is_untouched_without_option() {
        let mut section = Section::new("standard");
        section.padding_vertical = Some(13);
        let prepared = prepare_sections(
            vec![section],
            &TypeDefinitions::builtin(),
            PrepareOptions::default(),
        )
        .expect("prepared");
        assert_eq!(prepared[0].padding_vertical, Some(13));
    }
}
