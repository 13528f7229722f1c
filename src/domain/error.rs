use thiserror::Error;

/// Reasons a submitted section list is rejected before persistence.
///
/// Every variant names the offending section index (and element index where
/// relevant) so authors can locate the block to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionValidationError {
    #[error("section {index}: unknown type `{section_type}`")]
    UnknownSectionType { index: usize, section_type: String },
    #[error("section {index}: a title is required for `{section_type}` sections")]
    MissingTitle { index: usize, section_type: String },
    #[error("section {index}, element {element}: unknown type `{element_type}`")]
    UnknownElementType {
        index: usize,
        element: usize,
        element_type: String,
    },
    #[error("section {index}, element {element}: content is required")]
    MissingContent { index: usize, element: usize },
    #[error("section {index}, element {element} (`{element_type}`): {message}")]
    InvalidElement {
        index: usize,
        element: usize,
        element_type: String,
        message: String,
    },
}

impl SectionValidationError {
    /// Index of the section that failed validation.
    pub fn section_index(&self) -> usize {
        match self {
            Self::UnknownSectionType { index, .. }
            | Self::MissingTitle { index, .. }
            | Self::UnknownElementType { index, .. }
            | Self::MissingContent { index, .. }
            | Self::InvalidElement { index, .. } => *index,
        }
    }
}
