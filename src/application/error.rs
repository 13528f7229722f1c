use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{registry::RegistrationError, render::RenderError},
    domain::error::SectionValidationError,
    infra::error::InfraError,
    presentation::templates::TemplateError,
};

/// Flattened view of an error and its source chain, suitable for logs and
/// CLI diagnostics.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    pub fn from_message(source: &'static str, message: impl Into<String>) -> Self {
        Self {
            source,
            messages: vec![message.into()],
        }
    }

    /// Messages joined outermost first, e.g. `a: b: c`.
    pub fn chain(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] SectionValidationError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("invalid input `{source_name}`: {message}")]
    Input {
        source_name: String,
        message: String,
    },
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn input(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Input {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Process exit code for the CLI: 2 for bad input, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Validation(_) | AppError::Input { .. } => 2,
            AppError::Infra(InfraError::Configuration { .. }) => 2,
            _ => 1,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_walks_source_chain() {
        let err = AppError::from(RenderError::NoTemplates(TemplateError::NotLoaded));
        let report = err.report();
        assert_eq!(report.messages.len(), 2);
        assert_eq!(report.messages[1], TemplateError::NotLoaded.to_string());
        assert!(report.chain().contains(": "));
    }

    #[test]
    fn validation_errors_exit_with_usage_code() {
        let err = AppError::from(SectionValidationError::MissingTitle {
            index: 0,
            section_type: "hero".to_string(),
        });
        assert_eq!(err.exit_code(), 2);
        assert_eq!(AppError::unexpected("boom").exit_code(), 1);
    }
}
