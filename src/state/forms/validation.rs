//! Per-step validation

use super::draft::Draft;
use super::schema::FormSchema;

/// Outcome of checking one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub ok: bool,
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn passed() -> Self {
        Self {
            ok: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
        }
    }

    /// Failure with nothing to tell the user (e.g. a blocked transition)
    pub fn blocked() -> Self {
        Self {
            ok: false,
            message: None,
        }
    }
}

/// Host-supplied check that runs after the required-field pass.
///
/// Returns `None` when the step is fine.
pub type CustomRule = fn(&Draft) -> Option<ValidationResult>;

/// A field that must be filled before leaving its step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredField {
    pub field: &'static str,
    pub message: String,
}

/// One step of a wizard: the fields it lays out and what gates it
#[derive(Debug, Clone)]
pub struct StepDefinition {
    /// 1-based position in the wizard
    pub index: usize,
    pub title: &'static str,
    pub fields: Vec<&'static str>,
    pub required_fields: Vec<RequiredField>,
    pub custom_rule: Option<CustomRule>,
}

/// Runs a schema's step rules against a draft
pub struct StepValidator<'a> {
    schema: &'a FormSchema,
}

impl<'a> StepValidator<'a> {
    pub fn new(schema: &'a FormSchema) -> Self {
        Self { schema }
    }

    /// Check `step` (1-based). Required fields are checked in declaration
    /// order, then the custom rule; the first failure wins.
    pub fn validate(&self, step: usize, draft: &Draft) -> ValidationResult {
        let Some(definition) = self.schema.step(step) else {
            return ValidationResult::passed();
        };

        if let Some(missing) = definition
            .required_fields
            .iter()
            .find(|required| draft.is_field_empty(required.field))
        {
            return ValidationResult::failed(missing.message.clone());
        }

        definition
            .custom_rule
            .and_then(|rule| rule(draft))
            .filter(|result| !result.ok)
            .unwrap_or_else(ValidationResult::passed)
    }
}
