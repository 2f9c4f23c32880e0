//! Parameter form: one numeric text input per metadata parameter.

use std::collections::HashMap;

use shared::{
    domain::{ItemMetadata, Parameter},
    protocol::{SubmissionPayload, ValueRejection},
};
use tracing::warn;

use crate::selection::ActiveSelection;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterForm {
    fields: Vec<Parameter>,
    values: HashMap<String, String>,
}

impl ParameterForm {
    /// Fresh form with every input empty. Repeated names share one value slot.
    pub fn from_metadata(metadata: &ItemMetadata) -> Self {
        let fields = metadata.parameters.clone();
        let values = fields
            .iter()
            .map(|field| (field.name.clone(), String::new()))
            .collect();
        Self { fields, values }
    }

    pub fn fields(&self) -> &[Parameter] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn value_mut(&mut self, name: &str) -> Option<&mut String> {
        self.values.get_mut(name)
    }

    /// Returns `false` when no input is addressed by `name`.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }
}

pub fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
}

/// Drops characters a number input would not accept.
pub fn retain_numeric(text: &mut String) {
    text.retain(is_numeric_char);
}

/// Reads each parameter's live value by name, in metadata order, and merges
/// the fixed selection fields.
pub fn build_submission(selection: &ActiveSelection, form: &ParameterForm) -> SubmissionPayload {
    let metadata = selection.metadata();
    let mut payload = SubmissionPayload::new(selection.item().id.clone(), metadata.engine.clone());

    for parameter in &metadata.parameters {
        let value = form.value(&parameter.name).unwrap_or_default();
        match payload.push_value(parameter.name.clone(), value) {
            Ok(()) | Err(ValueRejection::DuplicateName) => {}
            Err(ValueRejection::ReservedName) => warn!(
                parameter = %parameter.name,
                "parameter name collides with a fixed submission field; skipping"
            ),
        }
    }

    payload
}
