//! Step definitions: one screen's worth of fields validated together.
//!
//! A step is immutable once the wizard is built. Its index is assigned by the
//! wizard from its position in the step list.

use std::collections::BTreeMap;

use crate::field::FormField;
use crate::value::Values;

/// Field key -> error message. Ordered for stable reporting.
pub type ErrorMap = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct StepDefinition {
    index: usize,
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<FormField>,
}

impl StepDefinition {
    pub fn new(title: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self {
            index: 0,
            title: title.into(),
            description: None,
            fields,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field_by_key(&self, key: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn field_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    /// Validate every field of the step against `values`.
    ///
    /// Reports all failing fields, not just the first.
    pub fn validate(&self, values: &Values) -> ErrorMap {
        self.fields
            .iter()
            .filter_map(|f| f.check(values).map(|msg| (f.key.clone(), msg)))
            .collect()
    }
}
