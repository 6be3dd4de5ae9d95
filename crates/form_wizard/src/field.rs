//! Form field kinds and metadata.
//!
//! Declarative only: a `FormField` describes what the rendering layer shows
//! and which validators guard the value. Mutation lives in `wizard.rs`.
//!
//! ```ignore
//! let field = FormField::new("business_name", "Business name", FieldKind::Text)
//!     .help("Registered trading name")
//!     .required();
//! ```

use crate::validator::Validator;
use crate::value::{FieldValue, Values};

/// Input widget kind. The engine only uses it for built-in sanity checks;
/// everything else is a rendering hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Rendered obfuscated, stored plain.
    Secret,
    Email,
    /// Text that must parse as a number when non-empty.
    Number,
    Multiline,
    Bool,
    File,
    /// Value must be one of `options` when non-empty.
    Select { options: Vec<String> },
    ListString,
}

impl FieldKind {
    /// Whether `value` has the shape this kind stores.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match self {
            FieldKind::Text
            | FieldKind::Secret
            | FieldKind::Email
            | FieldKind::Number
            | FieldKind::Multiline
            | FieldKind::Select { .. } => matches!(value, FieldValue::Text(_)),
            FieldKind::Bool => matches!(value, FieldValue::Bool(_)),
            FieldKind::File => matches!(value, FieldValue::File(_)),
            FieldKind::ListString => matches!(value, FieldValue::List(_)),
        }
    }
}

/// Reported when a value's shape does not fit the field kind.
pub const INVALID_TYPE: &str = "invalid value type";

/// Declarative description of a form field.
#[derive(Debug, Clone)]
pub struct FormField {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub help: Option<String>,
    pub validators: Vec<Validator>,
}

impl FormField {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        let mut field = Self {
            key: key.into(),
            label: label.into(),
            kind,
            help: None,
            validators: Vec::new(),
        };
        if field.kind == FieldKind::Email {
            field.validators.push(Validator::email());
        }
        field
    }

    /// Attach optional help / hint text shown beneath the field.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Append a validator to the chain.
    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Shorthand for a leading `Validator::required()`.
    pub fn required(mut self) -> Self {
        self.validators.insert(0, Validator::required());
        self
    }

    pub fn is_required(&self) -> bool {
        self.validators.iter().any(Validator::is_required)
    }

    pub fn is_textual(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::Text
                | FieldKind::Secret
                | FieldKind::Email
                | FieldKind::Number
                | FieldKind::Multiline
        )
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, FieldKind::ListString)
    }

    /// Other fields read by this field's validators.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.validators
            .iter()
            .flat_map(|v| v.dependencies().iter().map(String::as_str))
    }

    /// Run the validator chain plus the kind's built-in check.
    pub fn check(&self, values: &Values) -> Option<String> {
        let value = values.get(&self.key);
        if value.is_some_and(|v| !self.kind.accepts(v)) {
            return Some(INVALID_TYPE.into());
        }
        for v in &self.validators {
            if let Some(msg) = v.check(&self.key, value, values) {
                return Some(msg);
            }
        }

        // Built-in sanity checks for typed kinds
        match (&self.kind, value) {
            (FieldKind::Number, Some(FieldValue::Text(s))) if !s.trim().is_empty() => {
                if s.trim().parse::<f64>().is_err() {
                    return Some("must be a number".into());
                }
            }
            (FieldKind::Select { options }, Some(FieldValue::Text(s))) if !s.trim().is_empty() => {
                if !options.iter().any(|o| o == s) {
                    return Some(format!("must be one of: {}", options.join(", ")));
                }
            }
            _ => {}
        }
        None
    }
}
