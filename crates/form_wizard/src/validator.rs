//! Field validators.
//!
//! A `Validator` is a pure check over one field value (and, for cross-field
//! rules, the other values of the session). Validators are composed by
//! attaching several to a `FormField`; the first failure wins for that field.
//!
//! ```ignore
//! FormField::new("confirm_password", "Confirm password", FieldKind::Secret)
//!     .validate(Validator::required())
//!     .validate(Validator::equals_field("password").message("passwords do not match"));
//! ```

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::error;

use crate::value::{FieldValue, Values};

/// Message reported when a custom predicate panics.
pub const GENERIC_FAILURE: &str = "validation failed";

/// Shape accepted by [`Validator::email`]: `local@domain.tld`.
pub const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

pub type Predicate = Arc<dyn Fn(&FieldValue, &Values) -> bool + Send + Sync>;

#[derive(Clone)]
enum Rule {
    Required,
    Pattern(Regex),
    MinLength(usize),
    MaxLength(usize),
    EqualsField(String),
    Custom(Predicate),
}

/// A single composable validation rule with an optional message override.
#[derive(Clone)]
pub struct Validator {
    rule: Rule,
    message: Option<String>,
    depends_on: Vec<String>,
}

impl Validator {
    fn from_rule(rule: Rule) -> Self {
        Self {
            rule,
            message: None,
            depends_on: Vec::new(),
        }
    }

    /// Fails when the value is missing or empty (see [`FieldValue::is_empty`]).
    pub fn required() -> Self {
        Self::from_rule(Rule::Required)
    }

    /// Text (or every list item) must match `pattern`.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::from_rule(Rule::Pattern(Regex::new(pattern)?)))
    }

    pub fn email() -> Self {
        static EMAIL: OnceLock<Regex> = OnceLock::new();
        let re = EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"));
        Self::from_rule(Rule::Pattern(re.clone()))
    }

    /// Minimum char count for text, minimum item count for lists.
    pub fn min_length(min: usize) -> Self {
        Self::from_rule(Rule::MinLength(min))
    }

    /// Maximum char count for text, maximum item count for lists.
    pub fn max_length(max: usize) -> Self {
        Self::from_rule(Rule::MaxLength(max))
    }

    /// Value must equal the current value of `other`.
    pub fn equals_field(other: impl Into<String>) -> Self {
        let other = other.into();
        let mut v = Self::from_rule(Rule::EqualsField(other.clone()));
        v.depends_on.push(other);
        v
    }

    /// Caller supplied predicate; `false` fails with `message`.
    pub fn custom(
        message: impl Into<String>,
        predicate: impl Fn(&FieldValue, &Values) -> bool + Send + Sync + 'static,
    ) -> Self {
        let mut v = Self::from_rule(Rule::Custom(Arc::new(predicate)));
        v.message = Some(message.into());
        v
    }

    /// Override the message reported on failure.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Declare that this rule reads another field, so editing that field
    /// re-validates the owner.
    pub fn depends_on(mut self, field: impl Into<String>) -> Self {
        self.depends_on.push(field.into());
        self
    }

    /// Fields this rule reads besides its own.
    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    pub fn is_required(&self) -> bool {
        matches!(self.rule, Rule::Required)
    }

    fn failure(&self) -> String {
        if let Some(msg) = &self.message {
            return msg.clone();
        }
        match &self.rule {
            Rule::Required => "required".into(),
            Rule::Pattern(_) => "invalid format".into(),
            Rule::MinLength(n) => format!("must be at least {n} characters"),
            Rule::MaxLength(n) => format!("must be at most {n} characters"),
            Rule::EqualsField(other) => format!("does not match {other}"),
            Rule::Custom(_) => GENERIC_FAILURE.into(),
        }
    }

    /// Validate `value` of `field`. `None` means valid.
    ///
    /// Empty values pass every rule except `Required`.
    pub fn check(&self, field: &str, value: Option<&FieldValue>, all: &Values) -> Option<String> {
        let value = match value {
            Some(v) if !v.is_empty() => v,
            _ => {
                return self.is_required().then(|| self.failure());
            }
        };

        let ok = match &self.rule {
            Rule::Required => true,
            Rule::Pattern(re) => match value {
                FieldValue::Text(s) => re.is_match(s),
                FieldValue::List(items) => items.iter().all(|i| re.is_match(i)),
                _ => true,
            },
            Rule::MinLength(min) => match value {
                FieldValue::Text(s) => s.chars().count() >= *min,
                FieldValue::List(items) => items.len() >= *min,
                _ => true,
            },
            Rule::MaxLength(max) => match value {
                FieldValue::Text(s) => s.chars().count() <= *max,
                FieldValue::List(items) => items.len() <= *max,
                _ => true,
            },
            Rule::EqualsField(other) => all.get(other) == Some(value),
            Rule::Custom(predicate) => {
                match catch_unwind(AssertUnwindSafe(|| predicate(value, all))) {
                    Ok(ok) => ok,
                    Err(_) => {
                        error!(field, "custom validator panicked; reporting generic failure");
                        return Some(GENERIC_FAILURE.into());
                    }
                }
            }
        };

        (!ok).then(|| self.failure())
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = match &self.rule {
            Rule::Required => "Required".to_string(),
            Rule::Pattern(re) => format!("Pattern({})", re.as_str()),
            Rule::MinLength(n) => format!("MinLength({n})"),
            Rule::MaxLength(n) => format!("MaxLength({n})"),
            Rule::EqualsField(other) => format!("EqualsField({other})"),
            Rule::Custom(_) => "Custom".to_string(),
        };
        f.debug_struct("Validator")
            .field("rule", &rule)
            .field("message", &self.message)
            .finish()
    }
}
