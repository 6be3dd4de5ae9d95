//! Wiring errors. These indicate a bug in how a wizard was declared or
//! driven, never bad user input.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("wizard `{0}` has no steps")]
    NoSteps(String),

    #[error("wizard `{0}` has no submission operation")]
    MissingOperation(String),

    #[error("field `{0}` is declared more than once")]
    DuplicateField(String),

    #[error("field `{field}` references undefined field `{references}`")]
    UnknownFieldReference { field: String, references: String },

    #[error("unknown field: {0}")]
    UnknownField(String),
}
