//! form_wizard: multi-step form engine.
//!
//! A wizard is an ordered list of [`StepDefinition`]s, each holding
//! [`FormField`]s with [`Validator`] chains. The [`Wizard`] owns one session's
//! values and errors, gates forward navigation on step validation and, on the
//! last step, hands an immutable [`SubmissionPayload`] to an injected
//! [`SubmissionOperation`].
//!
//! The engine knows nothing about rendering: a UI reads [`WizardState`]
//! snapshots and dispatches edits and navigation back into the wizard.

pub mod errors;
pub mod field;
pub mod state;
pub mod step;
pub mod submission;
pub mod validator;
pub mod value;
pub mod wizard;

pub use errors::WizardError;
pub use field::{FieldKind, FormField, INVALID_TYPE};
pub use state::{FieldStatus, SubmissionStatus, WizardState};
pub use step::{ErrorMap, StepDefinition};
pub use submission::{
    submission_fn, FnSubmission, Receipt, SubmissionError, SubmissionOperation, SubmissionPayload,
};
pub use validator::Validator;
pub use value::{FieldValue, FileRef, Values};
pub use wizard::{PendingSubmission, Wizard, WizardBuilder};

// Re-exported so callers can build cancellation tokens without a direct dependency.
pub use tokio_util::sync::CancellationToken;
