//! Wizard runtime state.
//!
//! `WizardState` is what the rendering layer reads: an owned snapshot handed
//! out by every transition. Keep this module free of transition logic so it
//! can be serialized or compared in tests in isolation.

use serde::Serialize;
use strum::Display;

use crate::step::ErrorMap;
use crate::submission::{Receipt, SubmissionError};
use crate::value::{FieldValue, Values};

/// Lifecycle of the final submission.
///
/// - `Idle` -> `Submitting`
/// - `Submitting` -> `Succeeded` | `Failed`
/// - `Failed` -> `Idle` (edit, retreat or retry) or `Submitting` (resubmit)
///
/// `Succeeded` is terminal until the wizard is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Validation status of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum FieldStatus {
    /// Never edited and never surfaced by a step gate; shows no error.
    Untouched,
    Valid,
    Invalid,
}

/// Snapshot of a wizard session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardState {
    pub current_step: usize,
    pub step_count: usize,
    pub values: Values,
    pub errors: ErrorMap,
    pub submission_status: SubmissionStatus,
    pub submission_error: Option<SubmissionError>,
    pub receipt: Option<Receipt>,
}

impl WizardState {
    pub(crate) fn initial(step_count: usize) -> Self {
        Self {
            current_step: 0,
            step_count,
            values: Values::new(),
            errors: ErrorMap::new(),
            submission_status: SubmissionStatus::Idle,
            submission_error: None,
            receipt: None,
        }
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 >= self.step_count
    }

    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn error(&self, key: &str) -> Option<&str> {
        self.errors.get(key).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Fraction of steps reached, `1.0` once submission succeeded.
    pub fn progress(&self) -> f32 {
        if self.submission_status == SubmissionStatus::Succeeded || self.step_count == 0 {
            return 1.0;
        }
        (self.current_step + 1) as f32 / self.step_count as f32
    }
}
