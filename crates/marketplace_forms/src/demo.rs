//! Headless driver: feeds an answers map through a wizard the way a user
//! would, one step at a time.

use std::fmt::Write as _;
use std::path::Path;

use color_eyre::{eyre::WrapErr, Result};
use form_wizard::{
    ErrorMap, FieldKind, StepDefinition, SubmissionStatus, Values, Wizard, WizardError,
    WizardState,
};
use tracing::debug;

/// What happened on one step of the walk.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub index: usize,
    pub title: String,
    /// Whether the step let the walk continue (advanced, or submitted).
    pub passed: bool,
    /// Errors surfaced when leaving (or submitting) the step.
    pub errors: ErrorMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoOutcome {
    pub steps: Vec<StepReport>,
    pub state: WizardState,
}

impl DemoOutcome {
    /// The step the walk stopped on because it did not validate.
    pub fn blocked_at(&self) -> Option<usize> {
        self.steps.iter().find(|r| !r.passed).map(|r| r.index)
    }
}

/// Fill each step from `answers`, advance, and submit on the last step.
///
/// Stops at the first step that does not validate. Answers for fields the
/// wizard does not know are rejected before anything is entered.
pub async fn drive(wizard: &mut Wizard, answers: &Values) -> Result<DemoOutcome, WizardError> {
    if let Some(unknown) = answers.keys().find(|k| wizard.field(k).is_none()) {
        return Err(WizardError::UnknownField(unknown.clone()));
    }

    let mut steps = Vec::with_capacity(wizard.step_count());
    loop {
        let index = wizard.current_step();
        let definition = wizard.current_step_definition();
        let title = definition.title.clone();
        let keys: Vec<String> = definition.field_keys().map(str::to_string).collect();

        for key in keys {
            if let Some(value) = answers.get(&key) {
                wizard.set_field_value(&key, value.clone())?;
            }
        }

        if wizard.is_last_step() {
            let state = wizard.submit().await;
            let passed = state.submission_status != SubmissionStatus::Idle;
            debug!(step = index, status = %state.submission_status, "last step submitted");
            steps.push(StepReport {
                index,
                title,
                passed,
                errors: state.errors.clone(),
            });
            return Ok(DemoOutcome { steps, state });
        }

        let state = wizard.advance_step();
        let passed = state.current_step > index;
        debug!(step = index, passed, "step walked");
        steps.push(StepReport {
            index,
            title,
            passed,
            errors: if passed { ErrorMap::new() } else { state.errors.clone() },
        });
        if !passed {
            return Ok(DemoOutcome { steps, state });
        }
    }
}

/// Read an answers file: a JSON object of field key to value.
pub fn load_answers(path: &Path) -> Result<Values> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading answers from {}", path.display()))?;
    let values: Values = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("{} is not a JSON object of field answers", path.display()))?;
    Ok(values)
}

/// Human-readable listing of a form's steps and fields.
pub fn describe_steps(steps: &[StepDefinition]) -> String {
    let mut out = String::new();
    for (i, step) in steps.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, step.title);
        for field in &step.fields {
            let marker = if field.is_required() { "*" } else { " " };
            let kind = match &field.kind {
                FieldKind::Select { options } => format!("select: {}", options.join(" | ")),
                other => format!("{other:?}").to_lowercase(),
            };
            let _ = writeln!(out, "   {marker} {:<22} {} ({kind})", field.key, field.label);
        }
    }
    out
}
