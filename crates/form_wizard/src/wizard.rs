//! The wizard state machine.
//!
//! Responsibilities:
//! - Own the values, the error map and the touched set of one session
//! - Re-validate an edited field and every touched field that depends on it
//! - Gate forward navigation and submission on step validation
//! - Drive the injected submission operation and record its outcome
//!
//! Every transition takes `&mut self`, so one event is processed at a time.
//! Submission is split into [`Wizard::begin_submit`] and
//! [`Wizard::finish_submit`] so an event loop can run the operation elsewhere
//! while the wizard sits in `Submitting`; [`Wizard::submit`] does both.
//!
//! Rejected transitions are no-ops: they log at debug level and return the
//! unchanged snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::WizardError;
use crate::field::FormField;
use crate::state::{FieldStatus, SubmissionStatus, WizardState};
use crate::step::{ErrorMap, StepDefinition};
use crate::submission::{Receipt, SubmissionError, SubmissionOperation, SubmissionPayload};
use crate::value::{FieldValue, Values};

pub const CANCELLED: &str = "submission cancelled";
const OPERATION_PANICKED: &str = "submission failed unexpectedly";

/// A submission that has left the wizard but not yet resolved.
///
/// Created by [`Wizard::begin_submit`]; feed the result of [`run`](Self::run)
/// back through [`Wizard::finish_submit`].
pub struct PendingSubmission {
    payload: SubmissionPayload,
    operation: Arc<dyn SubmissionOperation>,
}

impl PendingSubmission {
    pub fn payload(&self) -> &SubmissionPayload {
        &self.payload
    }

    /// Run the operation. A panicking operation is reported as a failure.
    pub async fn run(self) -> Result<Receipt, SubmissionError> {
        let PendingSubmission { payload, operation } = self;
        match AssertUnwindSafe(operation.submit(payload)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => Err(SubmissionError::new(OPERATION_PANICKED)),
        }
    }
}

pub struct Wizard {
    name: String,
    steps: Vec<StepDefinition>,
    operation: Arc<dyn SubmissionOperation>,
    /// field key -> index of the step declaring it
    field_steps: BTreeMap<String, usize>,
    /// field key -> fields whose validators read it
    dependents: BTreeMap<String, BTreeSet<String>>,
    touched: BTreeSet<String>,
    state: WizardState,
}

impl Wizard {
    /// Build a wizard, checking the step wiring up front.
    pub fn new(
        name: impl Into<String>,
        steps: Vec<StepDefinition>,
        operation: impl SubmissionOperation + 'static,
    ) -> Result<Self, WizardError> {
        Self::with_operation(name.into(), steps, Arc::new(operation))
    }

    pub fn builder(name: impl Into<String>) -> WizardBuilder {
        WizardBuilder::new(name)
    }

    fn with_operation(
        name: String,
        steps: Vec<StepDefinition>,
        operation: Arc<dyn SubmissionOperation>,
    ) -> Result<Self, WizardError> {
        if steps.is_empty() {
            return Err(WizardError::NoSteps(name));
        }

        let steps: Vec<StepDefinition> = steps
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.with_index(i))
            .collect();

        let mut field_steps = BTreeMap::new();
        for step in &steps {
            for key in step.field_keys() {
                if field_steps.insert(key.to_string(), step.index()).is_some() {
                    return Err(WizardError::DuplicateField(key.to_string()));
                }
            }
        }

        let mut dependents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for field in steps.iter().flat_map(|s| s.fields.iter()) {
            for dep in field.dependencies() {
                if !field_steps.contains_key(dep) {
                    return Err(WizardError::UnknownFieldReference {
                        field: field.key.clone(),
                        references: dep.to_string(),
                    });
                }
                dependents
                    .entry(dep.to_string())
                    .or_default()
                    .insert(field.key.clone());
            }
        }

        debug!(wizard = %name, steps = steps.len(), fields = field_steps.len(), "wizard created");
        let state = WizardState::initial(steps.len());
        Ok(Self {
            name,
            steps,
            operation,
            field_steps,
            dependents,
            touched: BTreeSet::new(),
            state,
        })
    }

    // --- Read accessors -------------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    pub fn current_step_definition(&self) -> &StepDefinition {
        &self.steps[self.state.current_step]
    }

    pub fn values(&self) -> &Values {
        &self.state.values
    }

    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.state.values.get(key)
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.state.errors
    }

    pub fn error(&self, key: &str) -> Option<&str> {
        self.state.error(key)
    }

    pub fn submission_status(&self) -> SubmissionStatus {
        self.state.submission_status
    }

    pub fn submission_error(&self) -> Option<&SubmissionError> {
        self.state.submission_error.as_ref()
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.state.receipt.as_ref()
    }

    pub fn is_first_step(&self) -> bool {
        self.state.is_first_step()
    }

    pub fn is_last_step(&self) -> bool {
        self.state.is_last_step()
    }

    pub fn progress(&self) -> f32 {
        self.state.progress()
    }

    /// `None` for keys the wizard does not declare.
    pub fn field_status(&self, key: &str) -> Option<FieldStatus> {
        if !self.field_steps.contains_key(key) {
            return None;
        }
        Some(if self.state.errors.contains_key(key) {
            FieldStatus::Invalid
        } else if self.touched.contains(key) {
            FieldStatus::Valid
        } else {
            FieldStatus::Untouched
        })
    }

    pub fn field(&self, key: &str) -> Option<&FormField> {
        let step = *self.field_steps.get(key)?;
        self.steps[step].field_by_key(key)
    }

    /// Owned snapshot of the whole session.
    pub fn state(&self) -> WizardState {
        self.state.clone()
    }

    // --- Internal helpers -----------------------------------------------------------------------

    /// Edits are refused while a snapshot is in flight and after success.
    fn is_locked(&self) -> bool {
        matches!(
            self.state.submission_status,
            SubmissionStatus::Submitting | SubmissionStatus::Succeeded
        )
    }

    fn reject(&self, op: &'static str) -> WizardState {
        debug!(
            wizard = %self.name,
            op,
            status = %self.state.submission_status,
            "transition rejected"
        );
        self.state()
    }

    fn reopen_if_failed(&mut self) {
        if self.state.submission_status == SubmissionStatus::Failed {
            self.state.submission_status = SubmissionStatus::Idle;
            self.state.submission_error = None;
        }
    }

    fn revalidate(&mut self, key: &str) {
        let error = self.field(key).and_then(|f| f.check(&self.state.values));
        match error {
            Some(msg) => {
                self.state.errors.insert(key.to_string(), msg);
            }
            None => {
                self.state.errors.remove(key);
            }
        }
    }

    /// Validate the current step, mark all its fields touched and sync their
    /// errors. Returns whether the step passed.
    fn gate_current_step(&mut self) -> bool {
        let step = &self.steps[self.state.current_step];
        let failures = step.validate(&self.state.values);
        for key in step.field_keys() {
            self.touched.insert(key.to_string());
            match failures.get(key) {
                Some(msg) => {
                    self.state.errors.insert(key.to_string(), msg.clone());
                }
                None => {
                    self.state.errors.remove(key);
                }
            }
        }
        if !failures.is_empty() {
            debug!(
                wizard = %self.name,
                step = self.state.current_step,
                failing = failures.len(),
                "step validation failed"
            );
        }
        failures.is_empty()
    }

    // --- Transitions ----------------------------------------------------------------------------

    /// Store `value` for `key` and re-validate it and its touched dependents.
    ///
    /// Unknown keys are a wiring bug and return `Err`. While submitting or
    /// after success the edit is dropped.
    pub fn set_field_value(
        &mut self,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> Result<WizardState, WizardError> {
        if !self.field_steps.contains_key(key) {
            return Err(WizardError::UnknownField(key.to_string()));
        }
        if self.is_locked() {
            return Ok(self.reject("set_field_value"));
        }
        self.reopen_if_failed();

        self.state.values.insert(key.to_string(), value.into());
        self.touched.insert(key.to_string());
        self.revalidate(key);

        let dependents: Vec<String> = self
            .dependents
            .get(key)
            .map(|deps| {
                deps.iter()
                    .filter(|d| self.touched.contains(*d))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        for dep in dependents {
            self.revalidate(&dep);
        }

        Ok(self.state())
    }

    /// Move forward if the current step validates; otherwise surface its errors.
    pub fn advance_step(&mut self) -> WizardState {
        if self.is_locked() {
            return self.reject("advance_step");
        }
        if self.gate_current_step() {
            let last = self.steps.len() - 1;
            if self.state.current_step < last {
                self.state.current_step += 1;
                debug!(wizard = %self.name, step = self.state.current_step, "advanced");
            }
        }
        self.state()
    }

    /// Move back one step. Never validates and never touches values.
    pub fn retreat_step(&mut self) -> WizardState {
        if self.is_locked() {
            return self.reject("retreat_step");
        }
        self.reopen_if_failed();
        if self.state.current_step > 0 {
            self.state.current_step -= 1;
            debug!(wizard = %self.name, step = self.state.current_step, "retreated");
        }
        self.state()
    }

    /// Leave `Failed` for `Idle` on the last step, keeping every value.
    pub fn retry(&mut self) -> WizardState {
        if self.state.submission_status != SubmissionStatus::Failed {
            return self.reject("retry");
        }
        self.reopen_if_failed();
        self.state.current_step = self.steps.len() - 1;
        self.state()
    }

    /// Start over with an empty session. Refused while submitting.
    pub fn reset(&mut self) -> WizardState {
        if self.state.submission_status == SubmissionStatus::Submitting {
            return self.reject("reset");
        }
        self.touched.clear();
        self.state = WizardState::initial(self.steps.len());
        self.state()
    }

    /// Validation gate plus snapshot: enter `Submitting` and hand back the
    /// work to run.
    ///
    /// Returns `None` (state unchanged apart from surfaced errors) when not on
    /// the last step, when the last step or any earlier field is invalid, or
    /// when the status does not allow submission.
    pub fn begin_submit(&mut self) -> Option<PendingSubmission> {
        if self.is_locked() {
            self.reject("submit");
            return None;
        }
        if !self.state.is_last_step() {
            self.reject("submit");
            return None;
        }
        if !self.gate_current_step() || self.state.has_errors() {
            return None;
        }

        self.state.submission_status = SubmissionStatus::Submitting;
        self.state.submission_error = None;
        let payload = SubmissionPayload::new(&self.name, self.state.values.clone());
        info!(wizard = %self.name, fields = payload.len(), "submitting");
        Some(PendingSubmission {
            payload,
            operation: Arc::clone(&self.operation),
        })
    }

    /// Record the outcome of a submission started with [`begin_submit`](Self::begin_submit).
    pub fn finish_submit(&mut self, result: Result<Receipt, SubmissionError>) -> WizardState {
        if self.state.submission_status != SubmissionStatus::Submitting {
            warn!(wizard = %self.name, "submission result arrived while not submitting; ignored");
            return self.state();
        }
        match result {
            Ok(receipt) => {
                info!(wizard = %self.name, reference = %receipt.reference, "submission succeeded");
                self.state.submission_status = SubmissionStatus::Succeeded;
                self.state.receipt = Some(receipt);
            }
            Err(err) => {
                warn!(wizard = %self.name, error = %err, "submission failed");
                self.state.submission_status = SubmissionStatus::Failed;
                self.state.submission_error = Some(err);
            }
        }
        self.state()
    }

    /// Give up on a submission started with [`begin_submit`](Self::begin_submit)
    /// whose result will never arrive: `Submitting` moves to `Failed` with
    /// [`CANCELLED`]. Any other status is left alone.
    pub fn abandon_submit(&mut self) -> WizardState {
        if self.state.submission_status != SubmissionStatus::Submitting {
            return self.reject("abandon_submit");
        }
        self.finish_submit(Err(SubmissionError::new(CANCELLED)))
    }

    /// Validate, snapshot, run the injected operation and record the outcome.
    ///
    /// Dropping the returned future mid-flight abandons the submission, so the
    /// wizard never stays in `Submitting`.
    pub async fn submit(&mut self) -> WizardState {
        let Some(pending) = self.begin_submit() else {
            return self.state();
        };
        let guard = InFlight { wizard: self };
        let result = pending.run().await;
        guard.wizard.finish_submit(result)
    }

    /// Like [`submit`](Self::submit), but gives up when `cancel` fires and
    /// moves to `Failed` with [`CANCELLED`].
    pub async fn submit_with_cancel(&mut self, cancel: &CancellationToken) -> WizardState {
        let Some(pending) = self.begin_submit() else {
            return self.state();
        };
        let guard = InFlight { wizard: self };
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(SubmissionError::new(CANCELLED)),
            r = pending.run() => r,
        };
        guard.wizard.finish_submit(result)
    }
}

/// Held across the await in [`Wizard::submit`]; abandons the submission if
/// the future is dropped before the outcome is recorded.
struct InFlight<'a> {
    wizard: &'a mut Wizard,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.wizard.state.submission_status == SubmissionStatus::Submitting {
            warn!(wizard = %self.wizard.name, "submission dropped mid-flight; abandoning");
            self.wizard.abandon_submit();
        }
    }
}

impl fmt::Debug for Wizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wizard")
            .field("name", &self.name)
            .field("steps", &self.steps.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Incremental construction of a [`Wizard`].
pub struct WizardBuilder {
    name: String,
    steps: Vec<StepDefinition>,
    operation: Option<Arc<dyn SubmissionOperation>>,
}

impl WizardBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            operation: None,
        }
    }

    pub fn step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = StepDefinition>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn operation(mut self, operation: impl SubmissionOperation + 'static) -> Self {
        self.operation = Some(Arc::new(operation));
        self
    }

    pub fn shared_operation(mut self, operation: Arc<dyn SubmissionOperation>) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn build(self) -> Result<Wizard, WizardError> {
        let operation = self
            .operation
            .ok_or_else(|| WizardError::MissingOperation(self.name.clone()))?;
        Wizard::with_operation(self.name, self.steps, operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use crate::submission::submission_fn;
    use crate::validator::Validator;
    use crate::value::FileRef;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn accept() -> impl SubmissionOperation {
        submission_fn(|p: SubmissionPayload| async move { Ok(Receipt::new("OK-1", &p)) })
    }

    fn steps() -> Vec<StepDefinition> {
        vec![
            StepDefinition::new(
                "Business",
                vec![
                    FormField::new("name", "Name", FieldKind::Text).required(),
                    FormField::new("email", "Email", FieldKind::Email).required(),
                ],
            ),
            StepDefinition::new(
                "Account",
                vec![
                    FormField::new("password", "Password", FieldKind::Secret)
                        .required()
                        .validate(Validator::min_length(8)),
                    FormField::new("confirm_password", "Confirm", FieldKind::Secret)
                        .required()
                        .validate(Validator::equals_field("password")),
                ],
            ),
            StepDefinition::new(
                "Compliance",
                vec![
                    FormField::new("certificate", "Certificate", FieldKind::File).required(),
                    FormField::new("agree_terms", "Terms", FieldKind::Bool).required(),
                ],
            ),
        ]
    }

    fn wizard() -> Wizard {
        Wizard::new("vendor", steps(), accept()).expect("valid wiring")
    }

    fn fill_to_last(w: &mut Wizard) {
        w.set_field_value("name", "Al Noor Foods").unwrap();
        w.set_field_value("email", "ops@alnoor.example").unwrap();
        w.advance_step();
        w.set_field_value("password", "abc123!!").unwrap();
        w.set_field_value("confirm_password", "abc123!!").unwrap();
        w.advance_step();
        w.set_field_value("certificate", FileRef::new("halal.pdf")).unwrap();
        w.set_field_value("agree_terms", true).unwrap();
        assert!(w.is_last_step());
    }

    #[test]
    fn construction_rejects_bad_wiring() {
        let err = Wizard::new("empty", vec![], accept()).unwrap_err();
        assert_eq!(err, WizardError::NoSteps("empty".into()));

        let dup = vec![
            StepDefinition::new("a", vec![FormField::new("x", "X", FieldKind::Text)]),
            StepDefinition::new("b", vec![FormField::new("x", "X", FieldKind::Text)]),
        ];
        assert_eq!(
            Wizard::new("dup", dup, accept()).unwrap_err(),
            WizardError::DuplicateField("x".into())
        );

        let dangling = vec![StepDefinition::new(
            "a",
            vec![FormField::new("confirm", "C", FieldKind::Secret)
                .validate(Validator::equals_field("pasword"))],
        )];
        assert_eq!(
            Wizard::new("typo", dangling, accept()).unwrap_err(),
            WizardError::UnknownFieldReference {
                field: "confirm".into(),
                references: "pasword".into()
            }
        );

        let missing = Wizard::builder("no-op").steps(steps()).build().unwrap_err();
        assert_eq!(missing, WizardError::MissingOperation("no-op".into()));
    }

    #[test]
    fn starts_untouched_on_first_step() {
        let w = wizard();
        assert_eq!(w.current_step(), 0);
        assert_eq!(w.step(2).map(|s| s.index()), Some(2));
        assert!(w.values().is_empty());
        assert!(w.errors().is_empty());
        assert_eq!(w.submission_status(), SubmissionStatus::Idle);
        assert_eq!(w.field_status("name"), Some(FieldStatus::Untouched));
        assert_eq!(w.field_status("nope"), None);
    }

    #[test]
    fn unknown_field_is_a_programmer_error() {
        let mut w = wizard();
        assert_eq!(
            w.set_field_value("colour", "green").unwrap_err(),
            WizardError::UnknownField("colour".into())
        );
    }

    #[test]
    fn edit_sets_and_clears_field_error() {
        let mut w = wizard();
        let s = w.set_field_value("email", "bad").unwrap();
        assert_eq!(s.error("email"), Some("invalid format"));
        assert_eq!(w.field_status("email"), Some(FieldStatus::Invalid));

        let s = w.set_field_value("email", "ops@alnoor.example").unwrap();
        assert_eq!(s.error("email"), None);
        assert_eq!(w.field_status("email"), Some(FieldStatus::Valid));
        // other fields stay quiet until touched
        assert_eq!(s.error("name"), None);
        assert_eq!(w.field_status("name"), Some(FieldStatus::Untouched));
    }

    #[test]
    fn advance_blocked_surfaces_all_errors() {
        let mut w = wizard();
        w.set_field_value("name", "").unwrap();
        w.set_field_value("email", "bad").unwrap();
        let s = w.advance_step();

        assert_eq!(s.current_step, 0);
        let expected: ErrorMap = [
            ("email".to_string(), "invalid format".to_string()),
            ("name".to_string(), "required".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(s.errors, expected);
    }

    #[test]
    fn advance_on_untouched_step_surfaces_required() {
        let mut w = wizard();
        let s = w.advance_step();
        assert_eq!(s.current_step, 0);
        assert_eq!(s.error("name"), Some("required"));
        assert_eq!(s.error("email"), Some("required"));
        assert_eq!(w.field_status("email"), Some(FieldStatus::Invalid));
    }

    #[test]
    fn password_confirmation_follows_both_fields() {
        let mut w = wizard();
        w.set_field_value("name", "n").unwrap();
        w.set_field_value("email", "a@b.co").unwrap();
        w.advance_step();

        // confirm untouched: editing password does not flag it
        let s = w.set_field_value("password", "abc123!!").unwrap();
        assert_eq!(s.error("confirm_password"), None);

        let s = w.set_field_value("confirm_password", "abc123!?").unwrap();
        assert_eq!(s.error("confirm_password"), Some("does not match password"));

        // fixing the referenced field clears the dependent error
        let s = w.set_field_value("password", "abc123!?").unwrap();
        assert_eq!(s.error("confirm_password"), None);

        let s = w.set_field_value("password", "abc123!!!").unwrap();
        assert_eq!(s.error("confirm_password"), Some("does not match password"));

        w.set_field_value("password", "abc123!!").unwrap();
        w.set_field_value("confirm_password", "abc123!!").unwrap();
        let s = w.advance_step();
        assert_eq!(s.current_step, 2);
        assert!(s.error("password").is_none() && s.error("confirm_password").is_none());
    }

    #[test]
    fn retreat_keeps_values_and_never_validates() {
        let mut w = wizard();
        w.set_field_value("name", "Al Noor").unwrap();
        w.set_field_value("email", "a@b.co").unwrap();
        w.advance_step();
        w.set_field_value("password", "short").unwrap();
        let before = w.values().clone();

        let s = w.retreat_step();
        assert_eq!(s.current_step, 0);
        assert_eq!(s.values, before);
        assert_eq!(s.error("password"), Some("must be at least 8 characters"));

        let s = w.retreat_step();
        assert_eq!(s.current_step, 0, "clamped at first step");
    }

    #[test]
    fn advance_clamps_on_last_step() {
        let mut w = wizard();
        fill_to_last(&mut w);
        let s = w.advance_step();
        assert_eq!(s.current_step, 2);
        assert!(s.errors.is_empty());
    }

    #[test]
    fn reads_are_idempotent() {
        let mut w = wizard();
        w.set_field_value("name", "x").unwrap();
        assert_eq!(w.values().clone(), w.values().clone());
        assert_eq!(w.state(), w.state());
    }

    #[test]
    fn submit_outside_last_step_is_refused() {
        let mut w = wizard();
        w.set_field_value("name", "x").unwrap();
        assert!(w.begin_submit().is_none());
        assert_eq!(w.submission_status(), SubmissionStatus::Idle);
    }

    #[test]
    fn submit_requires_valid_last_step() {
        let mut w = wizard();
        fill_to_last(&mut w);
        w.set_field_value("agree_terms", false).unwrap();
        assert!(w.begin_submit().is_none());
        assert_eq!(w.error("agree_terms"), Some("required"));
        assert_eq!(w.submission_status(), SubmissionStatus::Idle);
    }

    #[test]
    fn submit_refuses_stale_errors_from_earlier_steps() {
        let mut w = wizard();
        fill_to_last(&mut w);
        w.set_field_value("email", "broken").unwrap();
        assert!(w.begin_submit().is_none());
        assert_eq!(w.submission_status(), SubmissionStatus::Idle);
    }

    #[test]
    fn writes_are_dropped_while_submitting() {
        let mut w = wizard();
        fill_to_last(&mut w);
        let pending = w.begin_submit().expect("valid form");
        assert_eq!(w.submission_status(), SubmissionStatus::Submitting);
        let frozen = w.state();

        assert_eq!(w.set_field_value("name", "changed").unwrap(), frozen);
        assert_eq!(w.advance_step(), frozen);
        assert_eq!(w.retreat_step(), frozen);
        assert_eq!(w.reset(), frozen);
        assert!(w.begin_submit().is_none(), "second submit is a no-op");
        assert_eq!(w.state(), frozen);

        // the snapshot is what was valid at submit time
        assert_eq!(
            pending.payload().get("name"),
            Some(&FieldValue::from("Al Noor Foods"))
        );
    }

    #[tokio::test]
    async fn failed_submission_keeps_values_and_allows_resubmit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let op = submission_fn(move |p: SubmissionPayload| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(SubmissionError::new("network down"))
                } else {
                    Ok(Receipt::new("OK-2", &p))
                }
            }
        });
        let mut w = Wizard::new("vendor", steps(), op).unwrap();
        fill_to_last(&mut w);
        let before = w.values().clone();

        let s = w.submit().await;
        assert_eq!(s.submission_status, SubmissionStatus::Failed);
        assert_eq!(s.values, before);
        assert_eq!(
            s.submission_error.as_ref().map(|e| e.message.as_str()),
            Some("network down")
        );

        let s = w.submit().await;
        assert_eq!(s.submission_status, SubmissionStatus::Succeeded);
        assert_eq!(s.receipt.map(|r| r.reference), Some("OK-2".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn editing_after_failure_reopens_the_wizard() {
        let op = submission_fn(|_p| async { Err(SubmissionError::new("rejected")) });
        let mut w = Wizard::new("vendor", steps(), op).unwrap();
        fill_to_last(&mut w);
        w.submit().await;
        assert_eq!(w.submission_status(), SubmissionStatus::Failed);

        let s = w.set_field_value("agree_terms", true).unwrap();
        assert_eq!(s.submission_status, SubmissionStatus::Idle);
        assert_eq!(s.submission_error, None);
    }

    #[tokio::test]
    async fn retry_returns_to_last_step() {
        let op = submission_fn(|_p| async { Err(SubmissionError::new("rejected")) });
        let mut w = Wizard::new("vendor", steps(), op).unwrap();
        fill_to_last(&mut w);
        w.submit().await;

        let s = w.retry();
        assert_eq!(s.submission_status, SubmissionStatus::Idle);
        assert_eq!(s.current_step, 2);
        // retry is only meaningful from Failed
        assert_eq!(w.retry(), s);
    }

    #[tokio::test]
    async fn success_is_terminal_until_reset() {
        let mut w = wizard();
        fill_to_last(&mut w);
        let s = w.submit().await;
        assert_eq!(s.submission_status, SubmissionStatus::Succeeded);
        assert_eq!(w.progress(), 1.0);

        let after = w.set_field_value("name", "other").unwrap();
        assert_eq!(after, s);
        assert_eq!(w.retreat_step(), s);
        assert_eq!(w.submit().await, s);

        let fresh = w.reset();
        assert_eq!(fresh.current_step, 0);
        assert!(fresh.values.is_empty());
        assert_eq!(fresh.submission_status, SubmissionStatus::Idle);
        assert_eq!(w.field_status("name"), Some(FieldStatus::Untouched));
    }

    #[tokio::test]
    async fn panicking_operation_is_a_failure() {
        let op = submission_fn(|_p| async {
            if true {
                panic!("transport exploded");
            }
            Err(SubmissionError::new("unreachable"))
        });
        let mut w = Wizard::new("vendor", steps(), op).unwrap();
        fill_to_last(&mut w);
        let s = w.submit().await;
        assert_eq!(s.submission_status, SubmissionStatus::Failed);
        assert_eq!(
            s.submission_error.map(|e| e.message),
            Some(OPERATION_PANICKED.to_string())
        );
    }

    #[tokio::test]
    async fn cancellation_moves_to_failed() {
        let op = submission_fn(|p: SubmissionPayload| async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Receipt::new("late", &p))
        });
        let mut w = Wizard::new("vendor", steps(), op).unwrap();
        fill_to_last(&mut w);

        let token = CancellationToken::new();
        token.cancel();
        let s = w.submit_with_cancel(&token).await;
        assert_eq!(s.submission_status, SubmissionStatus::Failed);
        assert_eq!(s.submission_error.map(|e| e.message), Some(CANCELLED.to_string()));
        assert_eq!(w.values().len(), 6);
    }

    #[tokio::test]
    async fn dropped_submit_future_leaves_submitting() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let op = submission_fn(move |p: SubmissionPayload| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
                Ok(Receipt::new("OK-3", &p))
            }
        });
        let mut w = Wizard::new("vendor", steps(), op).unwrap();
        fill_to_last(&mut w);

        let timed_out = tokio::time::timeout(Duration::from_millis(10), w.submit()).await;
        assert!(timed_out.is_err());
        assert_eq!(w.submission_status(), SubmissionStatus::Failed);
        assert_eq!(w.submission_error().map(|e| e.message.as_str()), Some(CANCELLED));

        assert_eq!(w.retry().submission_status, SubmissionStatus::Idle);
        let s = w.submit().await;
        assert_eq!(s.submission_status, SubmissionStatus::Succeeded);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn abandon_releases_a_split_submission() {
        let mut w = wizard();
        fill_to_last(&mut w);
        let pending = w.begin_submit().expect("valid form");
        drop(pending);

        let s = w.abandon_submit();
        assert_eq!(s.submission_status, SubmissionStatus::Failed);
        assert_eq!(s.values.len(), 6);
        // nothing in flight any more
        assert_eq!(w.abandon_submit(), s);
        assert_eq!(w.reset().submission_status, SubmissionStatus::Idle);
    }

    #[test]
    fn mismatched_value_shape_is_a_field_error() {
        let mut w = wizard();
        let s = w.set_field_value("email", true).unwrap();
        assert_eq!(s.error("email"), Some(crate::field::INVALID_TYPE));
        w.set_field_value("name", "Al Noor").unwrap();
        assert_eq!(w.advance_step().current_step, 0);
    }

    #[test]
    fn late_result_without_pending_submission_is_ignored() {
        let mut w = wizard();
        let s = w.finish_submit(Err(SubmissionError::new("stray")));
        assert_eq!(s.submission_status, SubmissionStatus::Idle);
        assert_eq!(s.submission_error, None);
    }
}
