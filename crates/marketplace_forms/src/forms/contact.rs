use form_wizard::{
    FieldKind, FormField, StepDefinition, SubmissionOperation, Validator, Values, Wizard,
    WizardError,
};

use super::answers;

pub const NAME: &str = "contact";

/// Single-step contact form; the wizard degenerates to validate-then-submit.
pub fn steps() -> Vec<StepDefinition> {
    vec![StepDefinition::new(
        "Contact us",
        vec![
            FormField::new("name", "Your name", FieldKind::Text).required(),
            FormField::new("email", "Email", FieldKind::Email).required(),
            FormField::new("subject", "Subject", FieldKind::Text)
                .required()
                .validate(Validator::max_length(150)),
            FormField::new("message", "Message", FieldKind::Multiline)
                .required()
                .validate(Validator::min_length(10))
                .validate(Validator::max_length(2000)),
        ],
    )]
}

pub fn wizard(op: impl SubmissionOperation + 'static) -> Result<Wizard, WizardError> {
    Wizard::new(NAME, steps(), op)
}

pub fn sample_answers() -> Values {
    answers([
        ("name", "Aisha Rahman".into()),
        ("email", "aisha@example.org".into()),
        ("subject", "Certification timeline".into()),
        (
            "message",
            "How long does a certification audit usually take for a bakery?".into(),
        ),
    ])
}
