use form_wizard::{
    FieldKind, FieldValue, FileRef, FormField, StepDefinition, SubmissionOperation, Validator,
    Values, Wizard, WizardError,
};

use super::{answers, list_items_not_blank, pattern, phone};

pub const NAME: &str = "vendor_registration";

pub const BUSINESS_TYPES: [&str; 5] = [
    "Manufacturer",
    "Distributor",
    "Retailer",
    "Restaurant",
    "Abattoir",
];

/// Three-step vendor onboarding:
/// 1. Business details
/// 2. Account credentials (password + confirmation)
/// 3. Compliance (halal certificate, product categories, terms)
pub fn steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::new(
            "Business details",
            vec![
                FormField::new("business_name", "Business name", FieldKind::Text)
                    .help("Registered trading name")
                    .required()
                    .validate(Validator::max_length(120)),
                FormField::new("email", "Business email", FieldKind::Email)
                    .help("Used for certification notices")
                    .required(),
                FormField::new("phone", "Phone", FieldKind::Text)
                    .required()
                    .validate(phone()),
                FormField::new(
                    "business_type",
                    "Business type",
                    FieldKind::Select {
                        options: BUSINESS_TYPES.iter().map(|s| s.to_string()).collect(),
                    },
                )
                .required(),
                FormField::new("website", "Website", FieldKind::Text)
                    .help("Optional")
                    .validate(pattern(
                        r"^https?://\S+\.\S+$",
                        "Must start with http:// or https://",
                    )),
            ],
        )
        .description("Tell buyers who you are."),
        StepDefinition::new(
            "Account",
            vec![
                FormField::new("password", "Password", FieldKind::Secret)
                    .required()
                    .validate(Validator::min_length(8)),
                FormField::new("confirm_password", "Confirm password", FieldKind::Secret)
                    .required()
                    .validate(
                        Validator::equals_field("password").message("Passwords do not match"),
                    ),
            ],
        ),
        StepDefinition::new(
            "Compliance",
            vec![
                FormField::new("halal_certificate", "Halal certificate", FieldKind::File)
                    .help("PDF or image of your current certificate")
                    .required(),
                FormField::new("categories", "Product categories", FieldKind::ListString)
                    .required()
                    .validate(list_items_not_blank("Category")),
                FormField::new("agree_terms", "I accept the marketplace terms", FieldKind::Bool)
                    .validate(Validator::required().message("You must accept the terms")),
            ],
        )
        .description("Upload your certificate and confirm the marketplace terms."),
    ]
}

pub fn wizard(op: impl SubmissionOperation + 'static) -> Result<Wizard, WizardError> {
    Wizard::new(NAME, steps(), op)
}

pub fn sample_answers() -> Values {
    answers([
        ("business_name", "Barakah Meats Sdn Bhd".into()),
        ("email", "sales@barakah-meats.example".into()),
        ("phone", "+60 3 1234 5678".into()),
        ("business_type", "Abattoir".into()),
        ("password", "s3cure-pass".into()),
        ("confirm_password", "s3cure-pass".into()),
        (
            "halal_certificate",
            FieldValue::File(
                FileRef::new("jakim-certificate.pdf")
                    .size(182_044)
                    .content_type("application/pdf"),
            ),
        ),
        ("categories", vec!["Beef", "Poultry"].into()),
        ("agree_terms", true.into()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_wizard::{submission_fn, Receipt, SubmissionPayload, SubmissionStatus};

    fn wizard_ok() -> Wizard {
        wizard(submission_fn(|p: SubmissionPayload| async move {
            Ok(Receipt::new("T-1", &p))
        }))
        .expect("vendor wiring")
    }

    #[test]
    fn optional_website_only_checked_when_filled() {
        let mut w = wizard_ok();
        assert_eq!(w.set_field_value("website", "").unwrap().error("website"), None);
        assert_eq!(
            w.set_field_value("website", "barakah.example")
                .unwrap()
                .error("website"),
            Some("Must start with http:// or https://")
        );
    }

    #[test]
    fn terms_must_be_accepted() {
        let mut w = wizard_ok();
        let s = w.set_field_value("agree_terms", false).unwrap();
        assert_eq!(s.error("agree_terms"), Some("You must accept the terms"));
    }

    #[tokio::test]
    async fn sample_answers_register_a_vendor() {
        let mut w = wizard_ok();
        let sample = sample_answers();
        for step in 0..w.step_count() {
            let keys: Vec<String> = w.steps()[step].field_keys().map(str::to_string).collect();
            for key in keys {
                if let Some(v) = sample.get(&key) {
                    w.set_field_value(&key, v.clone()).unwrap();
                }
            }
            w.advance_step();
        }
        let s = w.submit().await;
        assert_eq!(s.submission_status, SubmissionStatus::Succeeded, "{:?}", s.errors);
    }
}
