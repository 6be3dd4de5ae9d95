use form_wizard::{
    FieldKind, FieldValue, FileRef, FormField, StepDefinition, SubmissionOperation, Validator,
    Values, Wizard, WizardError,
};

use super::{answers, country_code, list_items_not_blank, number_in_range};

pub const NAME: &str = "certification_request";

pub const PRODUCT_CATEGORIES: [&str; 6] = [
    "Meat & Poultry",
    "Dairy",
    "Bakery",
    "Beverages",
    "Cosmetics",
    "Pharmaceuticals",
];

/// Request a halal certification audit for a product line.
pub fn steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::new(
            "Company",
            vec![
                FormField::new("company_name", "Company name", FieldKind::Text).required(),
                FormField::new("contact_email", "Contact email", FieldKind::Email).required(),
                FormField::new("country", "Country", FieldKind::Text)
                    .help("2-letter ISO code (e.g. MY, ID, AE)")
                    .required()
                    .validate(country_code()),
            ],
        ),
        StepDefinition::new(
            "Product",
            vec![
                FormField::new("product_name", "Product name", FieldKind::Text).required(),
                FormField::new(
                    "product_category",
                    "Category",
                    FieldKind::Select {
                        options: PRODUCT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
                    },
                )
                .required(),
                FormField::new("ingredients", "Ingredients", FieldKind::ListString)
                    .help("One entry per ingredient, including additives")
                    .required()
                    .validate(list_items_not_blank("Ingredient")),
                FormField::new("production_volume", "Monthly volume (units)", FieldKind::Number)
                    .required()
                    .validate(number_in_range(1, 10_000_000)),
            ],
        ),
        StepDefinition::new(
            "Documents",
            vec![
                FormField::new("supporting_documents", "Supporting documents", FieldKind::File)
                    .help("Ingredient specifications, supplier certificates")
                    .required(),
                FormField::new("notes", "Notes for the auditor", FieldKind::Multiline)
                    .validate(Validator::max_length(1000)),
                FormField::new(
                    "declaration",
                    "I declare the information above is accurate",
                    FieldKind::Bool,
                )
                .validate(Validator::required().message("The declaration is required")),
            ],
        ),
    ]
}

pub fn wizard(op: impl SubmissionOperation + 'static) -> Result<Wizard, WizardError> {
    Wizard::new(NAME, steps(), op)
}

pub fn sample_answers() -> Values {
    answers([
        ("company_name", "Nusantara Snacks".into()),
        ("contact_email", "qa@nusantara.example".into()),
        ("country", "ID".into()),
        ("product_name", "Rendang Crisps".into()),
        ("product_category", "Bakery".into()),
        ("ingredients", vec!["Cassava", "Coconut oil", "Chili", "Salt"].into()),
        ("production_volume", "25000".into()),
        (
            "supporting_documents",
            FieldValue::File(FileRef::new("specs.zip").size(1_204_992)),
        ),
        ("declaration", true.into()),
    ])
}
