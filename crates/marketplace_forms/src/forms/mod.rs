//! Declarative wizards used by the marketplace site.
//!
//! Each form module exposes `steps()` (the static definition), `wizard(op)`
//! (a ready wizard bound to a submission operation) and `sample_answers()`
//! (a complete, valid set of answers used by the demo and tests).

pub mod certification;
pub mod contact;
pub mod vendor;

use clap::ValueEnum;
use form_wizard::{
    FieldValue, StepDefinition, SubmissionOperation, Validator, Values, Wizard, WizardError,
};
use strum::{Display, EnumIter};

/// The forms the demo binary can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum FormKind {
    Vendor,
    Certification,
    Contact,
}

impl FormKind {
    /// Wizard name, also carried by the submission payload.
    pub fn wizard_name(self) -> &'static str {
        match self {
            FormKind::Vendor => vendor::NAME,
            FormKind::Certification => certification::NAME,
            FormKind::Contact => contact::NAME,
        }
    }

    pub fn steps(self) -> Vec<StepDefinition> {
        match self {
            FormKind::Vendor => vendor::steps(),
            FormKind::Certification => certification::steps(),
            FormKind::Contact => contact::steps(),
        }
    }

    pub fn wizard(self, op: impl SubmissionOperation + 'static) -> Result<Wizard, WizardError> {
        match self {
            FormKind::Vendor => vendor::wizard(op),
            FormKind::Certification => certification::wizard(op),
            FormKind::Contact => contact::wizard(op),
        }
    }

    pub fn sample_answers(self) -> Values {
        match self {
            FormKind::Vendor => vendor::sample_answers(),
            FormKind::Certification => certification::sample_answers(),
            FormKind::Contact => contact::sample_answers(),
        }
    }
}

// --- Reusable validators ------------------------------------------------------------------------

/// Compile a pattern that ships with the binary. A typo here is a wiring bug
/// and should fail on first use, like any other construction error.
pub(crate) fn pattern(re: &str, message: &str) -> Validator {
    Validator::pattern(re)
        .unwrap_or_else(|e| panic!("built-in pattern {re:?} does not compile: {e}"))
        .message(message)
}

pub(crate) fn phone() -> Validator {
    pattern(r"^\+?[0-9][0-9 \-]{6,19}$", "Must be a phone number, e.g. +60 3 1234 5678")
}

pub(crate) fn country_code() -> Validator {
    Validator::custom("Country must be a 2-letter ISO code (A-Z)", |v, _| {
        v.as_text().is_some_and(|s| {
            let cc = s.trim();
            cc.len() == 2 && cc.chars().all(|c| c.is_ascii_alphabetic())
        })
    })
}

pub(crate) fn number_in_range(min: i64, max: i64) -> Validator {
    Validator::custom(format!("Must be a number in range [{min}..{max}]"), move |v, _| {
        matches!(
            v.as_text().map(|s| s.trim().parse::<i64>()),
            Some(Ok(n)) if n >= min && n <= max
        )
    })
}

pub(crate) fn list_items_not_blank(label: &'static str) -> Validator {
    Validator::custom(format!("{label} entries must not be empty"), |v, _| {
        v.as_list()
            .is_some_and(|items| items.iter().all(|i| !i.trim().is_empty()))
    })
}

pub(crate) fn answers<const N: usize>(pairs: [(&str, FieldValue); N]) -> Values {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(v: &Validator, value: impl Into<FieldValue>) -> Option<String> {
        v.check("f", Some(&value.into()), &Values::new())
    }

    #[test]
    fn country_code_valid() {
        for code in ["US", "my", "Id", "AE"] {
            assert!(check(&country_code(), code).is_none(), "expected OK for {code}");
        }
    }

    #[test]
    fn country_code_invalid() {
        for code in ["U", "USA", "1A", "A1", " D ", "U S"] {
            assert!(check(&country_code(), code).is_some(), "expected Err for {code:?}");
        }
    }

    #[test]
    fn number_range() {
        let v = number_in_range(1, 825);
        for ok in ["1", "825", " 10 "] {
            assert!(check(&v, ok).is_none(), "{ok:?}");
        }
        for bad in ["0", "826", "-1", "abc"] {
            assert_eq!(
                check(&v, bad),
                Some("Must be a number in range [1..825]".into()),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn phone_numbers() {
        for ok in ["+60312345678", "+60 3 1234 5678", "012-3456789"] {
            assert!(check(&phone(), ok).is_none(), "{ok:?}");
        }
        for bad in ["12345", "phone", "+60 3 1234 5678 ext 9"] {
            assert!(check(&phone(), bad).is_some(), "{bad:?}");
        }
    }

    #[test]
    fn list_items() {
        let v = list_items_not_blank("Ingredient");
        assert!(check(&v, vec!["beef", "salt"]).is_none());
        assert_eq!(
            check(&v, vec!["beef", "  "]),
            Some("Ingredient entries must not be empty".into())
        );
    }

    #[test]
    fn kind_builds_the_matching_wizard() {
        use form_wizard::{submission_fn, Receipt, SubmissionPayload};
        use strum::IntoEnumIterator;
        for kind in FormKind::iter() {
            let op = submission_fn(|p: SubmissionPayload| async move { Ok(Receipt::new("T", &p)) });
            let w = kind.wizard(op).unwrap();
            assert_eq!(w.name(), kind.wizard_name());
            assert_eq!(w.step_count(), kind.steps().len());
        }
    }

    #[test]
    fn kinds_have_distinct_names() {
        use strum::IntoEnumIterator;
        let names: Vec<String> = FormKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(names, ["vendor", "certification", "contact"]);
    }
}
