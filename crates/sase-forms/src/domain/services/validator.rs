//! Field validation service
//!
//! Rules run in list order and the first failing rule's message wins.
//! Format rules (`minLength`, `maxLength`, `email`, `password`) only look at
//! non-blank text, so absence is rejected only by `required` / `notEmpty`.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::aggregates::FormSchema;
use crate::domain::value_objects::{ErrorMap, FieldValue, RuleKind, ValidationRule, ValueMap};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const PASSWORD_MIN_CHARS: usize = 8;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

/// Field validation domain service
pub struct Validator;

impl Validator {
    /// Message of the first failing rule, or `None` when every rule passes.
    pub fn validate<'r>(value: &FieldValue, rules: &'r [ValidationRule]) -> Option<&'r str> {
        rules
            .iter()
            .find(|rule| !Self::passes(rule, value))
            .map(|rule| rule.message.as_str())
    }

    /// Whether a single rule accepts `value`.
    pub fn passes(rule: &ValidationRule, value: &FieldValue) -> bool {
        match rule.kind {
            // Identical predicates; both kinds exist in saved schemas.
            RuleKind::Required | RuleKind::NotEmpty => !value.is_blank(),
            RuleKind::MinLength => match (present_text(value), rule.length()) {
                (Some(text), Some(min)) => text.chars().count() >= min,
                _ => true,
            },
            RuleKind::MaxLength => match (present_text(value), rule.length()) {
                (Some(text), Some(max)) => text.chars().count() <= max,
                _ => true,
            },
            RuleKind::Email => present_text(value).map_or(true, |text| email_regex().is_match(text)),
            RuleKind::Password => present_text(value).map_or(true, is_strong_password),
        }
    }

    /// Validate every field of `form` against `values`.
    pub fn validate_all(form: &FormSchema, values: &ValueMap) -> ErrorMap {
        let empty = FieldValue::Empty;
        form.sorted_fields()
            .into_iter()
            .filter_map(|field| {
                let value = values.get(&field.id).unwrap_or(&empty);
                Self::validate(value, &field.validation_rules)
                    .map(|message| (field.id.clone(), message.to_string()))
            })
            .collect()
    }
}

/// Text that format rules should inspect; blank text counts as absent.
fn present_text(value: &FieldValue) -> Option<&str> {
    value.as_str().filter(|text| !text.trim().is_empty())
}

fn is_strong_password(text: &str) -> bool {
    text.chars().count() >= PASSWORD_MIN_CHARS && text.chars().any(|c| c.is_ascii_digit())
}
