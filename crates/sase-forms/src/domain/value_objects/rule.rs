//! Validation rule value object

use serde::{Deserialize, Serialize};

/// Message used for rules added from the builder without customization.
pub const DEFAULT_REQUIRED_MESSAGE: &str = "This field is required";

/// Kind of validation predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    Required,
    NotEmpty,
    MinLength,
    MaxLength,
    Email,
    Password,
}

impl RuleKind {
    /// Length rules are the only kinds that read a parameter.
    pub fn takes_parameter(&self) -> bool {
        matches!(self, Self::MinLength | Self::MaxLength)
    }
}

/// Rule parameter as entered in the builder: a number, or text holding one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleParam {
    Number(f64),
    Text(String),
}

impl RuleParam {
    /// The parameter as a character count, if it is a non-negative number.
    pub fn as_length(&self) -> Option<usize> {
        let n = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        if n.is_finite() && n >= 0.0 {
            Some(n.floor() as usize)
        } else {
            None
        }
    }
}

/// A single validation predicate with its user-facing failure message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RuleParam>,
    pub message: String,
}

impl ValidationRule {
    pub fn new(kind: RuleKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            value: None,
            message: message.into(),
        }
    }

    pub fn required(message: impl Into<String>) -> Self {
        Self::new(RuleKind::Required, message)
    }

    pub fn not_empty(message: impl Into<String>) -> Self {
        Self::new(RuleKind::NotEmpty, message)
    }

    pub fn min_length(length: usize, message: impl Into<String>) -> Self {
        Self {
            value: Some(RuleParam::Number(length as f64)),
            ..Self::new(RuleKind::MinLength, message)
        }
    }

    pub fn max_length(length: usize, message: impl Into<String>) -> Self {
        Self {
            value: Some(RuleParam::Number(length as f64)),
            ..Self::new(RuleKind::MaxLength, message)
        }
    }

    pub fn email(message: impl Into<String>) -> Self {
        Self::new(RuleKind::Email, message)
    }

    pub fn password(message: impl Into<String>) -> Self {
        Self::new(RuleKind::Password, message)
    }

    /// Length parameter for `minLength`/`maxLength`.
    pub fn length(&self) -> Option<usize> {
        self.value.as_ref().and_then(RuleParam::as_length)
    }
}

impl Default for ValidationRule {
    fn default() -> Self {
        Self::required(DEFAULT_REQUIRED_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_wire_format() {
        let rule = ValidationRule::min_length(3, "Too short");
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "minLength", "value": 3.0, "message": "Too short" })
        );

        let parsed: ValidationRule =
            serde_json::from_str(r#"{"type":"notEmpty","message":"Fill me"}"#).unwrap();
        assert_eq!(parsed.kind, RuleKind::NotEmpty);
        assert!(parsed.value.is_none());
    }

    #[test]
    fn test_length_parameter() {
        assert_eq!(RuleParam::Number(5.0).as_length(), Some(5));
        assert_eq!(RuleParam::Text(" 8 ".into()).as_length(), Some(8));
        assert_eq!(RuleParam::Text("eight".into()).as_length(), None);
        assert_eq!(RuleParam::Number(-1.0).as_length(), None);
        assert_eq!(RuleParam::Number(f64::NAN).as_length(), None);
    }

    #[test]
    fn test_default_rule_is_required() {
        let rule = ValidationRule::default();
        assert_eq!(rule.kind, RuleKind::Required);
        assert_eq!(rule.message, DEFAULT_REQUIRED_MESSAGE);
        assert!(!rule.kind.takes_parameter());
    }
}
