//! Field definition value objects

use serde::{Deserialize, Serialize};

use super::{DerivedLogic, FieldId, FieldValue, ValidationRule};

/// Semantic input type of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    /// Multi-line text
    Textarea,
    /// Single-select dropdown
    Select,
    Radio,
    /// Single checkbox, or a checkbox group when options are present
    Checkbox,
    Date,
}

impl FieldType {
    pub const ALL: [FieldType; 7] = [
        Self::Text,
        Self::Number,
        Self::Textarea,
        Self::Select,
        Self::Radio,
        Self::Checkbox,
        Self::Date,
    ];

    /// Choice types render from `options`.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Select | Self::Radio | Self::Checkbox)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Date => "date",
        }
    }

    /// Label given to a freshly added field, e.g. `Radio Field`.
    pub fn default_label(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => format!("{}{} Field", first.to_ascii_uppercase(), chars.as_str()),
            None => "Field".to_string(),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown field type: {}", s))
    }
}

/// Label/value pair offered by choice fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A single input of a form schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: FieldId,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    #[serde(default)]
    pub validation_rules: Vec<ValidationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    #[serde(default)]
    pub is_derived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_logic: Option<DerivedLogic>,
    pub order: u32,
}

impl FieldDefinition {
    /// New field with builder defaults: generated id, `"<Type> Field"` label,
    /// and two placeholder options for choice types.
    pub fn new(field_type: FieldType, order: u32) -> Self {
        let options = field_type.is_choice().then(|| {
            vec![
                SelectOption::new("Option 1", "option1"),
                SelectOption::new("Option 2", "option2"),
            ]
        });
        Self {
            id: FieldId::new(),
            field_type,
            label: field_type.default_label(),
            placeholder: None,
            required: false,
            default_value: None,
            validation_rules: vec![],
            options,
            is_derived: false,
            derived_logic: None,
            order,
        }
    }

    pub fn with_id(mut self, id: impl Into<FieldId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation_rules.push(rule);
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = Some(options);
        self
    }

    /// Mark the field derived from `logic`.
    pub fn derived(mut self, logic: DerivedLogic) -> Self {
        self.is_derived = true;
        self.derived_logic = Some(logic);
        self
    }

    /// The formula to evaluate, when the field is derived and has one.
    pub fn formula(&self) -> Option<&str> {
        if !self.is_derived {
            return None;
        }
        self.derived_logic
            .as_ref()
            .map(|logic| logic.formula.as_str())
            .filter(|formula| !formula.trim().is_empty())
    }

    pub fn options(&self) -> &[SelectOption] {
        self.options.as_deref().unwrap_or(&[])
    }
}
