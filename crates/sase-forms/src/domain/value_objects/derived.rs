//! Derived field logic and placeholder scanning
//!
//! Formulas reference other fields with `{fieldId}` tokens. A token is a `{`,
//! one or more characters other than braces, and a closing `}`.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::FieldId;

/// Formula configuration of a derived field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedLogic {
    /// Fields the author declared as inputs. Informational: the formula's
    /// own tokens decide what is actually read.
    #[serde(default)]
    pub parent_fields: Vec<FieldId>,
    pub formula: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DerivedLogic {
    pub fn new(formula: impl Into<String>) -> Self {
        Self {
            formula: formula.into(),
            ..Default::default()
        }
    }

    /// Formula with parents declared from its own tokens.
    pub fn inferred(formula: impl Into<String>) -> Self {
        let mut logic = Self::new(formula);
        logic.parent_fields = logic.referenced_fields();
        logic
    }

    pub fn with_parents(mut self, parents: impl IntoIterator<Item = impl Into<FieldId>>) -> Self {
        self.parent_fields = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Field ids referenced by the formula, in order of first appearance.
    pub fn referenced_fields(&self) -> Vec<FieldId> {
        referenced_fields(&self.formula)
    }
}

/// Field ids a formula reads, in order of first appearance.
pub fn referenced_fields(formula: &str) -> Vec<FieldId> {
    let mut ids: Vec<FieldId> = Vec::new();
    for token in placeholders(formula) {
        if !ids.iter().any(|id| id.as_str() == token.id) {
            ids.push(FieldId::from(token.id));
        }
    }
    ids
}

/// A `{fieldId}` token found in a formula.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub id: &'a str,
    /// Byte range of the whole token, braces included.
    pub span: Range<usize>,
}

/// Iterator over the placeholder tokens of a formula, left to right.
pub struct Placeholders<'a> {
    formula: &'a str,
    pos: usize,
}

pub fn placeholders(formula: &str) -> Placeholders<'_> {
    Placeholders { formula, pos: 0 }
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = Placeholder<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(rel) = self.formula[self.pos..].find('{') {
            let open = self.pos + rel;
            let body_start = open + 1;
            let Some(end_rel) = self.formula[body_start..].find(['{', '}']) else {
                break;
            };
            let close = body_start + end_rel;
            if self.formula.as_bytes()[close] == b'}' && close > body_start {
                self.pos = close + 1;
                return Some(Placeholder {
                    id: &self.formula[body_start..close],
                    span: open..close + 1,
                });
            }
            // `{}` or a nested `{`: resume scanning after this brace.
            self.pos = body_start;
        }
        self.pos = self.formula.len();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(formula: &str) -> Vec<&str> {
        placeholders(formula).map(|p| p.id).collect()
    }

    #[test]
    fn test_scan_placeholders() {
        assert_eq!(ids("{a} + {b} * {a}"), vec!["a", "b", "a"]);
        assert_eq!(ids("age_from_date({dob})"), vec!["dob"]);
        assert_eq!(ids("1 + 2"), Vec::<&str>::new());
    }

    #[test]
    fn test_scan_skips_malformed_tokens() {
        assert_eq!(ids("{} + {a"), Vec::<&str>::new());
        assert_eq!(ids("{{a}}"), vec!["a"]);
        assert_eq!(ids("{x {y}"), vec!["y"]);
    }

    #[test]
    fn test_span_covers_braces() {
        let token = placeholders("1 + {price}").next().unwrap();
        assert_eq!(token.span, 4..11);
        assert_eq!(&"1 + {price}"[token.span], "{price}");
    }

    #[test]
    fn test_referenced_fields_deduplicated() {
        let logic = DerivedLogic::inferred("{qty} * {price} + {qty}");
        assert_eq!(logic.parent_fields, vec![FieldId::from("qty"), FieldId::from("price")]);
    }

    #[test]
    fn test_wire_format() {
        let logic = DerivedLogic::new("{a} + {b}").with_parents(["a", "b"]).with_description("sum");
        let json = serde_json::to_value(&logic).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "parentFields": ["a", "b"], "formula": "{a} + {b}", "description": "sum" })
        );
    }
}
