//! Derivation evaluator
//!
//! Turns a formula plus the live value map into a value. Placeholders are
//! substituted first, then the `age_from_date` built-in is tried, then the
//! substituted text is run through a small sandboxed interpreter. A
//! placeholder naming a field absent from the map fails the formula. Any
//! failure degrades to [`FieldValue::Empty`].

mod lexer;
mod parser;

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use thiserror::Error;
use tracing::trace;

use super::clock::{age_on, Clock, SystemClock};
use crate::domain::value_objects::{placeholders, FieldValue, ValueMap};

pub use crate::domain::value_objects::referenced_fields;

pub use parser::MAX_DEPTH;

const AGE_BUILTIN: &str = "age_from_date(";

fn age_regex() -> &'static Regex {
    static AGE: OnceLock<Regex> = OnceLock::new();
    AGE.get_or_init(|| Regex::new(r"age_from_date\(\{([^}]+)\}\)").expect("age pattern is valid"))
}

/// Why a formula produced no value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("formula is empty")]
    EmptyFormula,

    #[error("no value for field '{field}'")]
    UnresolvedPlaceholder { field: String },

    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },

    #[error("unknown identifier '{name}' at offset {offset}")]
    UnknownIdentifier { name: String, offset: usize },

    #[error("invalid number '{text}' at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("unexpected token {found} at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("unexpected trailing input at offset {offset}")]
    TrailingInput { offset: usize },

    #[error("operator '{operator}' cannot take a {operand} operand")]
    TypeMismatch { operator: char, operand: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NonFinite,

    #[error("formula nests deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// Replace every `{id}` whose id is in `values` with the value's literal
/// text. Unknown ids stay as written. Replacement text is never re-scanned.
pub fn substitute(formula: &str, values: &ValueMap) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut last = 0;
    for token in placeholders(formula) {
        if let Some(value) = values.get(token.id) {
            out.push_str(&formula[last..token.span.start]);
            out.push_str(&value.to_formula_literal());
            last = token.span.end;
        }
    }
    out.push_str(&formula[last..]);
    out
}

/// Date accepted by `age_from_date`: `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Formula evaluation domain service
#[derive(Clone)]
pub struct DerivationEvaluator {
    clock: Arc<dyn Clock>,
}

impl Default for DerivationEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DerivationEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationEvaluator")
            .field("today", &self.clock.today())
            .finish()
    }
}

impl DerivationEvaluator {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Fail-soft evaluation: errors become an empty value.
    pub fn evaluate(&self, formula: &str, values: &ValueMap) -> FieldValue {
        match self.try_evaluate(formula, values) {
            Ok(value) => value,
            Err(error) => {
                trace!(formula, %error, "formula evaluation failed");
                FieldValue::Empty
            }
        }
    }

    pub fn try_evaluate(&self, formula: &str, values: &ValueMap) -> Result<FieldValue, FormulaError> {
        if formula.trim().is_empty() {
            return Err(FormulaError::EmptyFormula);
        }

        // A placeholder left in place could survive as text inside quotes.
        if let Some(missing) = placeholders(formula).find(|p| !values.contains_key(p.id)) {
            return Err(FormulaError::UnresolvedPlaceholder {
                field: missing.id.to_string(),
            });
        }

        if let Some(age) = self.age_from_date(formula, values) {
            return Ok(FieldValue::from(age));
        }

        let substituted = substitute(formula, values);
        parser::evaluate(&substituted).map(FieldValue::from)
    }

    /// Age in completed years when the formula calls `age_from_date` on a
    /// field holding a parseable date. `None` falls through to the
    /// interpreter.
    fn age_from_date(&self, formula: &str, values: &ValueMap) -> Option<i64> {
        if !formula.contains(AGE_BUILTIN) {
            return None;
        }
        let captures = age_regex().captures(formula)?;
        let field_id = captures.get(1)?.as_str();
        let raw = values.get(field_id)?;
        if raw.is_blank() {
            return None;
        }
        let birth = parse_date(raw.as_str()?)?;
        Some(age_on(birth, self.clock.today()))
    }
}
