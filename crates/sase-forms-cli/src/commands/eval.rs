//! Ad-hoc formula evaluation

use std::sync::Arc;

use chrono::NaiveDate;
use sase_forms::{substitute, DerivationEvaluator, FieldValue, FixedClock, ValueMap};
use serde::Serialize;

use super::parse_values;
use crate::output::OutputFormat;

#[derive(Debug, Serialize)]
struct EvalView {
    formula: String,
    substituted: String,
    value: Option<FieldValue>,
    error: Option<String>,
}

fn evaluate(formula: &str, values: &ValueMap, today: Option<NaiveDate>) -> EvalView {
    let evaluator = match today {
        Some(date) => DerivationEvaluator::with_clock(Arc::new(FixedClock(date))),
        None => DerivationEvaluator::new(),
    };
    let (value, error) = match evaluator.try_evaluate(formula, values) {
        Ok(value) => (Some(value), None),
        Err(e) => (None, Some(e.to_string())),
    };
    EvalView {
        formula: formula.to_string(),
        substituted: substitute(formula, values),
        value,
        error,
    }
}

pub fn handle(
    formula: &str,
    values: &[String],
    today: Option<NaiveDate>,
    format: OutputFormat,
) -> Result<(), String> {
    let values = parse_values(values)?;
    let view = evaluate(formula, &values, today);
    format.print(&view);
    if view.error.is_some() {
        return Err("formula did not evaluate; a derived field would stay empty".into());
    }
    Ok(())
}
