//! Fill a saved form from the command line

use sase_forms::{EngineConfig, FormSchema, FormSession};
use serde::Serialize;
use tabled::Tabled;
use tracing::debug;

use super::{parse_assignment, Context};
use crate::output::cell;

#[derive(Serialize, Tabled)]
struct ValueRow {
    field: String,
    label: String,
    value: String,
    derived: bool,
    error: String,
}

fn value_rows(session: &FormSession) -> Vec<ValueRow> {
    session
        .form()
        .sorted_fields()
        .into_iter()
        .map(|field| ValueRow {
            field: field.id.to_string(),
            label: field.label.clone(),
            value: session
                .value(field.id.as_str())
                .and_then(|v| serde_json::to_value(v).ok())
                .map(|v| cell(&v))
                .unwrap_or_default(),
            derived: field.is_derived,
            error: session.error(field.id.as_str()).unwrap_or_default().to_string(),
        })
        .collect()
}

/// Open `form` for filling and apply the assignments in order.
fn fill(form: FormSchema, engine: EngineConfig, set: &[String], defaults: bool) -> Result<FormSession, String> {
    let mut session = FormSession::new(engine);
    session.load_for_preview(form);
    if defaults {
        session.seed_defaults();
    }
    for raw in set {
        let (id, value) = parse_assignment(raw)?;
        let report = session.set_value(&id, value).map_err(|e| e.to_string())?;
        debug!(field = %id, ?report, "value applied");
    }
    Ok(session)
}

pub async fn handle(ctx: &Context, id: &str, set: &[String], defaults: bool, submit: bool) -> Result<(), String> {
    let form = ctx.load(id).await?;
    let mut session = fill(form, ctx.engine.clone(), set, defaults)?;

    if !submit {
        ctx.format.print_rows(&value_rows(&session));
        return Ok(());
    }

    match session.submit() {
        Ok(submission) => {
            ctx.format.print(&submission);
            Ok(())
        }
        Err(rejected) => {
            ctx.format.print_rows(&value_rows(&session));
            Err(rejected.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sase_forms::{DerivedLogic, FieldDefinition, FieldType, FieldValue, ValidationRule};

    fn order_form() -> FormSchema {
        let mut form = FormSchema::create("Order");
        form.add_field(FieldDefinition::new(FieldType::Text, 0).with_id("email").required())
            .unwrap();
        form.add_field(FieldDefinition::new(FieldType::Number, 1).with_id("qty").with_default(1))
            .unwrap();
        form.add_field(FieldDefinition::new(FieldType::Number, 2).with_id("price"))
            .unwrap();
        form.add_field(
            FieldDefinition::new(FieldType::Number, 3)
                .with_id("total")
                .derived(DerivedLogic::inferred("{qty} * {price}")),
        )
        .unwrap();
        form.add_field(
            FieldDefinition::new(FieldType::Text, 4)
                .with_id("code")
                .with_rule(ValidationRule::min_length(4, "Code too short")),
        )
        .unwrap();
        form
    }

    #[test]
    fn test_fill_recomputes_derived() {
        let session = fill(order_form(), EngineConfig::default(), &["qty=2".into(), "price=4".into()], false)
            .unwrap();
        assert_eq!(session.value("total"), Some(&FieldValue::from(8)));
    }

    #[test]
    fn test_fill_with_defaults() {
        let session = fill(order_form(), EngineConfig::default(), &["price=5".into()], true).unwrap();
        assert_eq!(session.value("qty"), Some(&FieldValue::from(1)));
        assert_eq!(session.value("total"), Some(&FieldValue::from(5)));
    }

    #[test]
    fn test_fill_unknown_field_fails() {
        assert!(fill(order_form(), EngineConfig::default(), &["nope=1".into()], false).is_err());
    }

    #[test]
    fn test_rows_show_live_errors() {
        let session = fill(order_form(), EngineConfig::default(), &["code=ab".into()], false).unwrap();
        let rows = value_rows(&session);
        let code = rows.iter().find(|r| r.field == "code").unwrap();
        assert_eq!(code.value, "ab");
        assert_eq!(code.error, "Code too short");
    }

    #[test]
    fn test_submit_requires_flagged_fields() {
        let mut session = fill(order_form(), EngineConfig::default(), &["qty=1".into()], false).unwrap();
        let rejected = session.submit().unwrap_err();
        assert!(rejected.errors.contains_key("email"));

        session.set_value("email", "jane@example.com").unwrap();
        let submission = session.submit().unwrap();
        assert_eq!(submission.form_name, "Order");
    }
}
