//! Saved forms commands

use std::fs;

use sase_forms::{
    DependencyGraph, FieldDefinition, FormSchema, FormSummary, FormUseCases, RuleParam,
    SchemaIssue, ValidationRule,
};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use super::Context;
use crate::output::{cell, OutputFormat};
use crate::FormCommands;

#[derive(Serialize, Tabled)]
struct FormRow {
    id: String,
    name: String,
    fields: usize,
    required: usize,
    derived: usize,
    updated: String,
}

impl From<FormSummary> for FormRow {
    fn from(summary: FormSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            name: summary.name,
            fields: summary.field_count,
            required: summary.required_count,
            derived: summary.derived_count,
            updated: summary.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Serialize, Tabled)]
struct FieldRow {
    order: u32,
    id: String,
    #[serde(rename = "type")]
    #[tabled(rename = "type")]
    field_type: String,
    label: String,
    required: bool,
    rules: String,
    formula: String,
}

impl From<&FieldDefinition> for FieldRow {
    fn from(field: &FieldDefinition) -> Self {
        let rules: Vec<String> = field.validation_rules.iter().map(rule_label).collect();
        Self {
            order: field.order,
            id: field.id.to_string(),
            field_type: field.field_type.to_string(),
            label: field.label.clone(),
            required: field.required,
            rules: rules.join(", "),
            formula: field.formula().unwrap_or_default().to_string(),
        }
    }
}

/// `minLength(3)`, `email`, ...
fn rule_label(rule: &ValidationRule) -> String {
    let kind = serde_json::to_value(rule.kind)
        .map(|v| cell(&v))
        .unwrap_or_default();
    match &rule.value {
        Some(RuleParam::Number(n)) => format!("{}({})", kind, n),
        Some(RuleParam::Text(s)) => format!("{}({})", kind, s),
        None => kind,
    }
}

#[derive(Serialize, Tabled)]
struct IssueRow {
    severity: &'static str,
    issue: String,
}

impl From<&SchemaIssue> for IssueRow {
    fn from(issue: &SchemaIssue) -> Self {
        Self {
            severity: if issue.is_blocking() { "error" } else { "warning" },
            issue: issue.to_string(),
        }
    }
}

#[derive(Serialize)]
struct StatsView {
    id: String,
    name: String,
    field_count: usize,
    required_count: usize,
    derived_count: usize,
    required_percent: String,
    field_types: Vec<String>,
}

/// Import file: one form or a list of forms.
#[derive(Deserialize)]
#[serde(untagged)]
enum ImportDocument {
    Many(Vec<FormSchema>),
    One(Box<FormSchema>),
}

fn read_import(file: &str) -> Result<Vec<FormSchema>, String> {
    let content = fs::read_to_string(file).map_err(|e| format!("{}: {}", file, e))?;
    let document: ImportDocument = if file.ends_with(".yaml") || file.ends_with(".yml") {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())?
    } else {
        serde_json::from_str(&content).map_err(|e| e.to_string())?
    };
    Ok(match document {
        ImportDocument::Many(forms) => forms,
        ImportDocument::One(form) => vec![*form],
    })
}

pub async fn handle(action: FormCommands, ctx: &Context) -> Result<(), String> {
    match action {
        FormCommands::List => {
            let summaries = ctx.service.list_summaries().await.map_err(|e| e.to_string())?;
            let rows: Vec<FormRow> = summaries.into_iter().map(FormRow::from).collect();
            ctx.format.print_rows(&rows);
        }
        FormCommands::Show { id } => {
            let form = ctx.load(&id).await?;
            match ctx.format {
                OutputFormat::Table => {
                    println!("{} ({})", form.name(), form.id());
                    if let Some(description) = form.description() {
                        println!("{}", description);
                    }
                    let rows: Vec<FieldRow> = form.sorted_fields().into_iter().map(FieldRow::from).collect();
                    ctx.format.print_rows(&rows);
                }
                _ => ctx.format.print(&form),
            }
        }
        FormCommands::Import { file } => {
            for mut form in read_import(&file)? {
                for issue in DependencyGraph::build(&form).issues() {
                    eprintln!("Warning: {}: {}", form.name(), issue);
                }
                ctx.service.save_and_verify(&mut form).await.map_err(|e| e.to_string())?;
                println!("Imported form: {} ({})", form.id(), form.name());
            }
        }
        FormCommands::Delete { id } => {
            let form = ctx.load(&id).await?;
            ctx.service.delete_form(form.id()).await.map_err(|e| e.to_string())?;
            println!("Deleted form: {} ({})", form.id(), form.name());
        }
        FormCommands::Stats { id } => {
            let form = ctx.load(&id).await?;
            let stats = form.stats();
            ctx.format.print(&StatsView {
                id: form.id().to_string(),
                name: form.name().to_string(),
                field_count: stats.field_count,
                required_count: stats.required_count,
                derived_count: stats.derived_count,
                required_percent: format!("{:.0}%", stats.required_ratio()),
                field_types: stats.field_types.iter().map(ToString::to_string).collect(),
            });
        }
        FormCommands::Check { id } => {
            let form = ctx.load(&id).await?;
            let graph = DependencyGraph::build(&form);
            let rows: Vec<IssueRow> = graph.issues().iter().map(IssueRow::from).collect();
            ctx.format.print_rows(&rows);

            let blocking = graph.issues().iter().filter(|i| i.is_blocking()).count();
            if blocking > 0 {
                return Err(format!("{} blocking issue(s) in form {}", blocking, form.id()));
            }
        }
    }
    Ok(())
}
