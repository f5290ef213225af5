//! Form session
//!
//! Holds the form being edited or filled together with its live value map,
//! error map, preview flag and selected field. A value change recomputes
//! derived fields first and only then revalidates, so messages always
//! reflect post-recompute values.

use thiserror::Error;
use tracing::debug;

use crate::application::dto::{ChangeReport, Submission, SubmissionRejected};
use crate::config::{EngineConfig, RecomputeStrategy};
use crate::domain::aggregates::{FormSchema, MoveDirection, SchemaError};
use crate::domain::services::{DependencyGraph, DerivationEvaluator, Validator};
use crate::domain::value_objects::rule::DEFAULT_REQUIRED_MESSAGE;
use crate::domain::value_objects::{
    ErrorMap, FieldDefinition, FieldId, FieldType, FieldValue, ValueMap,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no field with id {0} in the current form")]
    UnknownField(FieldId),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Editing and filling state for one form.
#[derive(Debug, Clone)]
pub struct FormSession {
    form: FormSchema,
    values: ValueMap,
    errors: ErrorMap,
    preview: bool,
    selected: Option<FieldId>,
    evaluator: DerivationEvaluator,
    config: EngineConfig,
    /// Built on first selective recompute; dropped whenever the schema changes.
    graph: Option<DependencyGraph>,
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl FormSession {
    /// Session on a fresh untitled form.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_evaluator(config, DerivationEvaluator::new())
    }

    pub fn with_evaluator(config: EngineConfig, evaluator: DerivationEvaluator) -> Self {
        Self {
            form: FormSchema::untitled(),
            values: ValueMap::new(),
            errors: ErrorMap::new(),
            preview: false,
            selected: None,
            evaluator,
            config,
            graph: None,
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn form(&self) -> &FormSchema {
        &self.form
    }

    /// Mutable access for persistence, which drains the form's events.
    pub fn form_mut(&mut self) -> &mut FormSchema {
        self.graph = None;
        &mut self.form
    }

    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn value(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    pub fn error(&self, field_id: &str) -> Option<&str> {
        self.errors.get(field_id).map(String::as_str)
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    pub fn selected_field(&self) -> Option<&FieldDefinition> {
        self.selected.as_ref().and_then(|id| self.form.field(id.as_str()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start over on an empty untitled form.
    pub fn new_form(&mut self) {
        self.form = FormSchema::untitled();
        self.graph = None;
        self.selected = None;
        self.clear_form_data();
    }

    /// Open a saved form for editing.
    pub fn open_form(&mut self, form: FormSchema) {
        self.form = form;
        self.graph = None;
        self.selected = None;
        self.clear_form_data();
    }

    /// Open a form for filling. Value and error maps start empty and no
    /// recompute runs until the first change.
    pub fn load_for_preview(&mut self, form: FormSchema) {
        self.open_form(form);
        self.preview = true;
    }

    pub fn set_preview_mode(&mut self, preview: bool) {
        self.preview = preview;
    }

    pub fn select_field(&mut self, field_id: Option<&str>) -> Result<(), SessionError> {
        self.selected = match field_id {
            Some(id) => Some(self.require_field(id)?.id.clone()),
            None => None,
        };
        Ok(())
    }

    pub fn clear_form_data(&mut self) {
        self.values.clear();
        self.errors.clear();
    }

    // =========================================================================
    // Filling
    // =========================================================================

    /// Store a value, recompute derived fields, then (in preview) revalidate
    /// the changed field and every derived field whose value moved.
    pub fn set_value(
        &mut self,
        field_id: &str,
        value: impl Into<FieldValue>,
    ) -> Result<ChangeReport, SessionError> {
        let id = self.require_field(field_id)?.id.clone();
        self.values.insert(id.clone(), value.into());

        let recomputed = self.recompute(Some(id.as_str()));
        let mut report = ChangeReport::default();

        if self.preview {
            let mut targets = vec![id];
            for derived in &recomputed {
                if !targets.contains(derived) {
                    targets.push(derived.clone());
                }
            }
            for target in &targets {
                self.revalidate(target, &mut report);
            }
        }

        report.recomputed = recomputed;
        Ok(report)
    }

    /// Re-evaluate every derived field without validating. Returns the ids
    /// whose value changed.
    pub fn recompute_all(&mut self) -> Vec<FieldId> {
        self.recompute(None)
    }

    /// Apply non-derived default values, each as if the user had entered it.
    pub fn seed_defaults(&mut self) -> ChangeReport {
        let defaults: Vec<(FieldId, FieldValue)> = self
            .form
            .sorted_fields()
            .into_iter()
            .filter(|field| !field.is_derived)
            .filter_map(|field| {
                let value = field.default_value.as_ref().filter(|v| !v.is_blank())?;
                Some((field.id.clone(), value.clone()))
            })
            .collect();

        let mut report = ChangeReport::default();
        for (id, value) in defaults {
            if let Ok(change) = self.set_value(id.as_str(), value) {
                report.merge(change);
            }
        }
        report
    }

    /// Validate every field and accept the values when nothing fails.
    /// A field flagged `required` must hold a value even without a rule.
    pub fn submit(&mut self) -> Result<Submission, SubmissionRejected> {
        let mut errors = Validator::validate_all(&self.form, &self.values);
        for field in self.form.fields() {
            let blank = self.values.get(&field.id).map_or(true, FieldValue::is_blank);
            if field.required && blank {
                errors
                    .entry(field.id.clone())
                    .or_insert_with(|| DEFAULT_REQUIRED_MESSAGE.to_string());
            }
        }
        self.errors = errors;

        if !self.errors.is_empty() {
            debug!(form_id = %self.form.id(), invalid = self.errors.len(), "submission rejected");
            return Err(SubmissionRejected {
                errors: self.errors.clone(),
            });
        }

        Ok(Submission {
            form_id: self.form.id().clone(),
            form_name: self.form.name().to_string(),
            values: self.values.clone(),
            submitted_at: chrono::Utc::now(),
        })
    }

    // =========================================================================
    // Authoring
    // =========================================================================

    pub fn rename_form(&mut self, name: impl Into<String>) {
        self.form.rename(name);
    }

    /// Append a field of `field_type` with builder defaults and select it.
    pub fn add_field(&mut self, field_type: FieldType) -> Result<FieldId, SessionError> {
        let field = FieldDefinition::new(field_type, self.form.next_order());
        let id = field.id.clone();
        self.insert_field(field)?;
        self.selected = Some(id.clone());
        Ok(id)
    }

    pub fn insert_field(&mut self, field: FieldDefinition) -> Result<(), SessionError> {
        self.form.add_field(field)?;
        self.graph = None;
        Ok(())
    }

    pub fn update_field(&mut self, field: FieldDefinition) -> Result<(), SessionError> {
        self.form.update_field(field)?;
        self.graph = None;
        Ok(())
    }

    /// Remove a field along with its value, error and selection.
    pub fn delete_field(&mut self, field_id: &str) -> Result<FieldDefinition, SessionError> {
        let removed = self.form.delete_field(field_id)?;
        self.graph = None;
        self.values.remove(field_id);
        self.errors.remove(field_id);
        if self.selected.as_ref() == Some(&removed.id) {
            self.selected = None;
        }
        Ok(removed)
    }

    pub fn reorder_fields(&mut self, ids: &[FieldId]) -> Result<(), SessionError> {
        self.form.reorder_fields(ids)?;
        self.graph = None;
        Ok(())
    }

    pub fn move_field(&mut self, field_id: &str, direction: MoveDirection) -> Result<bool, SessionError> {
        let moved = self.form.move_field(field_id, direction)?;
        if moved {
            self.graph = None;
        }
        Ok(moved)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_field(&self, field_id: &str) -> Result<&FieldDefinition, SessionError> {
        self.form
            .field(field_id)
            .ok_or_else(|| SessionError::UnknownField(FieldId::from(field_id)))
    }

    fn dependency_graph(&mut self) -> &DependencyGraph {
        let form = &self.form;
        self.graph.get_or_insert_with(|| DependencyGraph::build(form))
    }

    /// Single pass over derived fields in render order. A result equal to
    /// the stored value (absent counts as empty) is not written.
    fn recompute(&mut self, changed: Option<&str>) -> Vec<FieldId> {
        let targets: Vec<FieldId> = match changed {
            Some(id) if self.config.recompute == RecomputeStrategy::Selective => {
                self.dependency_graph().dependents_of(id).to_vec()
            }
            _ => self.form.derived_fields().map(|field| field.id.clone()).collect(),
        };

        let mut updated = Vec::new();
        for id in targets {
            let Some(formula) = self.form.field(id.as_str()).and_then(FieldDefinition::formula) else {
                continue;
            };
            let next = self.evaluator.evaluate(formula, &self.values);
            let current = self.values.get(&id).cloned().unwrap_or_default();
            if current != next {
                self.values.insert(id.clone(), next);
                updated.push(id);
            }
        }

        if !updated.is_empty() {
            debug!(form_id = %self.form.id(), changed = ?changed, recomputed = updated.len(), "derived fields recomputed");
        }
        updated
    }

    fn revalidate(&mut self, field_id: &FieldId, report: &mut ChangeReport) {
        let Some(field) = self.form.field(field_id.as_str()) else { return };
        let empty = FieldValue::Empty;
        let value = self.values.get(field_id).unwrap_or(&empty);

        match Validator::validate(value, &field.validation_rules) {
            Some(message) => {
                let message = message.to_string();
                if self.errors.get(field_id) != Some(&message) {
                    report.errors_raised.push(field_id.clone());
                }
                self.errors.insert(field_id.clone(), message);
            }
            None => {
                if self.errors.remove(field_id).is_some() {
                    report.errors_cleared.push(field_id.clone());
                }
            }
        }
    }
}
