//! Form Schema Aggregate
//!
//! Owns the ordered field list of a form. Every mutation bumps `updated_at`
//! and records a domain event.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::events::{DomainEvent, FormEvent};
use crate::domain::value_objects::{FieldDefinition, FieldId, FieldType, FormId};

pub const UNTITLED_FORM_NAME: &str = "Untitled Form";

/// Form schema aggregate root
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    id: FormId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    fields: Vec<FieldDefinition>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl PartialEq for FormSchema {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.description == other.description
            && self.fields == other.fields
            && self.created_at == other.created_at
            && self.updated_at == other.updated_at
    }
}

impl FormSchema {
    /// Create a new, empty form
    pub fn create(name: impl Into<String>) -> Self {
        let now = Utc::now();
        let id = FormId::new();
        let name = name.into();

        let mut form = Self {
            id: id.clone(),
            name: name.clone(),
            description: None,
            fields: vec![],
            created_at: now,
            updated_at: now,
            events: vec![],
        };
        form.raise_event(DomainEvent::Form(FormEvent::Created {
            form_id: id,
            name,
            created_at: now,
        }));
        form
    }

    pub fn untitled() -> Self {
        Self::create(UNTITLED_FORM_NAME)
    }

    /// Parse a schema exported as JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> &FormId { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Fields in insertion order.
    pub fn fields(&self) -> &[FieldDefinition] { &self.fields }

    /// Fields in render order (`order` ascending, ties keep insertion order).
    pub fn sorted_fields(&self) -> Vec<&FieldDefinition> {
        let mut sorted: Vec<&FieldDefinition> = self.fields.iter().collect();
        sorted.sort_by_key(|f| f.order);
        sorted
    }

    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id.as_str() == id)
    }

    /// Derived fields with a formula, in render order.
    pub fn derived_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.sorted_fields().into_iter().filter(|f| f.formula().is_some())
    }

    /// `order` for a field appended at the end: one past the highest
    /// `order` in use, so it stays unique after deletions.
    pub fn next_order(&self) -> u32 {
        self.fields.iter().map(|f| f.order + 1).max().unwrap_or(0)
    }

    pub fn stats(&self) -> FormStats {
        let field_types: BTreeSet<FieldType> = self.fields.iter().map(|f| f.field_type).collect();
        FormStats {
            field_count: self.fields.len(),
            required_count: self.fields.iter().filter(|f| f.required).count(),
            derived_count: self.fields.iter().filter(|f| f.is_derived).count(),
            field_types: field_types.into_iter().collect(),
        }
    }

    // =========================================================================
    // Authoring operations
    // =========================================================================

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
        self.raise_event(DomainEvent::Form(FormEvent::Renamed {
            form_id: self.id.clone(),
            name: self.name.clone(),
        }));
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description.filter(|d| !d.trim().is_empty());
        self.touch();
    }

    pub fn add_field(&mut self, field: FieldDefinition) -> Result<(), SchemaError> {
        if self.field(field.id.as_str()).is_some() {
            return Err(SchemaError::DuplicateField(field.id));
        }
        let field_id = field.id.clone();
        self.fields.push(field);
        self.touch();
        self.raise_event(DomainEvent::Form(FormEvent::FieldAdded {
            form_id: self.id.clone(),
            field_id,
        }));
        Ok(())
    }

    /// Replace the field with the same id.
    pub fn update_field(&mut self, field: FieldDefinition) -> Result<(), SchemaError> {
        let slot = self
            .fields
            .iter_mut()
            .find(|f| f.id == field.id)
            .ok_or_else(|| SchemaError::FieldNotFound(field.id.clone()))?;
        let field_id = field.id.clone();
        *slot = field;
        self.touch();
        self.raise_event(DomainEvent::Form(FormEvent::FieldUpdated {
            form_id: self.id.clone(),
            field_id,
        }));
        Ok(())
    }

    pub fn delete_field(&mut self, field_id: &str) -> Result<FieldDefinition, SchemaError> {
        let index = self
            .fields
            .iter()
            .position(|f| f.id.as_str() == field_id)
            .ok_or_else(|| SchemaError::FieldNotFound(FieldId::from(field_id)))?;
        let removed = self.fields.remove(index);
        self.touch();
        self.raise_event(DomainEvent::Form(FormEvent::FieldRemoved {
            form_id: self.id.clone(),
            field_id: removed.id.clone(),
        }));
        Ok(removed)
    }

    /// Reorder to `ids`, which must name every field exactly once. Each
    /// field's `order` becomes its new index.
    pub fn reorder_fields(&mut self, ids: &[FieldId]) -> Result<(), SchemaError> {
        if ids.len() != self.fields.len() {
            return Err(SchemaError::InvalidReorder(format!(
                "expected {} field ids, got {}",
                self.fields.len(),
                ids.len()
            )));
        }
        let mut remaining = self.fields.clone();
        let mut reordered = Vec::with_capacity(remaining.len());
        for id in ids {
            let index = remaining.iter().position(|f| &f.id == id).ok_or_else(|| {
                SchemaError::InvalidReorder(format!("unknown or repeated field id: {}", id))
            })?;
            reordered.push(remaining.remove(index));
        }
        self.fields = reordered;
        self.renumber();
        Ok(())
    }

    /// Swap a field with its neighbour in render order. Returns `false` when
    /// the field is already first (up) or last (down).
    pub fn move_field(&mut self, field_id: &str, direction: MoveDirection) -> Result<bool, SchemaError> {
        let index = self
            .sorted_fields()
            .iter()
            .position(|f| f.id.as_str() == field_id)
            .ok_or_else(|| SchemaError::FieldNotFound(FieldId::from(field_id)))?;
        let target = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < self.fields.len() => index + 1,
            _ => return Ok(false),
        };
        // Stable sort, so indices match the sorted view above.
        self.fields.sort_by_key(|f| f.order);
        self.fields.swap(index, target);
        self.renumber();
        Ok(true)
    }

    // =========================================================================
    // Domain Events
    // =========================================================================

    /// Get and clear accumulated domain events
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn renumber(&mut self) {
        for (index, field) in self.fields.iter_mut().enumerate() {
            field.order = index as u32;
        }
        self.touch();
        self.raise_event(DomainEvent::Form(FormEvent::FieldsReordered {
            form_id: self.id.clone(),
        }));
    }

    fn raise_event(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Summary counters shown in the builder header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormStats {
    pub field_count: usize,
    pub required_count: usize,
    pub derived_count: usize,
    pub field_types: Vec<FieldType>,
}

impl FormStats {
    /// Share of required fields, in percent.
    pub fn required_ratio(&self) -> f64 {
        self.required_count as f64 * 100.0 / self.field_count.max(1) as f64
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("field already exists: {0}")]
    DuplicateField(FieldId),

    #[error("field not found: {0}")]
    FieldNotFound(FieldId),

    #[error("invalid reorder: {0}")]
    InvalidReorder(String),
}
