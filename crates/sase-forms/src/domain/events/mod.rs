//! Form events
//!
//! Raised by the `FormSchema` aggregate while it is being authored, and by
//! the form service on persistence.

use chrono::{DateTime, Utc};

use crate::domain::value_objects::{FieldId, FormId};

#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Form(FormEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormEvent {
    Created {
        form_id: FormId,
        name: String,
        created_at: DateTime<Utc>,
    },
    Renamed {
        form_id: FormId,
        name: String,
    },
    FieldAdded {
        form_id: FormId,
        field_id: FieldId,
    },
    FieldUpdated {
        form_id: FormId,
        field_id: FieldId,
    },
    FieldRemoved {
        form_id: FormId,
        field_id: FieldId,
    },
    FieldsReordered {
        form_id: FormId,
    },
    Saved {
        form_id: FormId,
        saved_at: DateTime<Utc>,
    },
    Deleted {
        form_id: FormId,
    },
}

impl DomainEvent {
    pub fn form_id(&self) -> &FormId {
        match self {
            Self::Form(event) => match event {
                FormEvent::Created { form_id, .. }
                | FormEvent::Renamed { form_id, .. }
                | FormEvent::FieldAdded { form_id, .. }
                | FormEvent::FieldUpdated { form_id, .. }
                | FormEvent::FieldRemoved { form_id, .. }
                | FormEvent::FieldsReordered { form_id }
                | FormEvent::Saved { form_id, .. }
                | FormEvent::Deleted { form_id } => form_id,
            },
        }
    }

    /// Stable event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Form(FormEvent::Created { .. }) => "form.created",
            Self::Form(FormEvent::Renamed { .. }) => "form.renamed",
            Self::Form(FormEvent::FieldAdded { .. }) => "form.field_added",
            Self::Form(FormEvent::FieldUpdated { .. }) => "form.field_updated",
            Self::Form(FormEvent::FieldRemoved { .. }) => "form.field_removed",
            Self::Form(FormEvent::FieldsReordered { .. }) => "form.fields_reordered",
            Self::Form(FormEvent::Saved { .. }) => "form.saved",
            Self::Form(FormEvent::Deleted { .. }) => "form.deleted",
        }
    }
}
