//! Data Transfer Objects (DTOs)
//!
//! Objects for transferring data across boundaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::aggregates::FormSchema;
use crate::domain::value_objects::{ErrorMap, FieldId, FormId, ValueMap};

// =============================================================================
// Session results
// =============================================================================

/// What a value change did to the session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReport {
    /// Derived fields whose value changed, in render order.
    pub recomputed: Vec<FieldId>,
    pub errors_raised: Vec<FieldId>,
    pub errors_cleared: Vec<FieldId>,
}

impl ChangeReport {
    pub fn is_quiet(&self) -> bool {
        self.recomputed.is_empty() && self.errors_raised.is_empty() && self.errors_cleared.is_empty()
    }

    pub(crate) fn merge(&mut self, other: ChangeReport) {
        for id in other.recomputed {
            if !self.recomputed.contains(&id) {
                self.recomputed.push(id);
            }
        }
        for id in other.errors_raised {
            self.errors_cleared.retain(|cleared| cleared != &id);
            if !self.errors_raised.contains(&id) {
                self.errors_raised.push(id);
            }
        }
        for id in other.errors_cleared {
            self.errors_raised.retain(|raised| raised != &id);
            if !self.errors_cleared.contains(&id) {
                self.errors_cleared.push(id);
            }
        }
    }
}

/// Accepted submission: a snapshot of the value map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub form_id: FormId,
    pub form_name: String,
    pub values: ValueMap,
    pub submitted_at: DateTime<Utc>,
}

/// Submission refused because at least one field is invalid.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("submission rejected: {} invalid field(s)", .errors.len())]
pub struct SubmissionRejected {
    pub errors: ErrorMap,
}

// =============================================================================
// Views (Read Models)
// =============================================================================

/// One row of the saved forms list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    pub id: FormId,
    pub name: String,
    pub field_count: usize,
    pub required_count: usize,
    pub derived_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&FormSchema> for FormSummary {
    fn from(form: &FormSchema) -> Self {
        let stats = form.stats();
        Self {
            id: form.id().clone(),
            name: form.name().to_string(),
            field_count: stats.field_count,
            required_count: stats.required_count,
            derived_count: stats.derived_count,
            created_at: form.created_at(),
            updated_at: form.updated_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_reports() {
        let mut report = ChangeReport {
            recomputed: vec!["total".into()],
            errors_raised: vec!["a".into()],
            errors_cleared: vec![],
        };
        report.merge(ChangeReport {
            recomputed: vec!["total".into(), "age".into()],
            errors_raised: vec![],
            errors_cleared: vec!["a".into()],
        });
        assert_eq!(report.recomputed, vec![FieldId::from("total"), FieldId::from("age")]);
        assert!(report.errors_raised.is_empty());
        assert_eq!(report.errors_cleared, vec![FieldId::from("a")]);
    }

    #[test]
    fn test_rejection_message() {
        let mut errors = ErrorMap::new();
        errors.insert("email".into(), "Bad email".into());
        let rejected = SubmissionRejected { errors };
        assert_eq!(rejected.to_string(), "submission rejected: 1 invalid field(s)");
    }
}
