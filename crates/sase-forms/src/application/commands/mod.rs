//! Command handlers
//!
//! Application services that orchestrate use cases.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::application::dto::FormSummary;
use crate::domain::aggregates::FormSchema;
use crate::domain::events::{DomainEvent, FormEvent};
use crate::domain::value_objects::FormId;
use crate::ports::inbound::{FormUseCases, UseCaseError};
use crate::ports::outbound::{EventPublisher, FormRepository, RepositoryError};

/// Saved forms application service
pub struct FormService {
    form_repo: Arc<dyn FormRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl FormService {
    pub fn new(form_repo: Arc<dyn FormRepository>, event_publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            form_repo,
            event_publisher,
        }
    }

    /// Save, then read the collection back and check the stored copy
    /// matches.
    pub async fn save_and_verify(&self, form: &mut FormSchema) -> Result<(), UseCaseError> {
        self.save_form(form).await?;

        let stored = self
            .form_repo
            .find_by_id(form.id())
            .await
            .map_err(|e| repository_failure("verify", e))?
            .ok_or_else(|| UseCaseError::Verification(format!("form {} missing after save", form.id())))?;

        if &stored != form {
            return Err(UseCaseError::Verification(format!(
                "stored copy of form {} differs from the saved one",
                form.id()
            )));
        }
        Ok(())
    }

    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), UseCaseError> {
        if events.is_empty() {
            return Ok(());
        }
        self.event_publisher
            .publish(events)
            .await
            .map_err(|e| repository_failure("publish", e))
    }
}

/// Log a storage failure and wrap it for the caller.
fn repository_failure(operation: &str, error: RepositoryError) -> UseCaseError {
    warn!(operation, %error, "form repository failure");
    UseCaseError::Repository(error)
}

#[async_trait]
impl FormUseCases for FormService {
    async fn save_form(&self, form: &mut FormSchema) -> Result<(), UseCaseError> {
        self.form_repo
            .upsert(form)
            .await
            .map_err(|e| repository_failure("save", e))?;

        info!(form_id = %form.id(), name = form.name(), fields = form.fields().len(), "form saved");

        let mut events = form.take_events();
        events.push(DomainEvent::Form(FormEvent::Saved {
            form_id: form.id().clone(),
            saved_at: Utc::now(),
        }));
        self.publish(events).await
    }

    async fn list_forms(&self) -> Result<Vec<FormSchema>, UseCaseError> {
        self.form_repo
            .list()
            .await
            .map_err(|e| repository_failure("list", e))
    }

    async fn list_summaries(&self) -> Result<Vec<FormSummary>, UseCaseError> {
        let forms = self.list_forms().await?;
        Ok(forms.iter().map(FormSummary::from).collect())
    }

    async fn load_form(&self, id: &FormId) -> Result<FormSchema, UseCaseError> {
        self.form_repo
            .find_by_id(id)
            .await
            .map_err(|e| repository_failure("load", e))?
            .ok_or_else(|| UseCaseError::NotFound(id.clone()))
    }

    async fn delete_form(&self, id: &FormId) -> Result<(), UseCaseError> {
        let removed = self
            .form_repo
            .delete_by_id(id)
            .await
            .map_err(|e| repository_failure("delete", e))?;

        if !removed {
            return Err(UseCaseError::NotFound(id.clone()));
        }

        info!(form_id = %id, "form deleted");
        self.publish(vec![DomainEvent::Form(FormEvent::Deleted { form_id: id.clone() })])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{FieldDefinition, FieldType};
    use crate::infrastructure::{InMemoryFormRepository, NoOpEventPublisher};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<DomainEvent>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), RepositoryError> {
            self.events.lock().extend(events);
            Ok(())
        }
    }

    struct BrokenRepository;

    #[async_trait]
    impl FormRepository for BrokenRepository {
        async fn list(&self) -> Result<Vec<FormSchema>, RepositoryError> {
            Err(RepositoryError::Unavailable("disk full".into()))
        }

        async fn upsert(&self, _form: &FormSchema) -> Result<(), RepositoryError> {
            Err(RepositoryError::Unavailable("disk full".into()))
        }

        async fn delete_by_id(&self, _id: &FormId) -> Result<bool, RepositoryError> {
            Err(RepositoryError::Unavailable("disk full".into()))
        }
    }

    fn service() -> FormService {
        FormService::new(Arc::new(InMemoryFormRepository::new()), Arc::new(NoOpEventPublisher))
    }

    fn sample_form(name: &str) -> FormSchema {
        let mut form = FormSchema::create(name);
        form.add_field(FieldDefinition::new(FieldType::Text, 0).with_id("name").required())
            .unwrap();
        form
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let service = service();
        let mut form = sample_form("Contact");
        service.save_form(&mut form).await.unwrap();

        let loaded = service.load_form(form.id()).await.unwrap();
        assert_eq!(loaded, form);
    }

    #[tokio::test]
    async fn test_save_replaces_existing_in_place() {
        let service = service();
        let mut first = sample_form("First");
        let mut second = sample_form("Second");
        service.save_form(&mut first).await.unwrap();
        service.save_form(&mut second).await.unwrap();

        first.rename("First, renamed");
        service.save_form(&mut first).await.unwrap();

        let names: Vec<String> = service
            .list_forms()
            .await
            .unwrap()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        assert_eq!(names, vec!["First, renamed", "Second"]);
    }

    #[tokio::test]
    async fn test_save_publishes_pending_events() {
        let publisher = Arc::new(RecordingPublisher::default());
        let service = FormService::new(Arc::new(InMemoryFormRepository::new()), publisher.clone());
        let mut form = sample_form("Events");
        service.save_form(&mut form).await.unwrap();

        let names: Vec<&str> = publisher.events.lock().iter().map(DomainEvent::name).collect();
        assert_eq!(names, vec!["form.created", "form.field_added", "form.saved"]);
        assert!(form.take_events().is_empty());
    }

    #[tokio::test]
    async fn test_summaries() {
        let service = service();
        let mut form = sample_form("Summary");
        service.save_form(&mut form).await.unwrap();

        let summaries = service.list_summaries().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].name, "Summary");
        assert_eq!(summaries[0].field_count, 1);
        assert_eq!(summaries[0].required_count, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let service = service();
        let mut form = sample_form("Doomed");
        service.save_form(&mut form).await.unwrap();
        service.delete_form(form.id()).await.unwrap();

        assert!(matches!(service.delete_form(form.id()).await, Err(UseCaseError::NotFound(_))));
        assert!(matches!(service.load_form(form.id()).await, Err(UseCaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_save_and_verify() {
        let service = service();
        let mut form = sample_form("Verified");
        service.save_and_verify(&mut form).await.unwrap();
    }

    #[tokio::test]
    async fn test_repository_failure_leaves_form_untouched() {
        let service = FormService::new(Arc::new(BrokenRepository), Arc::new(NoOpEventPublisher));
        let mut form = sample_form("Unsaved");
        let before = form.clone();

        let result = service.save_form(&mut form).await;
        assert!(matches!(result, Err(UseCaseError::Repository(RepositoryError::Unavailable(_)))));
        assert_eq!(form, before);
        assert!(!form.take_events().is_empty());
    }
}
