//! In-memory repository, for tests and one-shot sessions

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::aggregates::FormSchema;
use crate::domain::value_objects::FormId;
use crate::ports::outbound::{FormRepository, RepositoryError};

/// In-memory form repository
#[derive(Default)]
pub struct InMemoryFormRepository {
    forms: RwLock<Vec<FormSchema>>,
}

impl InMemoryFormRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forms(forms: Vec<FormSchema>) -> Self {
        Self {
            forms: RwLock::new(forms),
        }
    }
}

#[async_trait]
impl FormRepository for InMemoryFormRepository {
    async fn list(&self) -> Result<Vec<FormSchema>, RepositoryError> {
        Ok(self.forms.read().clone())
    }

    async fn find_by_id(&self, id: &FormId) -> Result<Option<FormSchema>, RepositoryError> {
        Ok(self.forms.read().iter().find(|f| f.id() == id).cloned())
    }

    async fn upsert(&self, form: &FormSchema) -> Result<(), RepositoryError> {
        let mut forms = self.forms.write();
        match forms.iter_mut().find(|f| f.id() == form.id()) {
            Some(slot) => *slot = form.clone(),
            None => forms.push(form.clone()),
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &FormId) -> Result<bool, RepositoryError> {
        let mut forms = self.forms.write();
        let before = forms.len();
        forms.retain(|f| f.id() != id);
        Ok(forms.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_preserves_order() {
        let repo = InMemoryFormRepository::new();
        let mut a = FormSchema::create("A");
        let b = FormSchema::create("B");
        repo.upsert(&a).await.unwrap();
        repo.upsert(&b).await.unwrap();

        a.rename("A2");
        repo.upsert(&a).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().iter().map(|f| f.name().to_string()).collect();
        assert_eq!(names, vec!["A2", "B"]);
    }

    #[tokio::test]
    async fn test_find_and_delete() {
        let form = FormSchema::create("Only");
        let repo = InMemoryFormRepository::with_forms(vec![form.clone()]);

        assert_eq!(repo.find_by_id(form.id()).await.unwrap(), Some(form.clone()));
        assert!(repo.delete_by_id(form.id()).await.unwrap());
        assert!(!repo.delete_by_id(form.id()).await.unwrap());
        assert_eq!(repo.find_by_id(form.id()).await.unwrap(), None);
    }
}
