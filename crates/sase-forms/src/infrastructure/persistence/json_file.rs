//! JSON file repository
//!
//! The whole collection lives in one JSON array. Every write serializes the
//! full list to a sibling temp file and renames it over the target, so a
//! reader sees either the old or the new collection.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::aggregates::FormSchema;
use crate::domain::value_objects::FormId;
use crate::ports::outbound::{FormRepository, RepositoryError};

/// File-backed form repository
pub struct JsonFileFormRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileFormRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or blank file is an empty collection. Unparseable content
    /// is an error so a later write cannot silently discard it.
    async fn read_all(&self) -> Result<Vec<FormSchema>, RepositoryError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_all(&self, forms: &[FormSchema]) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(forms)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(path = %self.path.display(), forms = forms.len(), bytes = json.len(), "form collection written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "forms.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl FormRepository for JsonFileFormRepository {
    async fn list(&self) -> Result<Vec<FormSchema>, RepositoryError> {
        self.read_all().await
    }

    async fn upsert(&self, form: &FormSchema) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut forms = self.read_all().await?;
        match forms.iter_mut().find(|f| f.id() == form.id()) {
            Some(slot) => *slot = form.clone(),
            None => forms.push(form.clone()),
        }
        self.write_all(&forms).await
    }

    async fn delete_by_id(&self, id: &FormId) -> Result<bool, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut forms = self.read_all().await?;
        let before = forms.len();
        forms.retain(|f| f.id() != id);
        if forms.len() == before {
            return Ok(false);
        }
        self.write_all(&forms).await?;
        Ok(true)
    }
}
