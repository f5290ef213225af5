//! CLI Commands

pub mod config;
pub mod eval;
pub mod fill;
pub mod forms;

use std::path::PathBuf;
use std::sync::Arc;

use sase_forms::{
    EngineConfig, FieldValue, FormId, FormService, FormUseCases, JsonFileFormRepository,
    LoggingEventPublisher, UseCaseError, ValueMap,
};

use crate::output::OutputFormat;

/// Shared state of the store-backed commands.
pub struct Context {
    pub service: FormService,
    pub engine: EngineConfig,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(store: PathBuf, engine: EngineConfig, format: OutputFormat) -> Self {
        let repo = Arc::new(JsonFileFormRepository::new(store));
        Self {
            service: FormService::new(repo, Arc::new(LoggingEventPublisher)),
            engine,
            format,
        }
    }

    /// Load a saved form, accepting any unambiguous id prefix.
    pub async fn load(&self, id: &str) -> Result<sase_forms::FormSchema, String> {
        match self.service.load_form(&FormId::from_string(id)).await {
            Ok(form) => return Ok(form),
            Err(UseCaseError::NotFound(_)) => {}
            Err(e) => return Err(e.to_string()),
        }

        let mut matches: Vec<_> = self
            .service
            .list_forms()
            .await
            .map_err(|e| e.to_string())?
            .into_iter()
            .filter(|f| f.id().as_str().starts_with(id))
            .collect();
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(format!("Form not found: {}", id)),
            n => Err(format!("Form id prefix {} is ambiguous ({} matches)", id, n)),
        }
    }
}

/// Parse `id=value`. The value is read as a JSON literal when it is one
/// (`3`, `true`, `null`, `["a","b"]`, `"007"`), otherwise as plain text.
pub fn parse_assignment(raw: &str) -> Result<(String, FieldValue), String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Expected ID=VALUE, got {}", raw))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("Missing field id in {}", raw));
    }
    let value = serde_json::from_str::<FieldValue>(value).unwrap_or_else(|_| FieldValue::from(value));
    Ok((id.to_string(), value))
}

pub fn parse_values(raw: &[String]) -> Result<ValueMap, String> {
    raw.iter()
        .map(|entry| parse_assignment(entry).map(|(id, value)| (id.into(), value)))
        .collect()
}
