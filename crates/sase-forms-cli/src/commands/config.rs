//! Config commands

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use sase_forms::RecomputeStrategy;

use crate::config::Config;
use crate::output::OutputFormat;
use crate::ConfigCommands;

const KEYS: [&str; 4] = ["store_path", "default_format", "log_level", "recompute"];

pub fn handle(action: ConfigCommands, path: Option<&Path>) -> Result<(), String> {
    match action {
        ConfigCommands::Init => {
            let written = Config::default().save(path)?;
            println!("Configuration initialized at {}", written.display());
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load(path)?;
            set_key(&mut config, &key, &value)?;
            config.save(path)?;
            println!("Set {} successfully", key);
        }
        ConfigCommands::Get { key } => {
            let config = Config::load(path)?;
            let value = get_key(&config, &key)?;
            println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
        }
        ConfigCommands::List => {
            let config = Config::load(path)?;
            for key in KEYS {
                let value = get_key(&config, key)?;
                println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
            }
        }
    }
    Ok(())
}

/// An empty value clears an optional key.
fn set_key(config: &mut Config, key: &str, value: &str) -> Result<(), String> {
    let value = value.trim();
    let optional = || (!value.is_empty()).then(|| value.to_string());
    match key {
        "store_path" => config.store_path = optional().map(PathBuf::from),
        "default_format" => {
            if !value.is_empty() {
                OutputFormat::from_str(value, true)
                    .map_err(|_| format!("Unknown output format: {}", value))?;
            }
            config.default_format = optional().map(|f| f.to_ascii_lowercase());
        }
        "log_level" => config.log_level = optional(),
        "recompute" => config.engine.recompute = value.parse::<RecomputeStrategy>()?,
        _ => return Err(format!("Unknown config key: {}", key)),
    }
    Ok(())
}

fn get_key(config: &Config, key: &str) -> Result<Option<String>, String> {
    Ok(match key {
        "store_path" => config.store_path.as_ref().map(|p| p.display().to_string()),
        "default_format" => config.default_format.clone(),
        "log_level" => config.log_level.clone(),
        "recompute" => Some(config.engine.recompute.to_string()),
        _ => return Err(format!("Unknown config key: {}", key)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_keys() {
        let mut config = Config::default();
        set_key(&mut config, "store_path", "/srv/forms.json").unwrap();
        set_key(&mut config, "default_format", "YAML").unwrap();
        set_key(&mut config, "recompute", "selective").unwrap();

        assert_eq!(get_key(&config, "store_path").unwrap().as_deref(), Some("/srv/forms.json"));
        assert_eq!(get_key(&config, "default_format").unwrap().as_deref(), Some("yaml"));
        assert_eq!(config.engine.recompute, RecomputeStrategy::Selective);
        assert_eq!(get_key(&config, "log_level").unwrap(), None);
    }

    #[test]
    fn test_empty_value_clears() {
        let mut config = Config::default();
        set_key(&mut config, "log_level", "debug").unwrap();
        set_key(&mut config, "log_level", "").unwrap();
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut config = Config::default();
        assert!(set_key(&mut config, "api_key", "x").is_err());
        assert!(set_key(&mut config, "default_format", "xml").is_err());
        assert!(set_key(&mut config, "recompute", "sometimes").is_err());
        assert!(get_key(&config, "tenant_id").is_err());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir()
            .join(format!("sase-forms-cli-{}", std::process::id()))
            .join("forms.toml");
        let mut config = Config::default();
        set_key(&mut config, "recompute", "selective").unwrap();
        assert_eq!(config.save(Some(&path)).unwrap(), path);

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.engine.recompute, RecomputeStrategy::Selective);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
