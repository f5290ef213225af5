//! CLI Configuration

use sase_forms::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "forms.toml";
const STORE_FILE: &str = "forms.json";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub store_path: Option<PathBuf>,
    pub default_format: Option<String>,
    pub log_level: Option<String>,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let path = Self::config_path(path)?;
        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| e.to_string())?;
            toml::from_str(&content).map_err(|e| format!("{}: {}", path.display(), e))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf, String> {
        let path = Self::config_path(path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(&path, content).map_err(|e| e.to_string())?;
        Ok(path)
    }

    /// Collection file: the command-line override, then the config value,
    /// then `~/.opensase/forms.json`.
    pub fn store_path(&self, cli_override: Option<&Path>) -> Result<PathBuf, String> {
        if let Some(path) = cli_override.or(self.store_path.as_deref()) {
            return Ok(path.to_path_buf());
        }
        Ok(opensase_dir()?.join(STORE_FILE))
    }

    pub fn config_path(path: Option<&Path>) -> Result<PathBuf, String> {
        match path {
            Some(p) => Ok(p.to_path_buf()),
            None => Ok(opensase_dir()?.join(CONFIG_FILE)),
        }
    }
}

fn opensase_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Cannot find home directory")?;
    Ok(home.join(".opensase"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sase_forms::RecomputeStrategy;

    #[test]
    fn test_parse_config_file() {
        let config: Config = toml::from_str(
            r#"
            store_path = "/var/lib/opensase/forms.json"
            default_format = "json"

            [engine]
            recompute = "selective"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.recompute, RecomputeStrategy::Selective);
        assert_eq!(
            config.store_path(None).unwrap(),
            PathBuf::from("/var/lib/opensase/forms.json")
        );
        assert_eq!(
            config.store_path(Some(Path::new("/tmp/other.json"))).unwrap(),
            PathBuf::from("/tmp/other.json")
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert!(config.log_level.is_none());
    }
}
