//! Engine configuration

use serde::{Deserialize, Serialize};

/// How the session decides which derived fields to recompute after a change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecomputeStrategy {
    /// Every derived field is re-evaluated on every change.
    #[default]
    Full,
    /// Only derived fields whose formula references the changed field.
    Selective,
}

impl std::str::FromStr for RecomputeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "selective" => Ok(Self::Selective),
            other => Err(format!("unknown recompute strategy: {}", other)),
        }
    }
}

impl std::fmt::Display for RecomputeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Selective => write!(f, "selective"),
        }
    }
}

/// Tunables for `FormSession`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub recompute: RecomputeStrategy,
}

impl EngineConfig {
    pub fn selective() -> Self {
        Self {
            recompute: RecomputeStrategy::Selective,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_full_recompute() {
        assert_eq!(EngineConfig::default().recompute, RecomputeStrategy::Full);
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("Selective".parse::<RecomputeStrategy>(), Ok(RecomputeStrategy::Selective));
        assert_eq!(" full ".parse::<RecomputeStrategy>(), Ok(RecomputeStrategy::Full));
        assert!("lazy".parse::<RecomputeStrategy>().is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: EngineConfig = serde_json::from_str(r#"{"recompute":"selective"}"#).unwrap();
        assert_eq!(config, EngineConfig::selective());

        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
