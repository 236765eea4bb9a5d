use crate::error::AppError;
use crate::tracker::{NegativeTimePolicy, StartedAtPolicy, TrackerOptions, TransitionPolicy};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "PRODLINE_CONFIG_PATH";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerOptions,
    /// House model used by `create` when none is given.
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default)]
    pub resp_user: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub started_at: Option<StartedAtPolicy>,
    pub transitions: Option<TransitionPolicy>,
    pub negative_time: Option<NegativeTimePolicy>,
    pub default_model: Option<String>,
    pub resp_user: Option<String>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    crate::storage::app_file(CONFIG_ENV_VAR, CONFIG_FILE_NAME)
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

/// Lowercases `raw` and folds every run of separators into one underscore.
pub fn canonical_name(raw: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses a policy value such as `keep-first` or `Reset On Every Start`.
pub fn parse_policy<T: DeserializeOwned>(raw: &str) -> Result<T, AppError> {
    let name = canonical_name(raw).ok_or_else(|| AppError::invalid_input("policy is required"))?;
    serde_json::from_value(serde_json::Value::String(name.clone()))
        .map_err(|_| AppError::invalid_input(format!("unknown policy '{name}'")))
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();

    if let Some(policy) = overrides.started_at {
        merged.tracker.started_at = policy;
    }
    if let Some(policy) = overrides.transitions {
        merged.tracker.transitions = policy;
    }
    if let Some(policy) = overrides.negative_time {
        merged.tracker.negative_time = policy;
    }
    if let Some(model) = overrides.default_model.as_ref() {
        merged.default_model = Some(model.clone());
    }
    if let Some(user) = overrides.resp_user.as_ref() {
        merged.resp_user = Some(user.clone());
    }

    merged
}
