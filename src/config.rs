use crate::analyser::filter::OperatorPolicy;
use crate::analyser::io::{DEFAULT_MISSING_MARKER, LoadOptions};
use crate::analyser::types::ComparisonMetric;
use crate::error::{NutriError, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub food_csv: PathBuf,
    pub drinks_csv: PathBuf,
    pub missing_marker: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            food_csv: PathBuf::from("data/starbucks-menu-nutrition-food.csv"),
            drinks_csv: PathBuf::from("data/starbucks-menu-nutrition-drinks.csv"),
            missing_marker: DEFAULT_MISSING_MARKER.to_owned(),
        }
    }
}

impl DataConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            missing_marker: self.missing_marker.clone(),
            ..LoadOptions::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FilterConfig {
    /// Keep the historical pass-through on unrecognized operators.
    pub permissive_operators: bool,
}

impl FilterConfig {
    pub fn policy(&self) -> OperatorPolicy {
        if self.permissive_operators {
            OperatorPolicy::Permissive
        } else {
            OperatorPolicy::Strict
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub comparison_metrics: Vec<ComparisonMetric>,
    pub chart_metrics: Vec<ComparisonMetric>,
    pub chart_width: usize,
    /// When set, rendered charts are also written here.
    pub chart_dir: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            comparison_metrics: vec![ComparisonMetric::Mean, ComparisonMetric::Min],
            chart_metrics: vec![ComparisonMetric::Mean],
            chart_width: 50,
            chart_dir: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AIConfig {
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_owned(),
            api_base: "https://api.groq.com/openai/v1".to_owned(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub data: DataConfig,
    pub filter: FilterConfig,
    pub report: ReportConfig,
    pub ai: AIConfig,
}

pub fn get_config_path() -> PathBuf {
    crate::utils::standard_paths().config_dir.join("config.json")
}

/// Load settings from `path` (or the default location).
///
/// A missing or unreadable file yields the defaults.
pub fn load_app_config(path: Option<&Path>) -> AppSettings {
    let path = path.map_or_else(get_config_path, Path::to_path_buf);
    if path.exists()
        && let Ok(content) = std::fs::read_to_string(&path)
    {
        match serde_json::from_str::<AppSettings>(&content) {
            Ok(settings) => {
                tracing::debug!(path = %path.display(), "loaded configuration");
                return settings;
            }
            Err(e) => tracing::warn!(path = %path.display(), "ignoring invalid configuration: {e}"),
        }
    }

    AppSettings::default()
}

/// Write `settings` as pretty JSON to `path` (or the default location).
///
/// # Errors
///
/// Returns [`NutriError::Io`] if the file or its parent directory cannot be
/// written.
pub fn save_app_config(settings: &AppSettings, path: Option<&Path>) -> Result<()> {
    let path = path.map_or_else(get_config_path, Path::to_path_buf);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Read the assistant API key, loading a `.env` file first if present.
///
/// # Errors
///
/// Returns [`NutriError::Config`] if the variable is unset or empty.
pub fn load_api_key() -> Result<SecretString> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {e}");
    }

    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(SecretString::new(key.into())),
        _ => Err(NutriError::Config(format!(
            "{API_KEY_ENV} not found in environment or .env file"
        ))),
    }
}
