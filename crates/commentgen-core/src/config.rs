use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::ModelChoice;
use crate::prompt::PromptPolicy;

pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const NVIDIA_API_KEY_VAR: &str = "NVIDIA_API_KEY";

/// The environment variable holding a backend's credential.
pub fn api_key_var(model: ModelChoice) -> &'static str {
    match model {
        ModelChoice::Gemini => GEMINI_API_KEY_VAR,
        ModelChoice::Gemma => NVIDIA_API_KEY_VAR,
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub default_model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub nvidia_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nvidia_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nvidia_base_url: Option<String>,
    pub policy: PromptPolicy,
}

impl Config {
    pub fn new() -> Self {
        Self {
            default_model: Some(ModelChoice::default().as_str().to_string()),
            ..Default::default()
        }
    }

    /// Load the config file (if any), then apply API keys from the environment.
    pub fn load() -> Result<Self> {
        let config = Self::load_from(&Self::get_config_path()?)?;
        Ok(config.with_env_overrides(|name| std::env::var(name).ok()))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Environment variables win over keys stored in the file.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(GEMINI_API_KEY_VAR).filter(|k| !k.trim().is_empty()) {
            self.gemini_api_key = Some(key);
        }
        if let Some(key) = lookup(NVIDIA_API_KEY_VAR).filter(|k| !k.trim().is_empty()) {
            self.nvidia_api_key = Some(key);
        }
        self
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Persist only the selected model, keeping keys that came from the
    /// environment out of the file.
    pub fn save_default_model(model: ModelChoice) -> Result<()> {
        let path = Self::get_config_path()?;
        let mut config = Self::load_from(&path).unwrap_or_else(|_| Self::new());
        config.default_model = Some(model.as_str().to_string());
        config.save_to(&path)
    }

    pub fn model(&self) -> ModelChoice {
        self.default_model
            .as_deref()
            .and_then(ModelChoice::from_str)
            .unwrap_or_default()
    }

    /// The credential for a backend, if one is configured and non-blank.
    pub fn api_key(&self, model: ModelChoice) -> Option<&str> {
        let key = match model {
            ModelChoice::Gemini => self.gemini_api_key.as_deref(),
            ModelChoice::Gemma => self.nvidia_api_key.as_deref(),
        };
        key.map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("comment-gen").join("config.json"))
    }
}
