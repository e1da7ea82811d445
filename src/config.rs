use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::llm::LlmConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub course: CourseConfig,
    #[serde(default)]
    pub llm: LlmSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CourseConfig {
    /// Default course id for ingest and ask commands
    pub default_course: Option<String>,
    /// Directory holding the course source documents
    pub source_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub answer_ceiling_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        let defaults = LlmConfig::default();
        Self {
            base_url: defaults.base_url,
            model: defaults.model,
            api_key: None,
            request_timeout_secs: defaults.request_timeout_secs,
            answer_ceiling_secs: defaults.answer_ceiling_secs,
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(&config_path, toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;

        Ok(home.join(".coursecoach").join("config.toml"))
    }

    /// LLM client settings from the config file
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            base_url: self.llm.base_url.clone(),
            model: self.llm.model.clone(),
            api_key: self.llm.api_key.clone(),
            request_timeout_secs: self.llm.request_timeout_secs,
            answer_ceiling_secs: self.llm.answer_ceiling_secs,
        }
    }
}
