use crate::agent::dispatch::DEFAULT_MAX_RECURSIONS;
use crate::providers::models::DEFAULT_MODEL_ID;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const ARCHCHAT_DIR: &str = ".archchat";

pub const DEFAULT_RETRIEVAL_RESULTS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub region: Option<String>,
    pub model_id: String,
    pub max_recursions: usize,
    /// Directory holding diagrams and the tool data files.
    pub data_dir: PathBuf,
    pub knowledge_base_id: Option<String>,
    pub retrieval_results: usize,
    pub tools_enabled: bool,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            region: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            max_recursions: DEFAULT_MAX_RECURSIONS,
            data_dir: PathBuf::from("demo"),
            knowledge_base_id: None,
            retrieval_results: DEFAULT_RETRIEVAL_RESULTS,
            tools_enabled: true,
            max_tokens: None,
            temperature: None,
            system_prompt: None,
        }
    }
}

pub fn get_archchat_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(ARCHCHAT_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_archchat_dir().join("config.toml")
}

pub fn ensure_archchat_dir() -> Result<PathBuf> {
    let archchat_dir = get_archchat_dir();

    if !archchat_dir.exists() {
        std::fs::create_dir_all(&archchat_dir).with_context(|| {
            format!(
                "Failed to create archchat directory at {}",
                archchat_dir.display()
            )
        })?;
    }

    Ok(archchat_dir)
}

impl Config {
    /// Reads the config file when there is one, then lets the environment
    /// override it.
    pub fn load_or_init() -> Result<Self> {
        let mut config = if config_exists() {
            load_config()?
        } else {
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(region) = non_empty("AWS_REGION").or_else(|| non_empty("AWS_DEFAULT_REGION")) {
            self.region = Some(region);
        }
        if let Some(kb) = non_empty("KNOWLEDGE_BASE_ID") {
            self.knowledge_base_id = Some(kb);
        }
        if let Some(model) = non_empty("ARCHCHAT_MODEL_ID") {
            self.model_id = model;
        }
    }

    pub fn resolved_region(&self) -> Result<&str> {
        self.region
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No AWS region configured. Set AWS_REGION or run 'archchat onboard'."
                )
            })
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).context("Failed to parse config")
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path();

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "Config file not found. Run 'archchat onboard' to set up your configuration."
            )
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", config_path.display(), e)
        }
    })?;

    parse_config(&content).with_context(|| format!("Invalid config at {}", config_path.display()))
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_archchat_dir()?;

    let config_path = get_config_path();
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}
