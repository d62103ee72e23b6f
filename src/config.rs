use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

use crate::provider::Provider;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_DISPLAY_DELAY_MS: u64 = 1500;
pub const BASE_URL_ENV: &str = "PROMPT_STUDIO_URL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: Option<String>,
    pub provider: Option<String>,
    pub display_delay_ms: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: None,
            provider: Some(Provider::default().as_str().to_string()),
            display_delay_ms: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
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

    /// Record the provider, keeping the rest of the file. An unreadable file
    /// is left untouched and reported.
    pub fn save_provider(provider: Provider) -> Result<()> {
        Self::save_provider_to(&Self::get_config_path()?, provider)
    }

    pub fn save_provider_to(path: &Path, provider: Provider) -> Result<()> {
        let mut config = Self::load_from(path)?;
        config.provider = Some(provider.as_str().to_string());
        config.save_to(path)
    }

    /// Command-line flag, then environment, then config file, then the default
    pub fn resolve_base_url(&self, flag: Option<&str>, env: Option<&str>) -> String {
        // Blank values don't count as set
        [flag, env, self.base_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string()
    }

    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(Provider::from_str)
            .unwrap_or_default()
    }

    pub fn display_delay_ms(&self) -> u64 {
        self.display_delay_ms.unwrap_or(DEFAULT_DISPLAY_DELAY_MS)
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("prompt-studio"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
