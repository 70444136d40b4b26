//! CLI Configuration

use crate::output::OutputFormat;
use anyhow::{anyhow, Context as _, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DATA_FILE_NAME: &str = "isms-data.json";

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub data_file: Option<PathBuf>,
    pub autosave_interval_secs: Option<u64>,
    pub default_format: Option<String>,
}

impl Config {
    pub const KEYS: [&'static str; 3] = ["data_file", "autosave_interval_secs", "default_format"];

    pub fn load(profile: Option<&str>) -> Result<Self> {
        Self::load_from(&Self::config_path(profile)?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, profile: Option<&str>) -> Result<PathBuf> {
        let path = Self::config_path(profile)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn config_path(profile: Option<&str>) -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot find home directory"))?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".isms").join(filename))
    }

    /// Configured data file, or the platform data directory
    pub fn data_file(&self) -> PathBuf {
        if let Some(path) = &self.data_file {
            return path.clone();
        }
        dirs::data_dir()
            .map(|d| d.join("isms"))
            .or_else(|| dirs::home_dir().map(|h| h.join(".isms")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DATA_FILE_NAME)
    }

    pub fn autosave_interval(&self) -> Duration {
        self.autosave_interval_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(isms_common::autosave::DEFAULT_AUTOSAVE_INTERVAL)
    }

    pub fn default_format(&self) -> Result<OutputFormat> {
        match &self.default_format {
            None => Ok(OutputFormat::Table),
            Some(f) => OutputFormat::from_str(f, true).map_err(|e| anyhow!("default_format: {}", e)),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(match key {
            "data_file" => self.data_file.as_ref().map(|p| p.display().to_string()),
            "autosave_interval_secs" => self.autosave_interval_secs.map(|s| s.to_string()),
            "default_format" => self.default_format.clone(),
            _ => return Err(anyhow!("Unknown config key: {}", key)),
        })
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_file" => self.data_file = Some(PathBuf::from(value)),
            "autosave_interval_secs" => {
                self.autosave_interval_secs = Some(value.parse().context("autosave_interval_secs must be a number")?)
            }
            "default_format" => {
                OutputFormat::from_str(value, true).map_err(|e| anyhow!("default_format: {}", e))?;
                self.default_format = Some(value.to_string());
            }
            _ => return Err(anyhow!("Unknown config key: {}", key)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("none.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.autosave_interval(), Duration::from_secs(30));
        assert!(matches!(config.default_format().unwrap(), OutputFormat::Table));
    }

    #[test]
    fn test_set_and_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.set("data_file", "/tmp/acme.json").unwrap();
        config.set("autosave_interval_secs", "10").unwrap();
        config.set("default_format", "yaml").unwrap();
        assert!(config.set("default_format", "xml").is_err());
        assert!(config.set("api_key", "x").is_err());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.data_file(), PathBuf::from("/tmp/acme.json"));
        assert_eq!(loaded.autosave_interval(), Duration::from_secs(10));
        assert_eq!(loaded.get("default_format").unwrap().as_deref(), Some("yaml"));
    }
}
