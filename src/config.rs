use crate::error::{ConvertError, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub raw_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("raw"),
            output_dir: PathBuf::from("cldf"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ConvertError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path, e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}
