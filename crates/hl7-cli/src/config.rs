//! Settings file for the compiler front end

use hl7_grammar::CompilerConfig;
use hl7_schema::LoaderConfig;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read settings file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {message}")]
    Parse { path: String, message: String },
}

/// Loader and compiler settings, each section optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub loader: LoaderConfig,
    pub compiler: CompilerConfig,
}

impl Settings {
    /// Read settings from a YAML (`.yaml`, `.yml`) or JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: shown.clone(),
            source,
        })?;

        let yaml = path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml");
        let settings = if yaml {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
        .map_err(|message| ConfigError::Parse {
            path: shown.clone(),
            message,
        })?;

        debug!(path = %shown, "Loaded settings");
        Ok(settings)
    }

    fn from_yaml(content: &str) -> Result<Self, String> {
        serde_yaml::from_str(content).map_err(|e| format!("YAML parse error: {}", e))
    }

    fn from_json(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| format!("JSON parse error: {}", e))
    }

    /// Apply command-line overrides on top of the file values
    pub fn override_loader(&mut self, max_version: Option<u32>, block_list: &[String]) {
        if let Some(max_version) = max_version {
            self.loader.max_version = max_version;
        }
        self.loader.block_list.extend(block_list.iter().cloned());
    }
}
