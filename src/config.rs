use crate::constants::{CONFIG_DIR_NAME, DEFAULT_FFMPEG_PATH, DEFAULT_FFPROBE_PATH};
use crate::presets::{OutputFormat, QualityPreset};
use crate::services::OverwritePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub last_input_dir: Option<PathBuf>,
    pub last_output_dir: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub quality: QualityPreset,
    pub overwrite_policy: OverwritePolicy,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            last_input_dir: None,
            last_output_dir: None,
            output_format: OutputFormat::default(),
            quality: QualityPreset::Original,
            overwrite_policy: OverwritePolicy::default(),
            ffmpeg_path: DEFAULT_FFMPEG_PATH.to_string(),
            ffprobe_path: DEFAULT_FFPROBE_PATH.to_string(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join("config.json"))
    }

    /// Loads from the user config directory, falling back to defaults.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::warn!("Could not determine config directory, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("Config file doesn't exist, using defaults");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Config loaded from: {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file, using defaults: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!("Config saved to: {:?}", path);
        Ok(())
    }

    pub fn update_last_input_dir(&mut self, file: &Path) {
        self.last_input_dir = file.parent().map(Path::to_path_buf);
    }

    pub fn update_last_output_dir(&mut self, dir: &Path) {
        self.last_output_dir = Some(dir.to_path_buf());
    }
}
