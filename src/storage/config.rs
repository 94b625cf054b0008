//! JSON Configuration Management
//!
//! Handles reading and writing the engine configuration file. Environment
//! overrides are layered on top at read time and never written back.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::Settings;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::config_path;

/// Configuration service for managing engine settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigService {
    /// Load ~/.prompt-coach/config.json, or defaults when it does not exist
    pub fn new() -> AppResult<Self> {
        Self::from_path(config_path()?)
    }

    /// Load configuration from an explicit path, or defaults when it does not exist
    pub fn from_path(config_path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = config_path.into();
        let settings = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Settings::default()
        };

        Ok(Self {
            config_path,
            settings,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<Settings> {
        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate().map_err(AppError::validation)?;
        Ok(settings)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, settings: &Settings) -> AppResult<()> {
        settings.validate().map_err(AppError::validation)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Settings as stored in the file
    pub fn file_settings(&self) -> &Settings {
        &self.settings
    }

    /// Settings with environment overrides applied
    pub fn effective(&self) -> Settings {
        let mut settings = self.settings.clone();
        settings.apply_env_overrides();
        settings
    }

    /// Replace the stored settings and persist them
    pub fn update(&mut self, settings: Settings) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &settings)?;
        self.settings = settings;
        Ok(())
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.settings)
    }

    /// Reload configuration from disk
    pub fn reload(&mut self) -> AppResult<()> {
        self.settings = Self::load_from_file(&self.config_path)?;
        Ok(())
    }

    /// Path of the backing file
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
