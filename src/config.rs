// filepath: src/config.rs
//! Configuration handling for stu-signature
//!
//! This file defines the configuration structure and provides
//! functionality to load and save configuration from/to files.
//! Every field is optional on disk; the `*_resolved` helpers fill in defaults.

use crate::raster::InkStyle;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Pen and canvas settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct InkConfig {
    pub scale: Option<f64>,
    pub width: Option<f32>,
    pub color: Option<[u8; 4]>,
    /// Leave unset for a transparent canvas
    pub background: Option<[u8; 4]>,
}

/// How saved images are named
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileNaming {
    /// `<id>.png`, replacing any earlier signature
    #[default]
    Identifier,
    /// `<id>_<yyyyMMdd_HHmmss>.png`, keeping history
    Timestamped,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub naming: FileNaming,
}

/// Location of the employee table
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DeviceConfig {
    pub backend: Option<String>,
    pub recordings_dir: Option<PathBuf>,
}

/// Configuration for capture, rendering and persistence
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SignatureConfig {
    #[serde(default)]
    pub ink: InkConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub device: DeviceConfig,
}

fn data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("stu-signature")
    } else {
        PathBuf::from(".local/share/stu-signature")
    }
}

impl InkConfig {
    pub fn style(&self) -> InkStyle {
        let defaults = InkStyle::default();
        InkStyle {
            scale: self.scale.unwrap_or(defaults.scale),
            width: self.width.unwrap_or(defaults.width),
            color: self.color.unwrap_or(defaults.color),
            background: self.background,
        }
    }
}

impl OutputConfig {
    pub fn dir_resolved(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| data_dir().join("signatures"))
    }
}

impl DatabaseConfig {
    pub fn path_resolved(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| data_dir().join("employees.toml"))
    }
}

impl DeviceConfig {
    pub fn recordings_dir(&self) -> PathBuf {
        self.recordings_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("recordings"))
    }
}

impl SignatureConfig {
    /// Get the path to the configuration file
    pub fn get_config_path() -> PathBuf {
        let config_dir = if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("stu-signature")
        } else {
            PathBuf::from(".config/stu-signature")
        };

        config_dir.join("config.toml")
    }

    /// Load configuration from the default location
    pub fn load_from_file() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from(&Self::get_config_path())
    }

    /// Load configuration from `path`, writing defaults there if it is missing
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        match fs::read_to_string(path) {
            Ok(content) => {
                let config: Self = toml::from_str(&content)?;
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let default_config = Self::default();
                default_config.save_to(path)?;
                Ok(default_config)
            }
            Err(e) => Err(Box::new(e)),
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !Path::exists(parent) {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }
}
