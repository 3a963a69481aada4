// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON at `<config dir>/photobooth/config.json`. A missing file
//! means defaults. The `PORT` environment variable only matters to `serve`,
//! which resolves it through [`Config::serve_port`].

use crate::backends::camera::CameraSpec;
use crate::constants::{capture, export, frame, server};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Static delivery settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory holding the built client bundle
    pub bundle_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: server::DEFAULT_HOST.to_string(),
            port: server::DEFAULT_PORT,
            bundle_dir: PathBuf::from(server::DEFAULT_BUNDLE_DIR),
        }
    }
}

/// Camera settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub camera: CameraSpec,
    /// Mirror preview and photos horizontally (selfie mode)
    pub mirror: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            camera: CameraSpec::Auto,
            mirror: true,
            width: capture::DEFAULT_WIDTH,
            height: capture::DEFAULT_HEIGHT,
        }
    }
}

/// Export settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub output_dir: PathBuf,
    pub scale: u32,
    pub caption: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            scale: export::SCALE,
            caption: frame::DEFAULT_CAPTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub capture: CaptureSettings,
    pub export: ExportSettings,
}

impl Config {
    /// `<config dir>/photobooth/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(export::DIRECTORY_NAME).join("config.json"))
    }

    /// Load from `path` (or the default location)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Read a config file; a missing file yields defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let config: Config = serde_json::from_str(&text)?;
                info!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Port for `serve`: the command-line flag, then `env_port`, then the config
    ///
    /// A malformed `env_port` is an error unless the flag already decided.
    pub fn serve_port(&self, flag: Option<u16>, env_port: Option<&str>) -> Result<u16, ConfigError> {
        if let Some(port) = flag {
            return Ok(port);
        }
        let Some(value) = env_port.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(self.server.port);
        };
        let port: u16 = value.parse().map_err(|_| {
            ConfigError::Invalid(format!("{}={:?} is not a valid port", server::PORT_ENV, value))
        })?;
        debug!(port, "Port set from environment");
        Ok(port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.export.scale == 0 || self.export.scale > export::MAX_SCALE {
            return Err(ConfigError::Invalid(format!(
                "export.scale must be between 1 and {}",
                export::MAX_SCALE
            )));
        }
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(ConfigError::Invalid(
                "capture.width and capture.height must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }
}

/// `<Pictures>/photobooth`, falling back to the home or current directory
fn default_output_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(export::DIRECTORY_NAME)
}
