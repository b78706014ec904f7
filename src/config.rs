//! Persisted helper configuration.
//!
//! Small serde struct stored under the platform config directory. Absent or
//! unreadable files fall back to defaults; nothing here is fatal.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::ShaderError;
use crate::geometry::MeshKind;
use crate::shader_constants::{DEFAULT_FFT_SIZE, SPECTRUM_LEN};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HelperConfig {
    /// Analyzer FFT size used when filling `iAudio` each tick.
    pub fft_size: usize,
    /// Target length of the spectrum arrays fed to the shader.
    pub spectrum_len: usize,
    pub default_mesh: MeshKind,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            spectrum_len: SPECTRUM_LEN,
            default_mesh: MeshKind::Plane,
            canvas_width: 512,
            canvas_height: 512,
        }
    }
}

impl HelperConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("shader_helper").join("config.json"))
    }

    /// Load the saved config, or defaults when none exists or it fails to
    /// parse.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Ignoring malformed config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<(), ShaderError> {
        let Some(path) = Self::config_path() else {
            return Err(ShaderError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no config directory on this platform",
            )));
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        log::info!("Saved config to {}", path.display());
        Ok(())
    }
}
