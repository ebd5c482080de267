//! TOML configuration for the KSP tools.
//!
//! ```toml
//! [compiler]
//! executable = "python3"
//! script = "/opt/ksp/ksp_compiler.py"
//! optimize = true
//! indent_size = 2
//!
//! [validate]
//! enabled = true
//! delay_ms = 300
//! file_patterns = ["*.ksp", "*.txt"]
//! ```

use std::path::{Path, PathBuf};

use ksp_validate::{CompilerOptions, ValidateSettings};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KspConfig {
    pub compiler: Option<CompilerOptions>,
    pub validate: Option<ValidateSettings>,
}

impl KspConfig {
    /// Load from the default location. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Load from `path`. `Ok(None)` when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn compiler_options(&self) -> CompilerOptions {
        self.compiler.clone().unwrap_or_default()
    }

    #[must_use]
    pub fn validate_settings(&self) -> ValidateSettings {
        self.validate.clone().unwrap_or_default()
    }
}

/// `~/.ksp/config.toml`
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ksp").join("config.toml"))
}
