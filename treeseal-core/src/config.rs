//! Configuration discovery
//!
//! Resolution order:
//! 1. Explicit `--config` path (must exist)
//! 2. `<platform config dir>/treeseal/config.yml`, if present
//! 3. Built-in defaults
//!
//! Command-line flags override whatever the configuration says.

use crate::error::SealError;
use crate::walker::IgnoreSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Private key used when neither flag nor configuration names one
pub const DEFAULT_PRIVATE_KEY_PATH: &str = "../private_key.pem";

/// Public key used when neither flag nor configuration names one
pub const DEFAULT_PUBLIC_KEY_PATH: &str = "../public_key.pem";

/// Folders skipped unless configured otherwise
pub const DEFAULT_IGNORE_FOLDERS: &[&str] = &["__pycache__"];

const CONFIG_FILENAME: &str = "config.yml";

fn default_ignore_folders() -> Vec<String> {
    DEFAULT_IGNORE_FOLDERS.iter().map(|s| s.to_string()).collect()
}

/// Settings shared by the signing and verification commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SealConfig {
    /// Directory basenames skipped by both walks
    #[serde(default = "default_ignore_folders")]
    pub ignore_folders: Vec<String>,

    /// PKCS#8 PEM private key for signing
    #[serde(default)]
    pub private_key: Option<PathBuf>,

    /// SPKI PEM public key for verification
    #[serde(default)]
    pub public_key: Option<PathBuf>,
}

impl Default for SealConfig {
    fn default() -> Self {
        SealConfig {
            ignore_folders: default_ignore_folders(),
            private_key: None,
            public_key: None,
        }
    }
}

impl SealConfig {
    /// Discover and load the configuration
    pub fn discover(cli_override: Option<&Path>) -> Result<Self, SealError> {
        trace!("Discovering treeseal configuration");

        if let Some(path) = cli_override {
            if !path.exists() {
                return Err(SealError::Config {
                    path: path.to_path_buf(),
                    reason: "file does not exist".to_string(),
                });
            }
            debug!("Using --config override: {}", path.display());
            return Self::load_from(path);
        }

        match Self::platform_config_path() {
            Some(path) if path.exists() => {
                info!("Found configuration at {}", path.display());
                Self::load_from(&path)
            }
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load a configuration file
    pub fn load_from(path: &Path) -> Result<Self, SealError> {
        let content = std::fs::read_to_string(path).map_err(|e| SealError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // An empty file means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml_ng::from_str(&content).map_err(|e| SealError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// `<config dir>/treeseal/config.yml` for the current platform
    pub fn platform_config_path() -> Option<PathBuf> {
        // On Linux: ~/.config/treeseal/
        // On macOS: ~/Library/Application Support/treeseal/
        // On Windows: %APPDATA%\treeseal\config\
        directories::ProjectDirs::from("", "", "treeseal")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
    }

    /// The ignore set, replaced by `overrides` when any are given
    pub fn ignore_set(&self, overrides: &[String]) -> IgnoreSet {
        if overrides.is_empty() {
            IgnoreSet::new(self.ignore_folders.iter().cloned())
        } else {
            IgnoreSet::new(overrides.iter().cloned())
        }
    }

    /// Private key path: flag, then configuration, then default
    pub fn private_key_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.private_key.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PRIVATE_KEY_PATH))
    }

    /// Public key path: flag, then configuration, then default
    pub fn public_key_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.public_key.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_KEY_PATH))
    }
}
