//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file: the path in `DUPSWEEP_CONFIG`, else `dupsweep.toml` in the
//!    platform config directory (skipped if absent)
//! 3. `DUPSWEEP_*` environment variables (e.g. `DUPSWEEP_IO_THREADS=4`)
//!
//! # Example
//!
//! ```toml
//! io_threads = 4
//! hash_algorithm = "sha256"
//! delete_mode = "trash"
//! verify_before_delete = true
//! show_progress = false
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::{DeleteConfig, DeleteMode};
use crate::duplicates::SessionConfig;
use crate::scanner::HashAlgorithm;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "DUPSWEEP_";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_VAR: &str = "DUPSWEEP_CONFIG";

/// Upper bound for `io_threads`.
pub const MAX_IO_THREADS: usize = 256;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker threads; more than one enables parallel bucket classification.
    pub io_threads: usize,
    /// Digest used for full digests and sampled fingerprints.
    pub hash_algorithm: HashAlgorithm,
    /// Permanent removal or system trash.
    pub delete_mode: DeleteMode,
    /// Re-check size and mtime before deleting.
    pub verify_before_delete: bool,
    /// Draw a progress bar while classifying.
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: 1,
            hash_algorithm: HashAlgorithm::Blake3,
            delete_mode: DeleteMode::Permanent,
            verify_before_delete: true,
            show_progress: true,
        }
    }
}

impl Config {
    /// Load the configuration, falling back to defaults on any error.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        match Self::load_from(path.as_deref()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Load the configuration from `path` (or the platform default path) and
    /// the environment.
    ///
    /// # Errors
    ///
    /// - `Load` if the file is malformed or a value has the wrong type
    /// - `Invalid` if a value is out of range
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path).extract().map_err(Box::new)?;
        config.validate()?;
        log::debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// The layered figment used by [`Self::load_from`].
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        match path.map(Path::to_path_buf).or_else(Self::config_path) {
            Some(file) if file.exists() => {
                log::debug!("Reading configuration from {}", file.display());
                figment = figment.merge(Toml::file(file));
            }
            Some(file) if path.is_some() => {
                log::warn!("Configuration file not found: {}", file.display());
            }
            _ => {}
        }
        figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.io_threads == 0 || self.io_threads > MAX_IO_THREADS {
            return Err(ConfigError::Invalid(format!(
                "io_threads must be between 1 and {}, got {}",
                MAX_IO_THREADS, self.io_threads
            )));
        }
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupsweep", "dupsweep")
            .map(|dirs| dirs.config_dir().join("dupsweep.toml"))
    }

    /// Deletion settings.
    #[must_use]
    pub fn delete_config(&self) -> DeleteConfig {
        DeleteConfig::default()
            .with_mode(self.delete_mode)
            .with_verify_before_delete(self.verify_before_delete)
    }

    /// Session settings, without a progress callback.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_io_threads(self.io_threads)
            .with_algorithm(self.hash_algorithm)
            .with_delete_config(self.delete_config())
    }
}
