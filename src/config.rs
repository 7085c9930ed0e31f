//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults (`defaults/cfgtree.default.toml`)
//! 2. Global config: `$XDG_CONFIG_HOME/cfgtree/cfgtree.toml`
//! 3. Local config file passed by the caller
//! 4. Environment variables: `CFGTREE_*` prefix, `__` between sections

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, Map, ValueKind};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::ApplicationError;

const DEFAULT_TOML: &str = include_str!("../defaults/cfgtree.default.toml");

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "CFGTREE";

/// Converter knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConverterSettings {
    /// Deepest node a bounded conversion accepts (root = 1); 0 means unbounded
    pub max_depth: usize,
}

/// Tree rendering knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplaySettings {
    /// Print scalar values next to their keys
    pub show_values: bool,
}

/// Unified configuration for cfgtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub converter: ConverterSettings,
    pub display: DisplaySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            converter: ConverterSettings { max_depth: 0 },
            display: DisplaySettings { show_values: true },
        }
    }
}

/// Get the XDG config directory for cfgtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "cfgtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("cfgtree.toml"))
}

/// Helper for layering overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer the global config file if it exists.
    pub fn with_global(self) -> Self {
        match global_config_path() {
            Some(path) => self.with_optional_file(path),
            None => self,
        }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer `CFGTREE_*` environment variables, e.g. `CFGTREE_CONVERTER__MAX_DEPTH=64`.
    pub fn with_env(mut self) -> Self {
        self.builder = self.builder.add_source(environment());
        self
    }

    /// Layer the given variables as if they were the process environment.
    ///
    /// Same prefix and separator rules as [`Loader::with_env`]; the real
    /// environment is not read.
    pub fn with_env_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let vars: Map<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.builder = self.builder.add_source(environment().source(Some(vars)));
        self
    }

    /// Apply a single key/value override.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ApplicationError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value).map_err(config_err)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<Settings, ApplicationError> {
        self.builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(config_err)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional config file layered over the global one
    #[instrument(level = "debug")]
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut loader = Loader::new().with_global();
        if let Some(path) = local {
            loader = loader.with_optional_file(path);
        }
        let settings = loader.with_env().build()?;
        debug!(?settings, "settings loaded");
        Ok(settings)
    }

    /// Only the compiled defaults.
    pub fn load_defaults() -> Result<Self, ApplicationError> {
        Loader::new().build()
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# cfgtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/cfgtree/cfgtree.toml
#   Local:  file passed to Settings::load
#   Env:    CFGTREE_* environment variables, e.g. CFGTREE_CONVERTER__MAX_DEPTH=64

[converter]
# Deepest node (root = 1) a bounded conversion accepts; 0 disables the limit
# max_depth = 0

[display]
# Print scalar values next to their keys when rendering trees
# show_values = true
"#
        .to_string()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
