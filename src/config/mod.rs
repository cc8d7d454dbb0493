//! Project configuration from `texcache.toml`.
//!
//! # Sections
//!
//! | Section    | Purpose                                          |
//! |------------|--------------------------------------------------|
//! | `[source]` | Watched image directory, region prefix, exts     |
//! | `[output]` | Artifact directory and base name                 |
//! | `[pack]`   | Packer padding and page width                    |
//! | `[timing]` | Debounce, dispose grace period, watch tick       |
//!
//! Every field has a default, so a missing file is not an error. Relative
//! directories resolve against the directory holding the config file.

mod error;
mod section;
mod util;

pub use error::ConfigError;
pub use section::{OutputConfig, PackConfig, SourceConfig, TimingConfig};

use util::{find_config_file, resolve_against};

use crate::cache::CacheSettings;
use crate::cli::{Cli, Commands};
use crate::log;
use crate::packer::PackSettings;
use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Root configuration structure representing texcache.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TexCacheConfig {
    /// Absolute path to the config file, empty when running on defaults
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file, or cwd
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub pack: PackConfig,

    #[serde(default)]
    pub timing: TimingConfig,
}

impl TexCacheConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// Searches upward from cwd for the config file; without one, defaults
    /// are used with cwd as the project root.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cwd, &cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = path;
                config
            }
            None => {
                crate::debug!("config"; "no {} found, using defaults", cli.config.display());
                Self::default()
            }
        };

        let root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);
        config.finalize(&root);
        config.apply_command_options(cli);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// Resolve directories against `root` and normalize extensions.
    fn finalize(&mut self, root: &Path) {
        self.root = root.to_path_buf();
        self.source.dir = resolve_against(root, &self.source.dir);
        self.output.dir = resolve_against(root, &self.output.dir);

        for ext in &mut self.source.extensions {
            *ext = ext.trim_start_matches('.').to_ascii_lowercase();
        }
        let mut seen = FxHashSet::default();
        self.source
            .extensions
            .retain(|ext| !ext.is_empty() && seen.insert(ext.clone()));
    }

    /// CLI flags override config values.
    fn apply_command_options(&mut self, cli: &Cli) {
        if let Commands::Watch {
            debounce: Some(ms), ..
        } = &cli.command
        {
            self.timing.debounce_ms = *ms;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pack.max_width == 0 {
            return Err(ConfigError::Validation(
                "[pack.max_width] must be greater than 0".into(),
            ));
        }
        if self.source.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "[source.extensions] must list at least one image extension".into(),
            ));
        }
        if self.output.name.trim().is_empty() {
            return Err(ConfigError::Validation("[output.name] must not be empty".into()));
        }
        if self.output.name.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "[output.name] `{}` must be a plain file name",
                self.output.name
            )));
        }
        if self.timing.tick_ms == 0 {
            return Err(ConfigError::Validation(
                "[timing.tick_ms] must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            source_dir: self.source.dir.clone(),
            out_dir: self.output.dir.clone(),
            name: self.output.name.clone(),
            region_prefix: self.source.prefix.clone(),
            extensions: self.source.extensions.clone(),
            debounce: Duration::from_millis(self.timing.debounce_ms),
            dispose_grace: Duration::from_millis(self.timing.dispose_grace_ms),
        }
    }

    pub fn pack_settings(&self) -> PackSettings {
        PackSettings {
            padding: self.pack.padding,
            max_width: self.pack.max_width,
            extensions: self.source.extensions.clone(),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.timing.tick_ms)
    }
}
