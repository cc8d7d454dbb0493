//! `[source]`, `[output]`, `[pack]` and `[timing]` sections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[source]`: the watched image directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub dir: PathBuf,
    /// Asset-path prefix stripped to derive region names.
    pub prefix: String,
    pub extensions: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets/gfx"),
            prefix: "gfx/".into(),
            extensions: vec!["png".into(), "jpg".into()],
        }
    }
}

/// `[output]`: where the artifact lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".textureCache"),
            name: "cache".into(),
        }
    }
}

/// `[pack]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    pub padding: u32,
    pub max_width: u32,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            padding: 2,
            max_width: 2048,
        }
    }
}

/// `[timing]`, all values in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub debounce_ms: u64,
    pub dispose_grace_ms: u64,
    /// Owner loop period for `texcache watch`.
    pub tick_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            dispose_grace_ms: 500,
            tick_ms: 16,
        }
    }
}
