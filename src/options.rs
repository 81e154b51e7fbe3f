//! Host options file.
//!
//! Options load from `scrollterm/config.toml` under the platform config
//! directory, with every field optional. Command-line flags override the
//! file; the file overrides built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use scrollterm_core::config::ConsoleConfig;

/// On-disk options, all optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
    /// Arena byte capacity.
    pub buffer_bytes: Option<usize>,
    /// Retained line ceiling.
    pub buffer_lines: Option<usize>,
    /// Lines evicted per block.
    pub eviction_shift: Option<usize>,
    /// Tab stop width.
    pub tab_width: Option<usize>,
    /// Input line length limit.
    pub input_line_limit: Option<usize>,
    /// Key queue capacity.
    pub key_queue_capacity: Option<usize>,
    /// History entry ceiling.
    pub history_size: Option<usize>,
    /// Start with deferred bottom-pinning on.
    pub lazy_update: Option<bool>,
}

impl Options {
    /// Load options from the default location, if the file exists.
    pub fn load_default() -> Result<Self> {
        match default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load options from a specific file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading options file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing options file {}", path.display()))
    }

    /// Apply the file's settings over a base configuration.
    #[must_use]
    pub fn apply(&self, base: ConsoleConfig) -> ConsoleConfig {
        let mut config = base;
        if let Some(v) = self.buffer_bytes {
            config.buffer_bytes = v;
        }
        if let Some(v) = self.buffer_lines {
            config.buffer_lines = v;
        }
        if let Some(v) = self.eviction_shift {
            config.eviction_shift = v;
        }
        if let Some(v) = self.tab_width {
            config.tab_width = v.max(1);
        }
        if let Some(v) = self.input_line_limit {
            config.input_line_limit = v;
        }
        if let Some(v) = self.key_queue_capacity {
            config.key_queue_capacity = v;
        }
        if let Some(v) = self.history_size {
            config.history_size = v;
        }
        config
    }
}

/// `<config dir>/scrollterm/config.toml`.
fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scrollterm").join("config.toml"))
}
