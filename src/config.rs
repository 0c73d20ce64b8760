// src/config.rs

//! Engine configuration, deserializable from a JSON file.
//!
//! Everything has a sensible default so an empty (or absent) file yields a
//! working terminal. Rendering concerns (fonts, windows) are configured by
//! the embedding layer, not here.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::color::Rgb;

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub shell: ShellConfig,
    pub behavior: BehaviorConfig,
    pub colors: ColorConfig,
}

/// Shell spawning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Program to spawn. Empty means "consult $SHELL, then /bin/sh".
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        ShellConfig {
            program: String::new(),
            args: Vec::new(),
        }
    }
}

impl ShellConfig {
    /// Resolves the configured program against the environment.
    pub fn resolve_program(&self) -> String {
        if !self.program.is_empty() {
            return self.program.clone();
        }
        std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
    }
}

/// Grid behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Maximum scrollback lines retained by the primary buffer.
    pub scrollback_limit: usize,
    /// Characters treated as word separators by double-click selection.
    pub word_separators: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        BehaviorConfig {
            scrollback_limit: 10_000,
            word_separators: " \t\"'`()[]{}<>|,;".to_string(),
        }
    }
}

/// Default color slots for the palette.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub foreground: Rgb,
    pub background: Rgb,
}

impl Default for ColorConfig {
    fn default() -> Self {
        ColorConfig {
            foreground: Rgb(229, 229, 229),
            background: Rgb(0, 0, 0),
        }
    }
}

impl Config {
    /// Loads configuration from a JSON file; missing fields take defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}
