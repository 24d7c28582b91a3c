//! Configuration to acknowledge developer preferences as well as set defaults.
//!
//! Specifically, we try to find a hexnode.toml, and if present we load settings from there.
//! This controls whether loaded trees are merged and how the outline prints offsets.

use crate::outline::OutlineOptions;
use facet::Facet;
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// File looked up in the working directory when no explicit path is given.
pub const CONFIG_FILE: &str = "hexnode.toml";

#[derive(Facet, Clone, Debug, PartialEq, Eq)]
/// User preferences loaded from hexnode.toml or falling back to defaults.
pub struct Config {
    #[facet(default = true)]
    /// Coalesce every node's ranges after a tree is loaded.
    pub merge_ranges: bool,
    #[facet(default = true)]
    /// Print outline offsets in hexadecimal.
    pub hex_offsets: bool,
    #[facet(default = true)]
    /// Print each node's ranges in the outline.
    pub show_ranges: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            merge_ranges: true,
            hex_offsets: true,
            show_ranges: true,
        }
    }
}

impl Config {
    #[must_use]
    /// Load configuration from hexnode.toml if present.
    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    #[must_use]
    /// Load configuration from `path`, keeping defaults for anything missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = fs::read_to_string(path) else {
            debug!("no config at {}, using defaults", path.display());
            return Self::default();
        };
        match Self::parse(&contents) {
            Ok(config) => config,
            Err(reason) => {
                warn!("ignoring invalid config {}: {reason}", path.display());
                Self::default()
            }
        }
    }

    /// Parse TOML preferences, filling anything unspecified with defaults.
    ///
    /// # Errors
    ///
    /// Returns the TOML parser's description of why the text was rejected.
    pub fn parse(contents: &str) -> Result<Self, String> {
        facet_toml::from_str::<Self>(contents).map_err(|e| e.to_string())
    }

    #[must_use]
    /// Outline switches derived from these preferences.
    pub fn outline_options(&self) -> OutlineOptions {
        OutlineOptions {
            hex_offsets: self.hex_offsets,
            show_ranges: self.show_ranges,
        }
    }
}

#[cfg(test)]
#[path = "tests/config.rs"]
mod tests;
