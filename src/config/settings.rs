//! Application settings loaded from `config.toml`.
//!
//! The file seeds the food category reference table and sets listing defaults.
//!
//! ```toml
//! [listing]
//! include_test = false
//!
//! [[categories]]
//! name = "Bakery"
//! ```

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Listing behaviour
    #[serde(default)]
    pub listing: ListingConfig,
    /// Food categories to seed
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

/// Controls which pātaka appear in listings
#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct ListingConfig {
    /// Whether test pātaka are listed alongside production ones
    #[serde(default)]
    pub include_test: bool,
}

/// Configuration for a single seeded category
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    /// Display name of the category
    pub name: String,
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Path of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Loads configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config(DEFAULT_CONFIG_PATH)
}
