/// Database configuration and connection management
pub mod database;

/// Category seeds and listing defaults from config.toml
pub mod settings;
