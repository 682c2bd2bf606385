/// Database configuration and connection management
pub mod database;

/// Bot settings loading from config.toml and the environment
pub mod settings;

pub use settings::Settings;
