//! Bot settings loaded from config.toml with environment overrides.
//!
//! Every field has a default, so a missing config file is not an error. The bot
//! token is deliberately not part of the settings; it is read from
//! `TELEGRAM_BOT_TOKEN` right before the gateway client is built.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{path::Path, time::Duration};
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Bot behaviour settings
    #[serde(default)]
    pub bot: Settings,
}

/// Runtime settings for the bot engine and its launcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the Telegram Bot API
    pub api_url: String,
    /// Bot handle, shown in collection invitations. When set, `/command@other`
    /// addressed to a different bot is ignored
    pub bot_username: Option<String>,
    /// Currency code recorded on every transaction
    pub currency: String,
    /// Idle time after which a creation dialog is discarded
    pub session_timeout_secs: u64,
    /// How often the idle-session sweep runs
    pub sweep_interval_secs: u64,
    /// Address the webhook receiver binds to
    pub listen_addr: String,
    /// Path the chat platform posts updates to
    pub webhook_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "https://api.telegram.org".to_string(),
            bot_username: None,
            currency: "RUB".to_string(),
            session_timeout_secs: 30 * 60,
            sweep_interval_secs: 5 * 60,
            listen_addr: "0.0.0.0:8080".to_string(),
            webhook_path: "/telegram-webhook".to_string(),
        }
    }
}

impl Settings {
    /// Maximum idle time of a conversation session.
    #[must_use]
    pub const fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    /// Interval between two sweeps.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Applies `BOT_USERNAME`, `BOT_CURRENCY` and `LISTEN_ADDR` overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(username) = std::env::var("BOT_USERNAME") {
            self.bot_username = Some(username);
        }
        if let Ok(currency) = std::env::var("BOT_CURRENCY") {
            self.currency = currency;
        }
        if let Ok(addr) = std::env::var("LISTEN_ADDR") {
            self.listen_addr = addr;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.session_timeout_secs == 0 {
            return Err(Error::Config {
                message: "session_timeout_secs must be greater than zero".to_string(),
            });
        }
        if self.sweep_interval_secs == 0 {
            return Err(Error::Config {
                message: "sweep_interval_secs must be greater than zero".to_string(),
            });
        }
        if !self.webhook_path.starts_with('/') {
            return Err(Error::Config {
                message: format!("webhook_path must start with '/': {}", self.webhook_path),
            });
        }
        Ok(())
    }
}

/// Loads bot settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value is out of range
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_config(&contents)
}

fn parse_config(contents: &str) -> Result<Settings> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.bot.validate()?;
    Ok(config.bot)
}

/// Loads settings from `CONFIG_PATH` (default `./config.toml`), falling back to
/// defaults when the file does not exist, then applies environment overrides.
pub fn load_settings() -> Result<Settings> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let mut settings = if Path::new(&path).exists() {
        debug!("Loading settings from {path}");
        load_config(&path)?
    } else {
        info!("No config file at {path}, using default settings");
        Settings::default()
    };
    settings.apply_env_overrides();
    settings.validate()?;
    Ok(settings)
}
