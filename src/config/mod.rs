pub mod model;

use anyhow::{Context, Result};
use std::path::PathBuf;

pub use model::{
    AppConfig, CaptchaConfig, LoggingConfig, PortalConfig, SessionCheckMode, SessionConfig, UiConfig,
};

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("portaldash")
        .join("config.toml")
}

/// Load the config file, writing the defaults on first run.
pub fn load_config() -> Result<AppConfig> {
    let path = config_path();
    if !path.exists() {
        let config = AppConfig::default();
        // A read-only config dir is not fatal; we just run on defaults.
        if let Err(e) = save_config(&config) {
            eprintln!("Warning: {:#}", e);
        }
        return Ok(config);
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }
    let contents = toml::to_string_pretty(config).with_context(|| "Failed to serialize config")?;
    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    Ok(())
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
