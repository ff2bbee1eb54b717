//! Configuration module for phone-recon
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use once_cell::sync::OnceCell;
use std::path::PathBuf;
use tracing::info;

/// Global settings instance
static SETTINGS: OnceCell<Settings> = OnceCell::new();

/// Initialize global settings with an already loaded value
pub fn init(settings: Settings) -> anyhow::Result<&'static Settings> {
    settings.validate()?;
    SETTINGS
        .set(settings)
        .map_err(|_| anyhow::anyhow!("Settings already initialized"))?;
    Ok(get())
}

/// Get a reference to the global settings
pub fn get() -> &'static Settings {
    SETTINGS.get_or_init(Settings::default)
}

/// Locate and load settings: explicit path, env var, default locations, then defaults
pub fn load(explicit: Option<PathBuf>) -> anyhow::Result<Settings> {
    let mut candidates = Vec::new();
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("settings file not found: {}", path.display());
        }
        candidates.push(path);
    }
    if let Ok(path) = std::env::var("PHONE_RECON_SETTINGS_PATH") {
        candidates.push(PathBuf::from(path));
    }
    candidates.push(PathBuf::from("settings.yml"));
    candidates.push(PathBuf::from("config/settings.yml"));
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("phone-recon/settings.yml"));
    }

    let mut settings = match candidates.iter().find(|p| p.exists()) {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };
    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}
