use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::UndatedPolicy;
use crate::error::{RekapError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Overrides the rule set's default similarity threshold when set.
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default = "default_track_quantity")]
    pub track_quantity: bool,
    #[serde(default)]
    pub undated: UndatedPolicy,
    /// JSON rule set used instead of the built-in categories.
    #[serde(default)]
    pub rules_file: Option<String>,
}

fn default_track_quantity() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: None,
            track_quantity: default_track_quantity(),
            undated: UndatedPolicy::default(),
            rules_file: None,
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("rekap")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

fn load_settings_from(path: &Path) -> Settings {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Settings::default();
    };
    match serde_json::from_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("ignoring malformed {}: {e}", path.display());
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| RekapError::Config(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
