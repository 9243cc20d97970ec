use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DashError, Result};

pub const DEFAULT_EXCLUDED_CATEGORIES: &[&str] = &["CAIXA SORVETE/AÇAI", "CAIXA DE PIZZA"];

/// Overrides the settings file location.
pub const CONFIG_ENV: &str = "FRANCHISE_DASHBOARD_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_excluded_categories")]
    pub excluded_categories: Vec<String>,
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_excluded_categories() -> Vec<String> {
    DEFAULT_EXCLUDED_CATEGORIES
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_export_dir() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("franchise-dashboard")
        .join("exports")
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            excluded_categories: default_excluded_categories(),
            export_dir: default_export_dir(),
            log_level: default_log_level(),
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("franchise-dashboard")
}

pub fn settings_path() -> PathBuf {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => config_dir().join("settings.json"),
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing or unreadable files fall back to defaults; missing keys are
/// filled in individually.
pub fn load_settings_from(path: &std::path::Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(path).unwrap_or_default();
    match serde_json::from_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
            Settings::default()
        }
    }
}

pub fn save_settings_to(settings: &Settings, path: &std::path::Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| DashError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> PathBuf {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return PathBuf::from(path.replacen('~', &home.to_string_lossy(), 1));
        }
    }
    PathBuf::from(path)
}
