use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{OracleError, Result};

pub const DB_FILE: &str = "oracle.db";
pub const LOG_FILE: &str = "awards-oracle.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    /// Movies in this language are not "foreign" for the non-English winners report.
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_staff_list_limit")]
    pub staff_list_limit: u32,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_language() -> String {
    "English".to_string()
}

fn default_staff_list_limit() -> u32 {
    20
}

fn default_pool_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            default_language: default_language(),
            staff_list_limit: default_staff_list_limit(),
            pool_size: default_pool_size(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_path().join(DB_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_path().join(LOG_FILE)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("awards-oracle")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("awards-oracle")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| OracleError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

/// Load settings, letting a one-off `--data-dir` win over the saved value.
pub fn resolve_settings(data_dir: Option<&str>) -> Settings {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(dir);
    }
    settings
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/oracle".to_string(),
            default_language: "French".to_string(),
            staff_list_limit: 5,
            pool_size: 2,
            log_level: "debug".to_string(),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.data_dir, "/tmp/oracle");
        assert_eq!(loaded.default_language, "French");
        assert_eq!(loaded.staff_list_limit, 5);
        assert_eq!(loaded.pool_size, 2);
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.default_language, "English");
        assert_eq!(s.staff_list_limit, 20);
        assert!(!s.data_dir.is_empty());
        assert!(s.db_path().ends_with(DB_FILE));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/oracle"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.default_language, "English");
        assert_eq!(s.staff_list_limit, 20);
        assert_eq!(s.pool_size, 4);
        assert_eq!(s.log_level, "info");
    }

    #[test]
    fn test_tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            let expanded = shellexpand_path("~/oracle-data");
            assert!(expanded.starts_with(&*home.to_string_lossy()));
            assert!(expanded.ends_with("oracle-data"));
        }
    }
}
