use crate::error::AppError;
use diary_client::ApiConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const ENV_API_URL: &str = "BABY_DIARY_API_URL";
pub const ENV_ACCESS_TOKEN: &str = "BABY_DIARY_ACCESS_TOKEN";

/// Application configuration, read from a TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    /// Where the local diary snapshot is kept between runs
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads the file and applies environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Like [`Self::load`], but a missing file yields the defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        log::info!("No config at {}, using defaults", path.display());
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN).filter(|v| !v.is_empty()) {
            self.api.access_token = Some(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            snapshot_path = "diaries.json"

            [api]
            base_url = "https://florence.example.com/v1/"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://florence.example.com/v1/");
        assert_eq!(config.api.timeout_secs, None);
        assert_eq!(config.snapshot_path.as_deref(), Some("diaries.json"));
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let result = AppConfig::from_toml_str("[api\nbase_url = ");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            ENV_API_URL => Some("https://override/v1/".to_string()),
            ENV_ACCESS_TOKEN => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.api.base_url, "https://override/v1/");
        assert_eq!(config.api.access_token, None);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baby-diary.toml");
        fs::write(&path, "[api]\ntimeout_secs = 5\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.api.timeout_secs, Some(5));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        assert!(matches!(AppConfig::load(&path), Err(AppError::Config(_))));
        assert!(AppConfig::load_or_default(&path).is_ok());
    }
}
