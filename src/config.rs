use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::entities::attendance::InputMeaning;

pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to resolve config directory")]
    NoConfigDir,

    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config {path}: {reason}")]
    Parse { path: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub username: String,
    pub password: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path or http(s) URL loaded on the first visit to the students screen.
    pub default_dataset: String,
    pub input_meaning: InputMeaning,
    pub row_limit_options: Vec<usize>,
    pub attendance_column: String,
    pub login: LoginConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_dataset: "info.csv".to_string(),
            input_meaning: InputMeaning::default(),
            row_limit_options: vec![10, 25, 50, 100],
            attendance_column: "Attendance".to_string(),
            login: LoginConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let project_dirs =
            ProjectDirs::from("com", "hellhbbd", "rollcall").ok_or(ConfigError::NoConfigDir)?;
        Ok(project_dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let mut config: AppConfig =
            serde_json::from_str(&text).map_err(|err| ConfigError::Parse {
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;
        config.row_limit_options.retain(|limit| *limit > 0);
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        match Self::default_path().and_then(|path| Self::load(&path)) {
            Ok(config) => config,
            Err(err) => {
                warn!("{err}; using default config");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_test_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("rollcall-{prefix}-{nanos}"))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = unique_test_dir("config-missing");

        let config = AppConfig::load(&temp_dir.join(CONFIG_FILE_NAME)).expect("should load");

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.input_meaning, InputMeaning::MarksAbsent);
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let temp_dir = unique_test_dir("config-partial");
        fs::create_dir_all(&temp_dir).expect("should create temp dir");
        let path = temp_dir.join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"{ "input_meaning": "marks_present", "row_limit_options": [0, 5], "login": { "username": "hod" } }"#,
        )
        .expect("should write config");

        let config = AppConfig::load(&path).expect("should load");

        assert_eq!(config.input_meaning, InputMeaning::MarksPresent);
        assert_eq!(config.row_limit_options, vec![5]);
        assert_eq!(config.login.username, "hod");
        assert_eq!(config.login.password, "admin");
        assert_eq!(config.default_dataset, "info.csv");

        fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let temp_dir = unique_test_dir("config-bad");
        fs::create_dir_all(&temp_dir).expect("should create temp dir");
        let path = temp_dir.join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").expect("should write config");

        let result = AppConfig::load(&path);

        assert!(matches!(result, Err(ConfigError::Parse { .. })));

        fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
    }
}
