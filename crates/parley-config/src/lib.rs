//! Configuration for the parley chat client
//!
//! Precedence, lowest first: built-in defaults, the TOML config file,
//! environment variables, then command-line overrides.

pub mod chat;
pub mod defaults;
pub mod prompts;
pub mod ui;

pub use chat::{BackendKind, ChatConfig};
pub use prompts::PromptConfig;
pub use ui::{ThemeName, UiConfig};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Errors for individual configuration values
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HistoryConfig {
    /// History document path (defaults to the platform data directory)
    pub path: Option<PathBuf>,
}

impl HistoryConfig {
    pub fn history_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| app_data_dir().join(defaults::HISTORY_FILE_NAME))
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub prompts: PromptConfig,
    /// Log level (off, error, warn, info, debug, trace)
    pub log_level: Option<String>,
    /// Log file path (defaults to the data directory)
    pub log_file: Option<PathBuf>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub history_file: Option<PathBuf>,
    pub theme: Option<ThemeName>,
    pub backend: Option<BackendKind>,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration with precedence: defaults < file < env < args
    pub fn load(config_file: Option<PathBuf>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = Self::from_file_or_default(config_file)?;

        if let Ok(model) = std::env::var("PARLEY_MODEL") {
            config.chat.model = Some(model);
        }
        if let Ok(endpoint) = std::env::var("OLLAMA_ENDPOINT") {
            config.chat.endpoint = Some(endpoint);
        }
        if let Ok(path) = std::env::var("PARLEY_HISTORY_FILE") {
            config.history.path = Some(PathBuf::from(path));
        }
        if let Ok(theme) = std::env::var("PARLEY_THEME") {
            match theme.parse() {
                Ok(theme) => config.ui.theme = theme,
                Err(e) => warn!(error = %e, "Ignoring PARLEY_THEME"),
            }
        }
        if let Ok(backend) = std::env::var("PARLEY_BACKEND") {
            match backend.parse() {
                Ok(backend) => config.chat.backend = backend,
                Err(e) => warn!(error = %e, "Ignoring PARLEY_BACKEND"),
            }
        }

        if let Some(model) = overrides.model {
            config.chat.model = Some(model);
        }
        if let Some(endpoint) = overrides.endpoint {
            config.chat.endpoint = Some(endpoint);
        }
        if let Some(path) = overrides.history_file {
            config.history.path = Some(path);
        }
        if let Some(theme) = overrides.theme {
            config.ui.theme = theme;
        }
        if let Some(backend) = overrides.backend {
            config.chat.backend = backend;
        }
        if let Some(path) = overrides.log_file {
            config.log_file = Some(path);
        }

        debug!(
            model = %config.chat.chat_model(),
            endpoint = %config.chat.llm_endpoint(),
            backend = %config.chat.backend,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join(defaults::APP_DIR_NAME);
        Ok(config_dir.join("config.toml"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| app_data_dir().join("logs").join("parley.log"))
    }

    fn from_file_or_default(config_file: Option<PathBuf>) -> Result<Self> {
        // Skip the user's config entirely under test
        if std::env::var("PARLEY_TEST_MODE").is_ok() {
            return Ok(Self::default());
        }

        let path = config_file
            .or_else(|| Self::default_config_path().ok())
            .filter(|p| p.exists());

        if let Some(path) = path {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Display the current configuration as TOML
    pub fn display_as_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config as TOML")
    }
}

/// Per-user data directory, or the working directory when unknown
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(defaults::APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "PARLEY_TEST_MODE",
        "PARLEY_MODEL",
        "OLLAMA_ENDPOINT",
        "PARLEY_HISTORY_FILE",
        "PARLEY_THEME",
        "PARLEY_BACKEND",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    #[serial]
    fn test_missing_file_gives_defaults() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let config =
            AppConfig::load(Some(dir.path().join("absent.toml")), ConfigOverrides::default())
                .unwrap();
        assert_eq!(config.chat, ChatConfig::default());
        assert_eq!(config.ui.theme, ThemeName::Dark);
    }

    #[test]
    #[serial]
    fn test_file_values_applied() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            log_level = "debug"

            [chat]
            model = "mistral"
            endpoint = "http://gpu-box:11434"
            backend = "ollama"

            [history]
            path = "/tmp/parley-test/history.json"

            [ui]
            theme = "light"
            status_timeout_ms = 1500
            "#,
        );

        let config = AppConfig::load(Some(path), ConfigOverrides::default()).unwrap();
        assert_eq!(config.chat.chat_model(), "mistral");
        assert_eq!(config.chat.llm_endpoint(), "http://gpu-box:11434");
        assert_eq!(config.chat.backend, BackendKind::Ollama);
        assert_eq!(
            config.history.history_path(),
            PathBuf::from("/tmp/parley-test/history.json")
        );
        assert_eq!(config.ui.theme, ThemeName::Light);
        assert_eq!(config.ui.status_timeout_ms(), 1500);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_and_args_override_env() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[chat]\nmodel = \"from-file\"\n");

        std::env::set_var("PARLEY_MODEL", "from-env");
        std::env::set_var("PARLEY_THEME", "light");
        let config = AppConfig::load(Some(path.clone()), ConfigOverrides::default()).unwrap();
        assert_eq!(config.chat.chat_model(), "from-env");
        assert_eq!(config.ui.theme, ThemeName::Light);

        let overrides = ConfigOverrides {
            model: Some("from-args".to_string()),
            theme: Some(ThemeName::Dark),
            ..Default::default()
        };
        let config = AppConfig::load(Some(path), overrides).unwrap();
        assert_eq!(config.chat.chat_model(), "from-args");
        assert_eq!(config.ui.theme, ThemeName::Dark);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_env_value_ignored() {
        clear_env();
        std::env::set_var("PARLEY_TEST_MODE", "1");
        std::env::set_var("PARLEY_BACKEND", "carrier-pigeon");

        let config = AppConfig::load(None, ConfigOverrides::default()).unwrap();
        assert_eq!(config.chat.backend, BackendKind::Auto);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_test_mode_skips_file() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[chat]\nmodel = \"from-file\"\n");
        std::env::set_var("PARLEY_TEST_MODE", "1");

        let config = AppConfig::load(Some(path), ConfigOverrides::default()).unwrap();
        assert_eq!(config.chat.chat_model(), "llama3");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_malformed_file_reports_path() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[chat\nmodel = ");

        let err = AppConfig::load(Some(path), ConfigOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_display_as_toml_round_trips() {
        let config = AppConfig::default();
        let toml = config.display_as_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }
}
