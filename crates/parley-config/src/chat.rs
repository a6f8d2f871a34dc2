//! Model server settings

use crate::defaults;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which backend answers chat requests
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Probe the Ollama server and fall back to the mock when it is down
    #[default]
    Auto,
    Ollama,
    /// Offline simulator
    Mock,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendKind::Auto),
            "ollama" => Ok(BackendKind::Ollama),
            "mock" => Ok(BackendKind::Mock),
            _ => Err(ConfigError::InvalidValue {
                key: "chat.backend",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Auto => "auto",
            BackendKind::Ollama => "ollama",
            BackendKind::Mock => "mock",
        })
    }
}

/// Chat configuration - only essential user settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatConfig {
    /// Model selected at startup when no history overrides it
    pub model: Option<String>,
    /// Ollama endpoint URL
    pub endpoint: Option<String>,
    #[serde(default)]
    pub backend: BackendKind,
    /// Streamed response timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Offered when the model list cannot be fetched
    pub fallback_models: Option<Vec<String>>,
    /// Hidden from the model list
    pub excluded_models: Option<Vec<String>>,
}

impl ChatConfig {
    pub fn chat_model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| defaults::DEFAULT_MODEL.to_string())
    }

    pub fn llm_endpoint(&self) -> String {
        self.endpoint
            .as_deref()
            .unwrap_or(defaults::DEFAULT_ENDPOINT)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(defaults::DEFAULT_TIMEOUT_SECS)
    }

    pub fn fallback_models(&self) -> Vec<String> {
        self.fallback_models.clone().unwrap_or_else(|| {
            defaults::FALLBACK_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect()
        })
    }

    pub fn excluded_models(&self) -> Vec<String> {
        self.excluded_models.clone().unwrap_or_else(|| {
            defaults::EXCLUDED_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect()
        })
    }
}
