//! Presentation settings

use crate::defaults;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

impl ThemeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeName::Dark => "dark",
            ThemeName::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeName::Dark => ThemeName::Light,
            ThemeName::Light => ThemeName::Dark,
        }
    }

    /// Parse a persisted name, treating anything unknown as dark
    pub fn from_persisted(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl FromStr for ThemeName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(ThemeName::Dark),
            "light" => Ok(ThemeName::Light),
            _ => Err(ConfigError::InvalidValue {
                key: "ui.theme",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    /// Theme used when the history file carries none
    #[serde(default)]
    pub theme: ThemeName,
    pub status_timeout_ms: Option<u64>,
}

impl UiConfig {
    pub fn status_timeout_ms(&self) -> u64 {
        self.status_timeout_ms
            .unwrap_or(defaults::STATUS_TIMEOUT_MS)
    }
}
