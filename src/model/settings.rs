use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::BundlerError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// `{ "mcpServers": { ... } }` launcher configuration.
    #[default]
    Launcher,
    /// Self-describing bundle document carrying a schema URI.
    Bundle,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Result<Self, BundlerError> {
        match value {
            "launcher" => Ok(Self::Launcher),
            "bundle" => Ok(Self::Bundle),
            _ => Err(BundlerError::InvalidSetting {
                key: "export_format".to_string(),
                value: value.to_string(),
                expected: "expected launcher or bundle",
            }),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Launcher => write!(f, "launcher"),
            Self::Bundle => write!(f, "bundle"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Auto,
    Light,
    Dark,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub export_format: ExportFormat,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_true")]
    pub autosave: bool,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default)]
    pub offline_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalogue_path: Option<PathBuf>,
    #[serde(default = "default_share_origin")]
    pub share_origin: String,
    #[serde(default = "default_share_base_path")]
    pub share_base_path: String,
    #[serde(default = "default_persist_delay_ms")]
    pub persist_delay_ms: u64,
}

pub const SETTING_KEYS: &[&str] = &[
    "export_format",
    "theme",
    "language",
    "autosave",
    "notifications",
    "offline_mode",
    "catalogue_path",
    "share_origin",
    "share_base_path",
    "persist_delay_ms",
];

fn default_language() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

fn default_share_origin() -> String {
    "http://localhost:8080".to_string()
}

fn default_share_base_path() -> String {
    "/".to_string()
}

fn default_persist_delay_ms() -> u64 {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            export_format: ExportFormat::default(),
            theme: Theme::default(),
            language: default_language(),
            autosave: true,
            notifications: true,
            offline_mode: false,
            catalogue_path: None,
            share_origin: default_share_origin(),
            share_base_path: default_share_base_path(),
            persist_delay_ms: default_persist_delay_ms(),
        }
    }
}

impl Settings {
    pub fn get(&self, key: &str) -> Result<String, BundlerError> {
        let value = match key {
            "export_format" => self.export_format.to_string(),
            "theme" => self.theme.to_string(),
            "language" => self.language.clone(),
            "autosave" => self.autosave.to_string(),
            "notifications" => self.notifications.to_string(),
            "offline_mode" => self.offline_mode.to_string(),
            "catalogue_path" => self
                .catalogue_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(not set)".to_string()),
            "share_origin" => self.share_origin.clone(),
            "share_base_path" => self.share_base_path.clone(),
            "persist_delay_ms" => self.persist_delay_ms.to_string(),
            _ => {
                return Err(BundlerError::UnknownSetting {
                    key: key.to_string(),
                });
            }
        };
        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), BundlerError> {
        match key {
            "export_format" => self.export_format = ExportFormat::parse(value)?,
            "theme" => {
                self.theme = match value {
                    "auto" => Theme::Auto,
                    "light" => Theme::Light,
                    "dark" => Theme::Dark,
                    _ => return Err(invalid(key, value, "expected auto, light or dark")),
                }
            }
            "language" => {
                if value.trim().is_empty() {
                    return Err(invalid(key, value, "expected a language tag"));
                }
                self.language = value.to_string();
            }
            "autosave" => self.autosave = parse_bool(key, value)?,
            "notifications" => self.notifications = parse_bool(key, value)?,
            "offline_mode" => self.offline_mode = parse_bool(key, value)?,
            "catalogue_path" => {
                self.catalogue_path = if value.is_empty() || value == "none" {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "share_origin" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(invalid(key, value, "expected an http(s) origin"));
                }
                self.share_origin = value.trim_end_matches('/').to_string();
            }
            "share_base_path" => {
                let mut path = value.to_string();
                if !path.starts_with('/') {
                    path.insert(0, '/');
                }
                if !path.ends_with('/') {
                    path.push('/');
                }
                self.share_base_path = path;
            }
            "persist_delay_ms" => {
                self.persist_delay_ms = value
                    .parse::<u64>()
                    .map_err(|_| invalid(key, value, "expected a number of milliseconds"))?;
            }
            _ => {
                return Err(BundlerError::UnknownSetting {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, BundlerError> {
    match value {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, value, "expected true or false")),
    }
}

fn invalid(key: &str, value: &str, expected: &'static str) -> BundlerError {
    BundlerError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}
