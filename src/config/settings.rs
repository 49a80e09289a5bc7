//! Settings structures for the Everything search service

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub everything: EverythingSettings,
    pub server: ServerSettings,
    pub ui: UiSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (EVERYTHING_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup, so tests need not touch the process env
    pub fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("EVERYTHING_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = lookup("EVERYTHING_ES_PATH") {
            self.everything.es_path = PathBuf::from(val);
        }
        if let Some(val) = lookup("EVERYTHING_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = lookup("EVERYTHING_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name displayed in UI
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "Everything Search".to_string(),
        }
    }
}

/// Settings for the external es executable
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EverythingSettings {
    /// Path to es.exe
    pub es_path: PathBuf,
    /// Timeout forwarded to es when a caller gives none (ms)
    pub default_timeout_ms: u64,
    /// Extra time the host waits past the forwarded timeout before killing es (ms)
    pub timeout_grace_ms: u64,
    /// Log every argument list at debug level
    pub log_arguments: bool,
}

impl Default for EverythingSettings {
    fn default() -> Self {
        Self {
            es_path: PathBuf::from(crate::DEFAULT_ES_PATH),
            default_timeout_ms: crate::DEFAULT_TIMEOUT_MS,
            timeout_grace_ms: 5000,
            log_arguments: false,
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8888,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// UI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Max results prefilled in the search form
    pub default_max_results: u32,
    /// Whether the form starts in files-only mode
    pub default_files_only: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            default_max_results: 10,
            default_files_only: true,
        }
    }
}
