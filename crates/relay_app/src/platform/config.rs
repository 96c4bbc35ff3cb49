use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use relay_engine::BridgeSettings;
use serde::{Deserialize, Serialize};

use super::logging::LogDestination;

/// Process-level configuration read from a RON file. Relay behaviour
/// settings live in the store instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store_path: PathBuf,
    pub bridge_url: String,
    pub request_timeout_secs: u64,
    pub max_document_bytes: u64,
    pub log_destination: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("relay_store.json"),
            bridge_url: "http://127.0.0.1:9777/".to_string(),
            request_timeout_secs: 15,
            max_document_bytes: BridgeSettings::default().max_document_bytes,
            log_destination: LogDestination::File,
        }
    }
}

impl AppConfig {
    pub fn bridge_settings(&self) -> BridgeSettings {
        BridgeSettings {
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            max_document_bytes: self.max_document_bytes,
            ..BridgeSettings::default()
        }
    }
}

/// Where the configuration came from. Reported once logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Missing,
    Invalid(String),
}

/// Reads the config at `path`. A missing, unreadable or invalid file
/// yields the defaults.
pub fn load(path: &Path) -> (AppConfig, ConfigSource) {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return (AppConfig::default(), ConfigSource::Missing);
        }
        Err(err) => return (AppConfig::default(), ConfigSource::Invalid(err.to_string())),
    };

    match ron::from_str::<AppConfig>(&content) {
        Ok(config) => (config, ConfigSource::File),
        Err(err) => (AppConfig::default(), ConfigSource::Invalid(err.to_string())),
    }
}
