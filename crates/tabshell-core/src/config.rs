//! Browser configuration

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the page store
    pub database_path: PathBuf,
    /// Pages opened when the store is created
    pub initial_urls: Vec<String>,
    /// Log filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("pages.sqlite"),
            initial_urls: vec![
                "https://www.objc.io".to_string(),
                "https://www.apple.com".to_string(),
            ],
            log_filter: "info".to_string(),
        }
    }

    pub fn data_dir() -> PathBuf {
        local_data_dir(|key| std::env::var_os(key))
            .map(|d| d.join("Tabshell"))
            .unwrap_or_else(|| PathBuf::from(".tabshell"))
    }

    /// Read a JSON config file; missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;

        if config.database_path.as_os_str().is_empty() {
            return Err(CoreError::Config("database_path is empty".to_string()));
        }

        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

/// Per-user data directory for the current platform, read through `var`.
fn local_data_dir(var: impl Fn(&str) -> Option<OsString>) -> Option<PathBuf> {
    let path = |key: &str| var(key).filter(|v| !v.is_empty()).map(PathBuf::from);

    if cfg!(target_os = "windows") {
        path("LOCALAPPDATA")
    } else if cfg!(target_os = "macos") {
        path("HOME").map(|home| home.join("Library/Application Support"))
    } else {
        path("XDG_DATA_HOME").or_else(|| path("HOME").map(|home| home.join(".local/share")))
    }
}
