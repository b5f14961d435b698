//! Format-agnostic configuration loading

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{Error, Result, io};

/// Format-agnostic configuration store.
///
/// Detects the format from the file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    /// Create a new ConfigStore.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a file.
    ///
    /// Format is detected from file extension:
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.yaml`, `.yml` -> YAML
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = io::read_text(path)?;
        parse(path, &content)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn parse<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    let extension = extension_of(path);
    match extension.as_str() {
        "toml" => toml::from_str(content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            format: "TOML".into(),
            message: e.to_string(),
        }),
        "json" => serde_json::from_str(content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            format: "JSON".into(),
            message: e.to_string(),
        }),
        "yaml" | "yml" => serde_yaml::from_str(content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            format: "YAML".into(),
            message: e.to_string(),
        }),
        _ => Err(Error::UnsupportedFormat { extension }),
    }
}
