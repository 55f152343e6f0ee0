//! Loading and persisting the JSON configuration document

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::schema::SyncConfig;
use super::validate::validate_value;
use crate::{Error, Result};

/// Default configuration file name, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// A configuration document on disk
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}

impl ConfigStore {
    /// Create a store for the given path; nothing is read yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the configuration document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the configuration document exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the configuration, falling back to defaults.
    ///
    /// A missing or unreadable document never fails the caller; the problem
    /// is logged and the defaults are used instead. Values of the wrong type
    /// fall back one key at a time, see [`ConfigStore::load_lenient`].
    pub fn load(&self) -> SyncConfig {
        if !self.exists() {
            warn!(path = %self.path.display(), "Configuration not found, using defaults");
            return SyncConfig::default();
        }
        let loaded = self.load_lenient();
        for warning in &loaded.warnings {
            warn!(path = %self.path.display(), "{}", warning);
        }
        loaded.config
    }

    /// Load the configuration without logging, returning the warnings that
    /// [`ConfigStore::load`] would log.
    ///
    /// Every key of the document is laid over the defaults on its own; a key
    /// whose value does not fit the schema keeps its default and produces a
    /// warning. A missing document yields the defaults and no warnings.
    pub fn load_lenient(&self) -> LoadedConfig {
        let document = match self.load_value() {
            Ok(document) => document,
            Err(Error::ConfigNotFound { .. }) => return LoadedConfig::default(),
            Err(e) => {
                return LoadedConfig::defaults_because(format!(
                    "Failed to load configuration, using defaults: {}",
                    e
                ));
            }
        };

        let Some(root) = document.as_object() else {
            return LoadedConfig::defaults_because(
                "Configuration is not a JSON object, using defaults".to_string(),
            );
        };
        let mut merged = match serde_json::to_value(SyncConfig::default()) {
            Ok(merged) => merged,
            Err(e) => {
                return LoadedConfig::defaults_because(format!(
                    "Failed to render default configuration: {}",
                    e
                ));
            }
        };

        let mut warnings = Vec::new();
        for (section, value) in root {
            let nested = value.is_object() && merged.get(section).is_some_and(Value::is_object);
            match value.as_object() {
                Some(fields) if nested => {
                    for (field, field_value) in fields {
                        let key = format!("{}.{}", section, field);
                        overlay(&mut merged, &key, field_value, &mut warnings);
                    }
                }
                _ => overlay(&mut merged, section, value, &mut warnings),
            }
        }

        match serde_json::from_value(merged) {
            Ok(config) => {
                debug!(path = %self.path.display(), rejected = warnings.len(), "Loaded configuration");
                LoadedConfig { config, warnings }
            }
            Err(e) => LoadedConfig::defaults_because(format!(
                "Invalid configuration, using defaults: {}",
                e
            )),
        }
    }

    /// Load the configuration, reporting any problem as an error
    pub fn load_strict(&self) -> Result<SyncConfig> {
        let value = self.load_value()?;
        Ok(serde_json::from_value(value)?)
    }

    /// Load the raw JSON document
    pub fn load_value(&self) -> Result<Value> {
        if !self.exists() {
            return Err(Error::ConfigNotFound {
                path: self.path.clone(),
            });
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Validate the document on disk.
    ///
    /// A missing document validates the defaults that would be used in its
    /// place.
    pub fn validate(&self) -> Vec<String> {
        match self.load_value() {
            Ok(value) => validate_value(&value),
            Err(Error::ConfigNotFound { .. }) => match serde_json::to_value(SyncConfig::default())
            {
                Ok(value) => validate_value(&value),
                Err(e) => vec![format!("Failed to render default configuration: {}", e)],
            },
            Err(e) => vec![format!("Failed to read configuration: {}", e)],
        }
    }

    /// Write the default configuration.
    ///
    /// Refuses to replace an existing document unless `force` is set.
    pub fn init(&self, force: bool) -> Result<SyncConfig> {
        if self.exists() && !force {
            return Err(Error::ConfigExists {
                path: self.path.clone(),
            });
        }
        let config = SyncConfig::default();
        self.save(&config)?;
        Ok(config)
    }

    /// Persist a typed configuration
    pub fn save(&self, config: &SyncConfig) -> Result<()> {
        self.save_value(&serde_json::to_value(config)?)
    }

    /// Persist a raw JSON document, creating the parent directory if needed
    pub fn save_value(&self, value: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(value)?;
        fs::write(&self.path, content + "\n")?;
        Ok(())
    }

    /// Read a value by dotted key, e.g. `sync_rules.auto_update`
    pub fn get(&self, key: &str) -> Result<Value> {
        let document = self.load_value()?;
        get_path(&document, key)
            .cloned()
            .ok_or_else(|| Error::ConfigKeyNotFound {
                key: key.to_string(),
            })
    }

    /// Set a value by dotted key and save, creating intermediate objects
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut document = match self.load_value() {
            Ok(document) => document,
            Err(Error::ConfigNotFound { .. }) => serde_json::to_value(SyncConfig::default())?,
            Err(e) => return Err(e),
        };
        set_path(&mut document, key, value)?;
        self.save_value(&document)
    }
}

/// A leniently loaded configuration and the problems set aside on the way
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedConfig {
    pub config: SyncConfig,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    fn defaults_because(warning: String) -> Self {
        Self {
            config: SyncConfig::default(),
            warnings: vec![warning],
        }
    }
}

/// Set `key` in `merged` if the result still deserializes
fn overlay(merged: &mut Value, key: &str, value: &Value, warnings: &mut Vec<String>) {
    let mut candidate = merged.clone();
    let fits = set_path(&mut candidate, key, value.clone()).is_ok()
        && serde_json::from_value::<SyncConfig>(candidate.clone()).is_ok();
    if fits {
        *merged = candidate;
    } else {
        warnings.push(format!("Invalid value for {}, using default", key));
    }
}

/// Resolve a dotted key inside a JSON document
pub fn get_path<'a>(document: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(document, |current, segment| current.get(segment))
}

/// Set a dotted key inside a JSON document, creating objects along the way
pub fn set_path(document: &mut Value, key: &str, value: Value) -> Result<()> {
    let segments: Vec<&str> = key.split('.').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(Error::InvalidConfig {
            message: "empty configuration key".to_string(),
        });
    };

    let mut current = document;
    for segment in parents {
        let object = current.as_object_mut().ok_or_else(|| Error::InvalidConfig {
            message: format!("cannot set '{}': '{}' is not an object", key, segment),
        })?;
        current = object
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let object = current.as_object_mut().ok_or_else(|| Error::InvalidConfig {
        message: format!("cannot set '{}': parent is not an object", key),
    })?;
    object.insert(last.to_string(), value);
    Ok(())
}
