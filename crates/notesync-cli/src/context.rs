//! Configuration and bridge shared by every command

use std::path::PathBuf;

use notesync_core::config::DEFAULT_CONFIG_FILE;
use notesync_core::{ConfigStore, NotesBridge, OsascriptBridge, RuleSet, SyncConfig, SyncEngine};

use crate::error::Result;

/// Global options resolved once per invocation
#[derive(Debug, Clone)]
pub struct Context {
    pub store: ConfigStore,
    pub config: SyncConfig,
    pub dry_run: bool,
    /// Problems met while loading the configuration; logged once logging
    /// is set up from that same configuration
    pub config_warnings: Vec<String>,
}

impl Context {
    /// Load the configuration named on the command line, or `config.json`.
    ///
    /// A missing or broken document falls back to defaults, one key at a
    /// time.
    pub fn load(config_path: Option<PathBuf>, dry_run: bool) -> Self {
        let store = ConfigStore::new(config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)));
        let loaded = store.load_lenient();
        let dry_run = dry_run || loaded.config.dry_run;
        Self {
            store,
            config: loaded.config,
            dry_run,
            config_warnings: loaded.warnings,
        }
    }

    /// Bridge to Notes.app for the configured account
    pub fn bridge(&self) -> Result<Box<dyn NotesBridge>> {
        Ok(Box::new(OsascriptBridge::from_config(&self.config.notes_config)?))
    }

    /// Engine running `rules` against the real bridge
    pub fn engine(&self, rules: RuleSet) -> Result<SyncEngine> {
        Ok(SyncEngine::with_rules(
            self.config.with_dry_run(self.dry_run),
            self.bridge()?,
            rules,
        ))
    }
}
