//! Configuration document: schema, validation, persistence
//!
//! The configuration is a single JSON document with three sections:
//!
//! - `sync_rules` - what gets synced (size limits, exclusions, folder mappings)
//! - `notes_config` - how notes are named and where they are placed
//! - `logging` - log level and destinations, consumed by the CLI
//!
//! # Example
//!
//! ```ignore
//! use notesync_core::config::ConfigStore;
//!
//! let store = ConfigStore::new("config.json");
//! let config = store.load();
//! for issue in store.validate() {
//!     eprintln!("{}", issue);
//! }
//! ```

mod schema;
mod store;
mod validate;

pub use schema::{
    DEFAULT_MAPPING_KEY, FolderMappings, LogLevel, LoggingSection, NotesSection, SyncConfig,
    SyncRulesSection,
};
pub use store::{ConfigStore, DEFAULT_CONFIG_FILE, LoadedConfig, get_path, set_path};
pub use validate::{is_supported_encoding, validate_value};
