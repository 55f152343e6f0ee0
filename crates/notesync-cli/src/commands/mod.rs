//! Command implementations for notesync-cli

pub mod api;
pub mod config;
pub mod info;
pub mod sync;

pub use api::{run_api_config, run_api_status, run_api_sync};
pub use config::run_config;
pub use info::run_info;
pub use sync::{run_sync_file, run_sync_files, run_sync_folder};
