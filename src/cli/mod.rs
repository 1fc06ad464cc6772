//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the store and backup layers.

pub mod backup;
pub mod data;
pub mod passphrase;

pub use backup::{handle_backup_command, BackupCommands};
pub use data::{handle_decrypt, handle_export, handle_import, handle_status, handle_wipe};
pub use passphrase::{handle_passphrase_command, PassphraseCommands, PASSPHRASE_ENV};
