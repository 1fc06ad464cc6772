//! Backup system for finvault
//!
//! # Architecture
//!
//! - `BackupPayload`: the versioned plaintext export document
//! - `BackupCodec`: exports the whole store, merges a payload back in as one
//!   transaction, and wipes everything
//! - `encrypted`: wraps an export in a passphrase envelope
//! - `BackupManager`: timestamped backup files with count-based retention
//!
//! # Import semantics
//!
//! Import is an upsert by id. Tables missing from the payload are untouched
//! and rows missing from a table are kept. A payload whose `version` is not
//! `SUPPORTED_VERSION` is refused before anything is written.
//!
//! # Example
//!
//! ```rust,ignore
//! use finvault::backup::{BackupCodec, BackupManager};
//! use finvault::config::{Settings, VaultPaths};
//! use finvault::storage::Store;
//!
//! let paths = VaultPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let store = Store::open(paths.clone())?;
//! let codec = BackupCodec::new(&store);
//!
//! let manager = BackupManager::new(&paths, settings.backup_retention);
//! let (path, pruned) = manager.create_backup_with_retention(&codec, None)?;
//!
//! let text = std::fs::read_to_string(path)?;
//! let summary = codec.import_json(&text)?;
//! println!("{}", summary);
//! ```

mod codec;
pub mod encrypted;
mod manager;
mod payload;

pub use codec::{BackupCodec, ImportSummary};
pub use encrypted::{decrypt_export, encrypt_export, export_encrypted, is_encrypted, EncryptedExport};
pub use manager::{BackupInfo, BackupManager};
pub use payload::{BackupPayload, SUPPORTED_VERSION};
