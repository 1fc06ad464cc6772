//! finvault - local personal-finance record store
//!
//! This library keeps personal-finance records in a local data directory and
//! moves them in and out as versioned JSON export documents, optionally
//! sealed in a passphrase-derived AES-256-GCM envelope.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution and user settings
//! - `error`: Custom error types
//! - `models`: Record kinds (accounts, transactions, loans, subscriptions, ...)
//! - `storage`: Indexed tables, transactions, journal and schema migrations
//! - `backup`: Export, import, wipe and backup files
//! - `crypto`: Passphrase envelopes and verifiers
//! - `cli`: Command handlers for the `finvault` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use finvault::backup::BackupCodec;
//! use finvault::config::VaultPaths;
//! use finvault::models::{Account, AccountKind};
//! use finvault::storage::Store;
//!
//! let store = Store::open(VaultPaths::new()?)?;
//! store.add(Account::new("Checking", AccountKind::Checking, "USD"))?;
//!
//! let payload = BackupCodec::new(&store).export_all()?;
//! store.close()?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod storage;

pub use error::{VaultError, VaultResult};
