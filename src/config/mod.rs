//! Configuration module for finvault
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Local settings persistence

pub mod paths;
pub mod settings;

pub use paths::VaultPaths;
pub use settings::Settings;
