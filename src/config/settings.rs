//! User settings for finvault
//!
//! Manages the small local key-value state that lives beside the tables:
//! default currency, backup retention, the passphrase verifier and free-form
//! preferences. `BackupCodec::wipe_all` removes this file together with the
//! tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::paths::VaultPaths;
use crate::error::VaultError;
use crate::storage::file_io::{read_json_required, write_json_atomic};

/// Backup retention settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRetention {
    /// Number of backup files to keep in the backups directory
    pub keep_count: u32,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self { keep_count: 30 }
    }
}

/// User settings for finvault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Default ISO 4217 currency code for new records
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Backup retention policy
    #[serde(default)]
    pub backup_retention: BackupRetention,

    /// Base64 verifier produced by `crypto::hash_passphrase`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase_verifier: Option<String>,

    /// Free-form key-value preferences owned by the UI layer
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_currency: default_currency(),
            backup_retention: BackupRetention::default(),
            passphrase_verifier: None,
            preferences: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &VaultPaths) -> Result<Self, VaultError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            read_json_required(&settings_path).map_err(|e| {
                VaultError::Config(format!("Failed to load settings file: {}", e))
            })
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &VaultPaths) -> Result<(), VaultError> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// Delete the settings file; a missing file is not an error
    pub fn clear(paths: &VaultPaths) -> Result<(), VaultError> {
        let settings_path = paths.settings_file();
        if settings_path.exists() {
            std::fs::remove_file(&settings_path)
                .map_err(|e| VaultError::Io(format!("Failed to remove settings file: {}", e)))?;
        }
        Ok(())
    }

    /// Whether a passphrase verifier has been stored
    pub fn has_passphrase(&self) -> bool {
        self.passphrase_verifier.is_some()
    }

    pub fn preference(&self, key: &str) -> Option<&str> {
        self.preferences.get(key).map(String::as_str)
    }

    pub fn set_preference(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.preferences.insert(key.into(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_currency, "USD");
        assert_eq!(settings.backup_retention.keep_count, 30);
        assert!(!settings.has_passphrase());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.default_currency = "EUR".into();
        settings.set_preference("theme", "dark");
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.default_currency, "EUR");
        assert_eq!(loaded.preference("theme"), Some("dark"));
    }

    #[test]
    fn test_clear_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        Settings::default().save(&paths).unwrap();
        assert!(paths.settings_file().exists());

        Settings::clear(&paths).unwrap();
        assert!(!paths.settings_file().exists());

        // Clearing twice is fine
        Settings::clear(&paths).unwrap();
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.schema_version, 1);
        assert!(settings.preferences.is_empty());
    }
}
