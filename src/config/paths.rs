//! Path management for finvault
//!
//! Provides XDG-compliant path resolution for settings, table data, and backups.
//!
//! ## Path Resolution Order
//!
//! 1. `FINVAULT_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/finvault` or `~/.config/finvault`
//! 3. Windows: `%APPDATA%\finvault`

use std::path::PathBuf;

use crate::error::VaultError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "FINVAULT_DATA_DIR";

/// Manages all paths used by finvault
#[derive(Debug, Clone)]
pub struct VaultPaths {
    /// Base directory for all finvault data
    base_dir: PathBuf,
}

impl VaultPaths {
    /// Create a new VaultPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, VaultError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create VaultPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory holding one JSON file per table
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the backup directory
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to a table's data file
    pub fn table_file(&self, table_key: &str) -> PathBuf {
        self.data_dir().join(format!("{}.json", table_key))
    }

    /// Get the path to the schema manifest
    pub fn manifest_file(&self) -> PathBuf {
        self.data_dir().join("manifest.json")
    }

    /// Get the path to the pending-commit journal
    pub fn journal_file(&self) -> PathBuf {
        self.data_dir().join("journal.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), VaultError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| VaultError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| VaultError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.backup_dir())
            .map_err(|e| VaultError::Io(format!("Failed to create backup directory: {}", e)))?;

        Ok(())
    }
}

/// Resolve the default data directory path based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, VaultError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home = std::env::var("HOME")
                .map_err(|_| VaultError::Config("HOME environment variable not set".into()))?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("finvault"))
}

/// Resolve the default data directory path based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, VaultError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| VaultError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("finvault"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
        assert_eq!(paths.backup_dir(), temp_dir.path().join("backups"));
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
        assert!(paths.backup_dir().exists());
    }

    #[test]
    fn test_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
        assert_eq!(
            paths.table_file("creditCards"),
            temp_dir.path().join("data").join("creditCards.json")
        );
        assert_eq!(
            paths.journal_file(),
            temp_dir.path().join("data").join("journal.json")
        );
    }
}
