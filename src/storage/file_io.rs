//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't corrupt data on failure.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::VaultError;

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, VaultError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    read_json_required(path)
}

/// Read JSON from a file, returning an error if file doesn't exist
pub fn read_json_required<T, P>(path: P) -> Result<T, VaultError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Err(VaultError::Storage(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)
        .map_err(|e| VaultError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| VaultError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to temp, then rename)
///
/// The file is either completely written or not modified at all.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), VaultError>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            VaultError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Same directory as the target so the rename stays on one filesystem
    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path)
        .map_err(|e| VaultError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| VaultError::Storage(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| VaultError::Storage(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| VaultError::Storage(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        VaultError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

/// Remove a file if present
pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> Result<bool, VaultError> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(VaultError::Storage(format!(
            "Failed to remove {}: {}",
            path.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_read_nonexistent_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.json");

        let data: TestData = read_json(&path).unwrap();
        assert_eq!(data, TestData::default());
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.json");

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        write_json_atomic(&path, &data).unwrap();
        let loaded: TestData = read_json(&path).unwrap();
        assert_eq!(data, loaded);
        assert!(!temp_dir.path().join("test.json.tmp").exists());
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("test.json");

        write_json_atomic(&path, &TestData::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "not json at all").unwrap();

        let err = read_json::<TestData, _>(&path).unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn test_read_json_required() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.json");

        assert!(read_json_required::<TestData, _>(&path).is_err());
    }

    #[test]
    fn test_remove_if_exists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone.json");
        fs::write(&path, "{}").unwrap();

        assert!(remove_if_exists(&path).unwrap());
        assert!(!remove_if_exists(&path).unwrap());
    }
}
