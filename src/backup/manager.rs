//! Backup files for finvault
//!
//! Writes export documents into the backups directory as
//! `backup-YYYYMMDD-HHMMSS-mmm.json` and prunes old ones by count.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use crate::config::paths::VaultPaths;
use crate::config::settings::BackupRetention;
use crate::crypto::Passphrase;
use crate::error::{VaultError, VaultResult};

use super::codec::BackupCodec;
use super::encrypted::encrypt_export;

/// Metadata about a backup
#[derive(Debug, Clone)]
pub struct BackupInfo {
    /// Backup filename
    pub filename: String,
    /// Full path to backup
    pub path: PathBuf,
    /// When the backup was created
    pub created_at: DateTime<Utc>,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Manages backup creation and retention
pub struct BackupManager {
    backup_dir: PathBuf,
    retention: BackupRetention,
}

impl BackupManager {
    pub fn new(paths: &VaultPaths, retention: BackupRetention) -> Self {
        Self {
            backup_dir: paths.backup_dir(),
            retention,
        }
    }

    /// Write a backup of the whole store.
    ///
    /// With a passphrase the file holds an encrypted export document.
    pub fn create_backup(
        &self,
        codec: &BackupCodec<'_>,
        passphrase: Option<&Passphrase>,
    ) -> VaultResult<PathBuf> {
        fs::create_dir_all(&self.backup_dir)
            .map_err(|e| VaultError::Io(format!("Failed to create backup directory: {}", e)))?;

        let now = Utc::now();
        let filename = format!(
            "backup-{}-{:03}.json",
            now.format("%Y%m%d-%H%M%S"),
            now.timestamp_subsec_millis()
        );
        let backup_path = self.backup_dir.join(&filename);

        let plaintext = codec.export_json(true)?;
        let contents = match passphrase {
            Some(passphrase) => encrypt_export(&plaintext, passphrase)?,
            None => plaintext,
        };

        fs::write(&backup_path, contents)
            .map_err(|e| VaultError::Io(format!("Failed to write backup file: {}", e)))?;

        info!(file = %filename, encrypted = passphrase.is_some(), "backup written");
        Ok(backup_path)
    }

    /// List all available backups, newest first
    pub fn list_backups(&self) -> VaultResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.backup_dir)
            .map_err(|e| VaultError::Io(format!("Failed to read backup directory: {}", e)))?
        {
            let entry = entry
                .map_err(|e| VaultError::Io(format!("Failed to read directory entry: {}", e)))?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(info) = parse_backup_info(&path) {
                    backups.push(info);
                }
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(backups)
    }

    /// Delete backups beyond the retention count, returning what was removed
    pub fn enforce_retention(&self) -> VaultResult<Vec<PathBuf>> {
        let mut deleted = Vec::new();

        for backup in self
            .list_backups()?
            .into_iter()
            .skip(self.retention.keep_count as usize)
        {
            fs::remove_file(&backup.path)
                .map_err(|e| VaultError::Io(format!("Failed to delete old backup: {}", e)))?;
            debug!(file = %backup.filename, "pruned backup");
            deleted.push(backup.path);
        }

        Ok(deleted)
    }

    /// Create a backup and then enforce the retention policy
    pub fn create_backup_with_retention(
        &self,
        codec: &BackupCodec<'_>,
        passphrase: Option<&Passphrase>,
    ) -> VaultResult<(PathBuf, Vec<PathBuf>)> {
        let backup_path = self.create_backup(codec, passphrase)?;
        let deleted = self.enforce_retention()?;
        Ok((backup_path, deleted))
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Get the most recent backup
    pub fn latest_backup(&self) -> VaultResult<Option<BackupInfo>> {
        Ok(self.list_backups()?.into_iter().next())
    }
}

fn parse_backup_info(path: &Path) -> Option<BackupInfo> {
    let filename = path.file_name()?.to_string_lossy().to_string();
    let stamp = filename.strip_prefix("backup-")?.strip_suffix(".json")?;
    let created_at = parse_backup_timestamp(stamp)?;
    let size_bytes = fs::metadata(path).ok()?.len();

    Some(BackupInfo {
        filename,
        path: path.to_path_buf(),
        created_at,
        size_bytes,
    })
}

/// Parse `YYYYMMDD-HHMMSS` or `YYYYMMDD-HHMMSS-mmm`
fn parse_backup_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = stamp.split('-').collect();
    let (date_part, time_part, millis) = match parts.as_slice() {
        [date, time] => (*date, *time, 0),
        [date, time, millis] => (*date, *time, millis.parse().ok()?),
        _ => return None,
    };

    if date_part.len() != 8 || time_part.len() != 6 {
        return None;
    }

    let year: i32 = date_part[0..4].parse().ok()?;
    let month: u32 = date_part[4..6].parse().ok()?;
    let day: u32 = date_part[6..8].parse().ok()?;
    let hour: u32 = time_part[0..2].parse().ok()?;
    let minute: u32 = time_part[2..4].parse().ok()?;
    let second: u32 = time_part[4..6].parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = chrono::NaiveTime::from_hms_milli_opt(hour, minute, second, millis)?;

    Some(DateTime::from_naive_utc_and_offset(
        chrono::NaiveDateTime::new(date, time),
        Utc,
    ))
}
