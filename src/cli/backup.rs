//! Backup CLI commands
//!
//! Implements CLI commands for backup management.

use clap::Subcommand;

use crate::backup::{BackupCodec, BackupManager};
use crate::config::{Settings, VaultPaths};
use crate::error::VaultResult;
use crate::storage::Store;

use super::passphrase::read_passphrase;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Write a backup file and apply the retention policy
    Create {
        /// Encrypt the backup with a passphrase
        #[arg(short, long)]
        encrypt: bool,
    },

    /// List all available backups
    List {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Delete old backups according to retention policy
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

/// Handle a backup command
pub fn handle_backup_command(
    store: &Store,
    paths: &VaultPaths,
    settings: &Settings,
    cmd: BackupCommands,
) -> VaultResult<()> {
    let manager = BackupManager::new(paths, settings.backup_retention.clone());

    match cmd {
        BackupCommands::Create { encrypt } => {
            let passphrase = if encrypt {
                Some(read_passphrase("Backup passphrase: ")?)
            } else {
                None
            };

            println!("Creating backup...");
            let codec = BackupCodec::new(store);
            let (backup_path, pruned) =
                manager.create_backup_with_retention(&codec, passphrase.as_ref())?;

            let filename = backup_path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| backup_path.display().to_string());
            println!("Backup created: {}", filename);
            println!("Location: {}", backup_path.display());
            if !pruned.is_empty() {
                println!("Pruned {} old backup(s).", pruned.len());
            }
        }

        BackupCommands::List { verbose } => {
            let backups = manager.list_backups()?;

            if backups.is_empty() {
                println!("No backups found.");
                println!("Create one with: finvault backup create");
                return Ok(());
            }

            println!("Available Backups");
            println!("=================");
            println!();

            for (i, backup) in backups.iter().enumerate() {
                let age = chrono::Utc::now().signed_duration_since(backup.created_at);
                let age_str = format_duration(age);

                if verbose {
                    println!(
                        "{}. {}\n   Created: {}\n   Size: {}\n   Age: {}\n",
                        i + 1,
                        backup.filename,
                        backup.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        format_size(backup.size_bytes),
                        age_str,
                    );
                } else {
                    println!(
                        "  {}. {} ({} ago, {})",
                        i + 1,
                        backup.filename,
                        age_str,
                        format_size(backup.size_bytes),
                    );
                }
            }

            println!();
            println!("Total: {} backup(s)", backups.len());
        }

        BackupCommands::Prune { force } => {
            let backups = manager.list_backups()?;
            let keep = settings.backup_retention.keep_count as usize;
            let to_delete = backups.len().saturating_sub(keep);

            if to_delete == 0 {
                println!("No backups to prune.");
                println!("Current retention policy: keep {}", keep);
                println!("You have {} backup(s).", backups.len());
                return Ok(());
            }

            println!("Prune Summary");
            println!("=============");
            println!("Retention policy: keep {}", keep);
            println!("Current backups: {}", backups.len());
            println!("To be deleted: {}", to_delete);
            println!();

            if !force {
                println!("To delete old backups, run again with --force flag:");
                println!("  finvault backup prune --force");
                return Ok(());
            }

            let deleted = manager.enforce_retention()?;
            println!("Deleted {} backup(s).", deleted.len());
        }
    }

    Ok(())
}

/// Format a duration in human-readable form
fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    format!("{}mo", days / 30)
}

/// Format a file size in human-readable form
pub(crate) fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
