//! Whole-store CLI commands: status, export, import, decrypt and wipe

use std::fs;
use std::path::Path;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::backup::{decrypt_export, export_encrypted, is_encrypted, BackupCodec, BackupManager};
use crate::config::{Settings, VaultPaths};
use crate::error::{VaultError, VaultResult};
use crate::storage::{migrations, Store};

use super::backup::format_size;
use super::passphrase::{read_new_passphrase, read_passphrase};

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Live")]
    live: usize,
    #[tabled(rename = "Deleted")]
    deleted: usize,
}

/// Show paths, schema version, row counts and backup state
pub fn handle_status(store: &Store, paths: &VaultPaths, settings: &Settings) -> VaultResult<()> {
    let manifest = migrations::load_manifest(paths)?;

    println!("finvault Status");
    println!("===============");
    println!("Base directory:   {}", paths.base_dir().display());
    println!("Data directory:   {}", paths.data_dir().display());
    println!("Backup directory: {}", paths.backup_dir().display());
    println!("Schema version:   {}", manifest.schema_version);
    println!(
        "Passphrase:       {}",
        if settings.has_passphrase() { "set" } else { "not set" }
    );
    println!();

    let rows: Vec<CountRow> = store
        .counts()?
        .into_iter()
        .map(|count| CountRow {
            table: count.table.key().to_string(),
            live: count.live,
            deleted: count.total - count.live,
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    println!();

    let manager = BackupManager::new(paths, settings.backup_retention.clone());
    match manager.latest_backup()? {
        Some(latest) => println!(
            "Latest backup: {} ({})",
            latest.filename,
            format_size(latest.size_bytes)
        ),
        None => println!("No backups yet."),
    }

    Ok(())
}

/// Export the store as plaintext or encrypted JSON, to a file or stdout
pub fn handle_export(store: &Store, output: Option<&Path>, encrypt: bool) -> VaultResult<()> {
    let codec = BackupCodec::new(store);
    let document = if encrypt {
        let passphrase = read_new_passphrase()?;
        export_encrypted(&codec, &passphrase)?
    } else {
        codec.export_json(true)?
    };

    match output {
        Some(path) => {
            fs::write(path, document)
                .map_err(|e| VaultError::Io(format!("Failed to write export: {}", e)))?;
            println!("Exported to {}", path.display());
        }
        None => println!("{}", document),
    }
    Ok(())
}

/// Merge an export file into the store. Encrypted exports are decrypted first.
pub fn handle_import(store: &Store, file: &Path) -> VaultResult<()> {
    let mut text = fs::read_to_string(file)
        .map_err(|e| VaultError::Io(format!("Failed to read {}: {}", file.display(), e)))?;

    if is_encrypted(&text) {
        let passphrase = read_passphrase("Export passphrase: ")?;
        text = decrypt_export(&text, &passphrase)?;
    }

    let summary = BackupCodec::new(store).import_json(&text)?;
    println!("{}", summary);
    Ok(())
}

/// Turn an encrypted export back into a plaintext one
pub fn handle_decrypt(file: &Path, output: Option<&Path>) -> VaultResult<()> {
    let text = fs::read_to_string(file)
        .map_err(|e| VaultError::Io(format!("Failed to read {}: {}", file.display(), e)))?;
    let passphrase = read_passphrase("Export passphrase: ")?;
    let plaintext = decrypt_export(&text, &passphrase)?;

    match output {
        Some(path) => {
            fs::write(path, plaintext)
                .map_err(|e| VaultError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
            println!("Decrypted to {}", path.display());
        }
        None => println!("{}", plaintext),
    }
    Ok(())
}

/// Delete every record and the local settings
pub fn handle_wipe(store: &Store, force: bool) -> VaultResult<()> {
    if !force {
        println!("WARNING: This permanently deletes ALL records and settings!");
        println!("Consider running 'finvault backup create' first.");
        println!("To proceed, run again with --force flag:");
        println!("  finvault wipe --force");
        return Ok(());
    }

    BackupCodec::new(store).wipe_all()?;
    println!("All local data has been wiped.");
    Ok(())
}
