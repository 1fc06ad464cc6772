//! Schema migrations for the data directory
//!
//! `data/manifest.json` records the schema version and every migration that
//! has run. Migrations are forward-only and run once each, in version order;
//! the manifest is rewritten after every step so an interrupted run resumes
//! where it stopped. A migration only creates table files that do not exist
//! yet, so existing rows are never rewritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::paths::VaultPaths;
use crate::error::{VaultError, VaultResult};
use crate::models::TableName;

use super::file_io::{read_json, write_json_atomic};

/// Schema version this build writes
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// One forward step of the schema
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    /// Tables introduced by this step
    pub creates: &'static [TableName],
}

/// Every known migration, in the order they must run
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_core_tables",
        creates: &[
            TableName::Accounts,
            TableName::Transactions,
            TableName::Loans,
            TableName::Subscriptions,
            TableName::Budgets,
            TableName::Goals,
        ],
    },
    Migration {
        version: 2,
        name: "add_recurring_rules",
        creates: &[TableName::RecurringRules],
    },
    Migration {
        version: 3,
        name: "add_credit_cards",
        creates: &[TableName::CreditCards],
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMigration {
    pub version: u32,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// Contents of `data/manifest.json`; a missing file means version 0
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub schema_version: u32,
    #[serde(default)]
    pub applied: Vec<AppliedMigration>,
}

/// Outcome of `run_pending`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    pub applied: Vec<&'static str>,
}

pub fn load_manifest(paths: &VaultPaths) -> VaultResult<Manifest> {
    read_json(paths.manifest_file())
}

/// Bring the data directory up to `CURRENT_SCHEMA_VERSION`
pub fn run_pending(paths: &VaultPaths) -> VaultResult<MigrationReport> {
    let mut manifest = load_manifest(paths)?;
    let from_version = manifest.schema_version;

    if from_version > CURRENT_SCHEMA_VERSION {
        return Err(VaultError::Storage(format!(
            "Data directory uses schema version {} but this build only understands up to {}",
            from_version, CURRENT_SCHEMA_VERSION
        )));
    }

    let mut applied = Vec::new();
    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.version > from_version)
    {
        for table in migration.creates {
            let path = paths.table_file(table.key());
            if !path.exists() {
                write_json_atomic(&path, &serde_json::json!({ "records": [] }))?;
            }
        }

        manifest.schema_version = migration.version;
        manifest.applied.push(AppliedMigration {
            version: migration.version,
            name: migration.name.to_string(),
            applied_at: Utc::now(),
        });
        write_json_atomic(paths.manifest_file(), &manifest)?;

        info!(
            version = migration.version,
            name = migration.name,
            "applied schema migration"
        );
        applied.push(migration.name);
    }

    Ok(MigrationReport {
        from_version,
        to_version: manifest.schema_version,
        applied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths() -> (TempDir, VaultPaths) {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        (temp_dir, paths)
    }

    #[test]
    fn test_migrations_are_ordered_and_cover_every_table() {
        let versions: Vec<u32> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
        assert_eq!(MIGRATIONS.last().unwrap().version, CURRENT_SCHEMA_VERSION);

        let created: Vec<TableName> = MIGRATIONS.iter().flat_map(|m| m.creates.iter().copied()).collect();
        for table in TableName::ALL {
            assert!(created.contains(&table), "{} has no migration", table);
        }
    }

    #[test]
    fn test_fresh_directory_runs_everything_once() {
        let (_temp, paths) = paths();

        let report = run_pending(&paths).unwrap();
        assert_eq!(report.from_version, 0);
        assert_eq!(report.to_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(report.applied.len(), MIGRATIONS.len());

        let again = run_pending(&paths).unwrap();
        assert!(again.applied.is_empty());

        let manifest = load_manifest(&paths).unwrap();
        assert_eq!(manifest.applied.len(), MIGRATIONS.len());
    }

    #[test]
    fn test_upgrade_preserves_existing_rows() {
        let (_temp, paths) = paths();
        let accounts = serde_json::json!({ "records": [{ "id": "keep-me" }] });
        write_json_atomic(paths.table_file("accounts"), &accounts).unwrap();
        write_json_atomic(
            paths.manifest_file(),
            &Manifest {
                schema_version: 1,
                applied: Vec::new(),
            },
        )
        .unwrap();

        let report = run_pending(&paths).unwrap();
        assert_eq!(report.applied, vec!["add_recurring_rules", "add_credit_cards"]);
        assert!(paths.table_file("creditCards").exists());

        let after: serde_json::Value = read_json(paths.table_file("accounts")).unwrap();
        assert_eq!(after, accounts);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let (_temp, paths) = paths();
        write_json_atomic(
            paths.manifest_file(),
            &Manifest {
                schema_version: CURRENT_SCHEMA_VERSION + 1,
                applied: Vec::new(),
            },
        )
        .unwrap();

        assert!(run_pending(&paths).unwrap_err().is_storage());
    }
}
