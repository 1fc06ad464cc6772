//! Export, import and wipe of the whole store
//!
//! Import is a merge: every table present in the payload is upserted inside a
//! single transaction, tables the payload omits are left alone, and rows the
//! payload does not mention are never deleted.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::settings::Settings;
use crate::error::{VaultError, VaultResult};
use crate::models::TableName;
use crate::storage::{Store, Stored, Tx, UpsertCount};

use super::payload::BackupPayload;

/// What an import changed, per table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub tables: BTreeMap<TableName, UpsertCount>,
}

impl ImportSummary {
    pub fn inserted(&self) -> usize {
        self.tables.values().map(|c| c.inserted).sum()
    }

    pub fn replaced(&self) -> usize {
        self.tables.values().map(|c| c.replaced).sum()
    }

    pub fn get(&self, table: TableName) -> UpsertCount {
        self.tables.get(&table).copied().unwrap_or_default()
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tables.is_empty() {
            return f.write_str("Nothing imported");
        }
        let parts: Vec<String> = self
            .tables
            .iter()
            .map(|(table, count)| {
                format!(
                    "{}: {} new, {} replaced",
                    table, count.inserted, count.replaced
                )
            })
            .collect();
        write!(f, "Imported {}", parts.join("; "))
    }
}

/// Whole-store export and import over an open `Store`
pub struct BackupCodec<'a> {
    store: &'a Store,
}

impl<'a> BackupCodec<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Snapshot every table, tombstones included
    pub fn export_all(&self) -> VaultResult<BackupPayload> {
        let payload = self.store.read(|tables| BackupPayload {
            exported_at: Utc::now(),
            accounts: Some(tables.accounts.to_records()),
            transactions: Some(tables.transactions.to_records()),
            loans: Some(tables.loans.to_records()),
            subscriptions: Some(tables.subscriptions.to_records()),
            budgets: Some(tables.budgets.to_records()),
            goals: Some(tables.goals.to_records()),
            recurring_rules: Some(tables.recurring_rules.to_records()),
            credit_cards: Some(tables.credit_cards.to_records()),
            ..BackupPayload::empty()
        })?;
        info!(records = payload.record_count(), "exported store");
        Ok(payload)
    }

    /// Render the plaintext export document
    pub fn export_json(&self, pretty: bool) -> VaultResult<String> {
        self.export_all()?.to_json(pretty)
    }

    /// Parse and import a plaintext export document
    pub fn import_json(&self, text: &str) -> VaultResult<ImportSummary> {
        let payload = BackupPayload::from_json(text)?;
        self.import_all(payload)
    }

    /// Merge a payload into the store as one transaction.
    ///
    /// A version mismatch or a structural problem is reported before anything
    /// is written; any failure during the write leaves every table unchanged.
    pub fn import_all(&self, payload: BackupPayload) -> VaultResult<ImportSummary> {
        payload.check_version()?;
        payload.validate()?;

        let scope = payload.tables_present();
        if scope.is_empty() {
            return Ok(ImportSummary::default());
        }

        let summary = self
            .store
            .with_transaction(&scope, |tx| {
                let mut summary = ImportSummary::default();
                upsert_table(tx, payload.accounts, &mut summary)?;
                upsert_table(tx, payload.transactions, &mut summary)?;
                upsert_table(tx, payload.loans, &mut summary)?;
                upsert_table(tx, payload.subscriptions, &mut summary)?;
                upsert_table(tx, payload.budgets, &mut summary)?;
                upsert_table(tx, payload.goals, &mut summary)?;
                upsert_table(tx, payload.recurring_rules, &mut summary)?;
                upsert_table(tx, payload.credit_cards, &mut summary)?;
                Ok(summary)
            })
            .map_err(|err| {
                warn!(error = %err, "import rolled back");
                err
            })?;

        info!(
            inserted = summary.inserted(),
            replaced = summary.replaced(),
            "imported backup"
        );
        Ok(summary)
    }

    /// Empty every table and delete the local settings. Irreversible.
    pub fn wipe_all(&self) -> VaultResult<()> {
        self.store.clear_all()?;
        Settings::clear(self.store.paths())?;
        warn!("wiped all local data");
        Ok(())
    }
}

fn upsert_table<T: Stored>(
    tx: &mut Tx<'_>,
    records: Option<Vec<T>>,
    summary: &mut ImportSummary,
) -> VaultResult<()> {
    let Some(records) = records else {
        return Ok(());
    };
    let count = tx.bulk_upsert(records).map_err(|err| match err {
        VaultError::Validation(msg) => VaultError::MalformedPayload(msg),
        other => other,
    })?;
    summary.tables.insert(T::TABLE, count);
    Ok(())
}
