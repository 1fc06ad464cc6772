//! Commit journal for multi-table writes
//!
//! A commit that touches more than one table first writes every new table
//! image into `data/journal.json`, then rewrites the table files, then deletes
//! the journal. The journal write is the commit point: if the process dies
//! after it, `recover` finishes the commit on the next open; if it dies before
//! it, no table file has been touched. A journal whose table rewrite failed is
//! replayed before the next commit writes anything.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::paths::VaultPaths;
use crate::error::{VaultError, VaultResult};

use super::file_io::{read_json_required, remove_if_exists, write_json_atomic};

/// Pending table images keyed by table key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    pub written_at: DateTime<Utc>,
    pub tables: BTreeMap<String, serde_json::Value>,
}

/// Durably apply a set of table images
pub fn commit(paths: &VaultPaths, tables: BTreeMap<String, serde_json::Value>) -> VaultResult<()> {
    if tables.is_empty() {
        return Ok(());
    }

    // An earlier commit must reach the table files before this one does
    recover(paths)?;

    if tables.len() == 1 {
        // A single rename is already atomic
        let (key, image) = tables
            .into_iter()
            .next()
            .ok_or_else(|| VaultError::Storage("journal commit lost its only table".into()))?;
        return write_json_atomic(paths.table_file(&key), &image);
    }

    let journal = Journal {
        written_at: Utc::now(),
        tables,
    };
    write_json_atomic(paths.journal_file(), &journal)?;
    debug!(tables = journal.tables.len(), "journal written");

    if let Err(err) = apply(paths, &journal) {
        // Committed already; the next commit or open replays the journal
        warn!(error = %err, "table rewrite failed after journal commit");
    }
    Ok(())
}

/// Replay a journal left behind by an interrupted commit.
///
/// Returns true when a journal was found and applied.
pub fn recover(paths: &VaultPaths) -> VaultResult<bool> {
    let journal_path = paths.journal_file();
    if !journal_path.exists() {
        return Ok(false);
    }

    let journal: Journal = read_json_required(&journal_path)?;
    warn!(
        tables = journal.tables.len(),
        written_at = %journal.written_at,
        "replaying interrupted commit"
    );
    apply(paths, &journal)?;
    Ok(true)
}

fn apply(paths: &VaultPaths, journal: &Journal) -> VaultResult<()> {
    for (key, image) in &journal.tables {
        write_json_atomic(paths.table_file(key), image)?;
    }
    remove_if_exists(paths.journal_file())?;
    Ok(())
}
