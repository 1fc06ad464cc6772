//! Storage layer for finvault
//!
//! The `Store` keeps every table in memory behind one `RwLock` and persists
//! each table as `data/<table>.json` with atomic writes. Multi-table commits
//! go through the journal so a crash never leaves tables from two different
//! commits on disk.

pub mod file_io;
pub mod journal;
pub mod migrations;
pub mod queries;
pub mod table;
pub mod transaction;

pub use file_io::{read_json, write_json_atomic};
pub use table::{Table, TableFile};
pub use transaction::{Tx, UpsertCount};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::config::paths::VaultPaths;
use crate::error::{VaultError, VaultResult};
use crate::models::{
    Account, Budget, CreditCard, FinancialGoal, Loan, Record, RecurringRule, Subscription,
    TableName, Transaction,
};

/// A record kind that lives in one of the store's tables
pub trait Stored: Record {
    fn table(tables: &Tables) -> &Table<Self>;

    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;
}

macro_rules! define_tables {
    ($($variant:ident => $field:ident: $ty:ty),* $(,)?) => {
        /// In-memory image of every table
        #[derive(Debug, Clone, Default)]
        pub struct Tables {
            $(pub $field: Table<$ty>,)*
        }

        $(
            impl Stored for $ty {
                fn table(tables: &Tables) -> &Table<Self> {
                    &tables.$field
                }

                fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
                    &mut tables.$field
                }
            }
        )*

        impl Tables {
            fn load(paths: &VaultPaths) -> VaultResult<Self> {
                Ok(Self {
                    $($field: load_table(paths)?,)*
                })
            }

            /// Rows in a table, tombstones included
            pub fn len(&self, table: TableName) -> usize {
                match table {
                    $(TableName::$variant => self.$field.len(),)*
                }
            }

            /// Rows in a table without a tombstone
            pub fn live_len(&self, table: TableName) -> usize {
                match table {
                    $(TableName::$variant => self.$field.live_len(),)*
                }
            }

            pub(crate) fn clear(&mut self, table: TableName) {
                match table {
                    $(TableName::$variant => self.$field.clear(),)*
                }
            }

            fn encode(&self, table: TableName) -> VaultResult<serde_json::Value> {
                match table {
                    $(TableName::$variant => encode_table(&self.$field),)*
                }
            }

            /// Copy of the listed tables; the rest stay empty
            fn snapshot(&self, scope: &BTreeSet<TableName>) -> Self {
                let mut copy = Self::default();
                for table in scope {
                    match table {
                        $(TableName::$variant => copy.$field = self.$field.clone(),)*
                    }
                }
                copy
            }

            fn restore(&mut self, mut snapshot: Self, scope: &BTreeSet<TableName>) {
                for table in scope {
                    match table {
                        $(TableName::$variant => {
                            std::mem::swap(&mut self.$field, &mut snapshot.$field)
                        })*
                    }
                }
            }
        }
    };
}

define_tables! {
    Accounts => accounts: Account,
    Transactions => transactions: Transaction,
    Loans => loans: Loan,
    Subscriptions => subscriptions: Subscription,
    Budgets => budgets: Budget,
    Goals => goals: FinancialGoal,
    RecurringRules => recurring_rules: RecurringRule,
    CreditCards => credit_cards: CreditCard,
}

fn load_table<T: Record>(paths: &VaultPaths) -> VaultResult<Table<T>> {
    let file: TableFile<T> = read_json(paths.table_file(T::TABLE.key()))?;
    let table = Table::from_records(file.records);
    debug!(table = %T::TABLE, records = table.len(), "loaded table");
    Ok(table)
}

fn encode_table<T: Record>(table: &Table<T>) -> VaultResult<serde_json::Value> {
    serde_json::to_value(TableFile {
        records: table.to_records(),
    })
    .map_err(|e| VaultError::Storage(format!("Failed to encode {}: {}", T::TABLE, e)))
}

/// Row counts for one table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCount {
    pub table: TableName,
    pub live: usize,
    pub total: usize,
}

/// Handle to an opened data directory
pub struct Store {
    paths: VaultPaths,
    tables: RwLock<Tables>,
    next_tx: AtomicU64,
}

impl Store {
    /// Open the store: create directories, replay any leftover journal, run
    /// pending migrations and load every table.
    pub fn open(paths: VaultPaths) -> VaultResult<Self> {
        paths.ensure_directories()?;

        if journal::recover(&paths)? {
            info!("finished an interrupted commit");
        }

        let report = migrations::run_pending(&paths)?;
        if !report.applied.is_empty() {
            info!(
                from = report.from_version,
                to = report.to_version,
                "schema upgraded"
            );
        }

        let tables = Tables::load(&paths)?;
        info!(data_dir = %paths.data_dir().display(), "store opened");

        Ok(Self {
            paths,
            tables: RwLock::new(tables),
            next_tx: AtomicU64::new(1),
        })
    }

    /// Release the store. Every commit is already durable, so this only
    /// reports a poisoned lock.
    pub fn close(self) -> VaultResult<()> {
        self.tables
            .into_inner()
            .map_err(|e| VaultError::Storage(format!("Store lock poisoned: {}", e)))?;
        info!("store closed");
        Ok(())
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &VaultPaths {
        &self.paths
    }

    fn read_lock(&self) -> VaultResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_lock(&self) -> VaultResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Run a closure against a consistent view of every table
    pub fn read<R, F>(&self, f: F) -> VaultResult<R>
    where
        F: FnOnce(&Tables) -> R,
    {
        let tables = self.read_lock()?;
        Ok(f(&tables))
    }

    /// Get a record by id, whether or not it carries a tombstone
    pub fn get<T: Stored>(&self, id: &T::Id) -> VaultResult<Option<T>> {
        self.read(|tables| T::table(tables).get(id).cloned())
    }

    /// Live records of a table, in id order
    pub fn list<T: Stored>(&self) -> VaultResult<Vec<T>> {
        self.read(|tables| T::table(tables).live().cloned().collect())
    }

    /// Every record of a table, tombstones included
    pub fn list_all<T: Stored>(&self) -> VaultResult<Vec<T>> {
        self.read(|tables| T::table(tables).to_records())
    }

    /// Records matching a predicate. Tombstones are not filtered out.
    pub fn filter<T, P>(&self, predicate: P) -> VaultResult<Vec<T>>
    where
        T: Stored,
        P: Fn(&T) -> bool,
    {
        self.read(|tables| {
            T::table(tables)
                .iter()
                .filter(|r| predicate(r))
                .cloned()
                .collect()
        })
    }

    /// Row counts for every table
    pub fn counts(&self) -> VaultResult<Vec<TableCount>> {
        self.read(|tables| {
            TableName::ALL
                .into_iter()
                .map(|table| TableCount {
                    table,
                    live: tables.live_len(table),
                    total: tables.len(table),
                })
                .collect()
        })
    }

    pub fn add<T: Stored>(&self, record: T) -> VaultResult<()> {
        self.with_transaction(&[T::TABLE], |tx| tx.add(record))
    }

    /// Apply an edit to one record; `NotFound` if the id is absent
    pub fn update<T, F>(&self, id: &T::Id, edit: F) -> VaultResult<T>
    where
        T: Stored,
        F: FnOnce(&mut T),
    {
        self.with_transaction(&[T::TABLE], |tx| tx.update(id, edit))
    }

    /// Soft delete a record
    pub fn remove<T: Stored>(&self, id: &T::Id) -> VaultResult<T> {
        self.with_transaction(&[T::TABLE], |tx| tx.remove::<T>(id))
    }

    /// Undo a soft delete
    pub fn restore<T: Stored>(&self, id: &T::Id) -> VaultResult<T> {
        self.with_transaction(&[T::TABLE], |tx| tx.restore::<T>(id))
    }

    pub fn bulk_upsert<T: Stored>(&self, records: Vec<T>) -> VaultResult<UpsertCount> {
        self.with_transaction(&[T::TABLE], |tx| tx.bulk_upsert(records))
    }

    /// Empty every table in one commit
    pub fn clear_all(&self) -> VaultResult<()> {
        self.with_transaction(&TableName::ALL, |tx| {
            for table in TableName::ALL {
                tx.clear(table)?;
            }
            Ok(())
        })
    }

    /// Run `body` against the listed tables as one atomic unit.
    ///
    /// The write lock is held until the commit is durable, so readers see
    /// either the state before or after. If `body` or the commit fails, every
    /// listed table is put back the way it was and the error is returned.
    pub fn with_transaction<R, F>(&self, scope: &[TableName], body: F) -> VaultResult<R>
    where
        F: FnOnce(&mut Tx<'_>) -> VaultResult<R>,
    {
        let scope: BTreeSet<TableName> = scope.iter().copied().collect();
        let tx_id = self.next_tx.fetch_add(1, Ordering::Relaxed);

        let mut tables = self.write_lock()?;
        let snapshot = tables.snapshot(&scope);
        debug!(tx_id, tables = scope.len(), "Transaction started");

        let outcome = {
            let mut tx = Tx::new(&mut tables, &scope);
            body(&mut tx).map(|value| (value, tx.into_touched()))
        };
        let result = outcome.and_then(|(value, touched)| {
            self.persist(&tables, &touched)?;
            Ok((value, touched))
        });

        match result {
            Ok((value, touched)) => {
                debug!(tx_id, touched = touched.len(), "Transaction committed");
                Ok(value)
            }
            Err(err) => {
                tables.restore(snapshot, &scope);
                debug!(tx_id, error = %err, "Transaction rolled back");
                Err(err)
            }
        }
    }

    fn persist(&self, tables: &Tables, touched: &BTreeSet<TableName>) -> VaultResult<()> {
        let mut images = BTreeMap::new();
        for table in touched {
            images.insert(table.key().to_string(), tables.encode(*table)?);
        }
        journal::commit(&self.paths, images)
    }
}
