//! Scoped write access used inside `Store::with_transaction`
//!
//! A `Tx` only reaches the tables named when the transaction opened. Every
//! write validates the record first and marks its table as touched; the store
//! persists exactly the touched tables at commit.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{VaultError, VaultResult};
use crate::models::TableName;

use super::{Stored, Tables};

/// Counts reported by `Tx::bulk_upsert`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCount {
    pub inserted: usize,
    pub replaced: usize,
}

impl UpsertCount {
    pub fn total(&self) -> usize {
        self.inserted + self.replaced
    }
}

pub struct Tx<'a> {
    tables: &'a mut Tables,
    scope: &'a BTreeSet<TableName>,
    touched: BTreeSet<TableName>,
}

impl<'a> Tx<'a> {
    pub(crate) fn new(tables: &'a mut Tables, scope: &'a BTreeSet<TableName>) -> Self {
        Self {
            tables,
            scope,
            touched: BTreeSet::new(),
        }
    }

    pub(crate) fn into_touched(self) -> BTreeSet<TableName> {
        self.touched
    }

    /// Tables this transaction may read and write
    pub fn scope(&self) -> impl Iterator<Item = TableName> + '_ {
        self.scope.iter().copied()
    }

    fn check_scope(&self, table: TableName) -> VaultResult<()> {
        if self.scope.contains(&table) {
            Ok(())
        } else {
            Err(VaultError::Storage(format!(
                "table {} is not part of this transaction",
                table
            )))
        }
    }

    fn writable<T: Stored>(&mut self) -> VaultResult<&mut super::Table<T>> {
        self.check_scope(T::TABLE)?;
        self.touched.insert(T::TABLE);
        Ok(T::table_mut(self.tables))
    }

    /// Fetch a record by id, tombstoned or not
    pub fn get<T: Stored>(&self, id: &T::Id) -> VaultResult<Option<&T>> {
        self.check_scope(T::TABLE)?;
        Ok(T::table(self.tables).get(id))
    }

    /// Live records of a table
    pub fn list<T: Stored>(&self) -> VaultResult<Vec<T>> {
        self.check_scope(T::TABLE)?;
        Ok(T::table(self.tables).live().cloned().collect())
    }

    /// Insert a new record; an existing id is a `Duplicate` error
    pub fn add<T: Stored>(&mut self, mut record: T) -> VaultResult<()> {
        record.validate().map_err(VaultError::Validation)?;
        let table = self.writable::<T>()?;
        if table.contains(record.id()) {
            return Err(VaultError::duplicate(
                T::TABLE.entity_name(),
                record.id().to_string(),
            ));
        }
        record.meta_mut().touch();
        table.insert(record);
        Ok(())
    }

    /// Mutate a record in place and return the new version
    pub fn update<T, F>(&mut self, id: &T::Id, edit: F) -> VaultResult<T>
    where
        T: Stored,
        F: FnOnce(&mut T),
    {
        let table = self.writable::<T>()?;
        let mut record = table
            .get(id)
            .cloned()
            .ok_or_else(|| VaultError::not_found(T::TABLE.entity_name(), id.to_string()))?;

        edit(&mut record);
        if record.id() != id {
            return Err(VaultError::Validation(format!(
                "{} {} cannot change its id",
                T::TABLE.entity_name(),
                id
            )));
        }
        record.validate().map_err(VaultError::Validation)?;
        record.meta_mut().touch();

        table.insert(record.clone());
        Ok(record)
    }

    /// Soft delete: set the tombstone, keep the row
    pub fn remove<T: Stored>(&mut self, id: &T::Id) -> VaultResult<T> {
        self.update(id, |record: &mut T| record.meta_mut().mark_deleted())
    }

    /// Clear a tombstone
    pub fn restore<T: Stored>(&mut self, id: &T::Id) -> VaultResult<T> {
        self.update(id, |record: &mut T| record.meta_mut().clear_deleted())
    }

    /// Insert or replace one record by id without touching its timestamps
    pub fn upsert<T: Stored>(&mut self, record: T) -> VaultResult<bool> {
        record.validate().map_err(VaultError::Validation)?;
        let table = self.writable::<T>()?;
        Ok(table.insert(record).is_some())
    }

    /// Insert or replace many records; the last entry wins for repeated ids
    pub fn bulk_upsert<T: Stored>(&mut self, records: Vec<T>) -> VaultResult<UpsertCount> {
        let mut by_id = BTreeMap::new();
        for record in records {
            record.validate().map_err(VaultError::Validation)?;
            by_id.insert(record.id().clone(), record);
        }

        let table = self.writable::<T>()?;
        let mut count = UpsertCount::default();
        for record in by_id.into_values() {
            if table.insert(record).is_some() {
                count.replaced += 1;
            } else {
                count.inserted += 1;
            }
        }
        Ok(count)
    }

    /// Drop every row of a table, tombstones included
    pub fn clear(&mut self, table: TableName) -> VaultResult<()> {
        self.check_scope(table)?;
        self.touched.insert(table);
        self.tables.clear(table);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, AccountKind, Loan};
    use chrono::NaiveDate;

    fn scope(tables: &[TableName]) -> BTreeSet<TableName> {
        tables.iter().copied().collect()
    }

    #[test]
    fn test_out_of_scope_access_is_rejected() {
        let mut tables = Tables::default();
        let scope = scope(&[TableName::Accounts]);
        let mut tx = Tx::new(&mut tables, &scope);

        let loan = Loan::new("Car", 1000.0, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(tx.add(loan).unwrap_err().is_storage());
        assert!(tx.into_touched().is_empty());
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut tables = Tables::default();
        let scope = scope(&[TableName::Accounts]);
        let mut tx = Tx::new(&mut tables, &scope);

        let account = Account::new("Checking", AccountKind::Checking, "USD");
        tx.add(account.clone()).unwrap();
        let err = tx.add(account).unwrap_err();
        assert!(matches!(err, VaultError::Duplicate { .. }));
    }

    #[test]
    fn test_update_cannot_change_id() {
        let mut tables = Tables::default();
        let scope = scope(&[TableName::Accounts]);
        let mut tx = Tx::new(&mut tables, &scope);

        let account = Account::new("Checking", AccountKind::Checking, "USD");
        let id = account.id.clone();
        tx.add(account).unwrap();

        let err = tx
            .update(&id, |a: &mut Account| a.id = "other".into())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_bulk_upsert_counts_and_last_wins() {
        let mut tables = Tables::default();
        let scope = scope(&[TableName::Accounts]);
        let mut tx = Tx::new(&mut tables, &scope);

        let existing = Account::new("Checking", AccountKind::Checking, "USD");
        tx.add(existing.clone()).unwrap();

        let fresh = Account::new("Savings", AccountKind::Savings, "USD");
        let mut renamed = fresh.clone();
        renamed.name = "Rainy day".into();

        let count = tx
            .bulk_upsert(vec![existing.clone(), fresh, renamed])
            .unwrap();
        assert_eq!(count, UpsertCount { inserted: 1, replaced: 1 });

        let names: Vec<String> = tx.list::<Account>().unwrap().into_iter().map(|a| a.name).collect();
        assert!(names.contains(&"Rainy day".to_string()));
        assert!(!names.contains(&"Savings".to_string()));
    }

    #[test]
    fn test_invalid_record_is_not_written() {
        let mut tables = Tables::default();
        let scope = scope(&[TableName::Accounts]);
        let mut tx = Tx::new(&mut tables, &scope);

        let mut account = Account::new("Checking", AccountKind::Checking, "USD");
        account.id = "".into();
        assert!(tx.add(account).unwrap_err().is_validation());
        assert!(tx.into_touched().is_empty());
        assert!(tables.accounts.is_empty());
    }
}
