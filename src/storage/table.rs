//! In-memory table with secondary indexes
//!
//! A `Table` maps record ids to records and keeps one index per name returned
//! by `Record::index_entries`. Every insert drops the old row's index entries
//! before adding the new ones, so indexes always describe the current rows.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use serde::{Deserialize, Serialize};

use crate::models::Record;

type IndexMap<Id> = BTreeMap<String, BTreeSet<Id>>;

/// On-disk layout of a table file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Record"))]
pub struct TableFile<T> {
    pub records: Vec<T>,
}

impl<T> Default for TableFile<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Table<T: Record> {
    rows: BTreeMap<T::Id, T>,
    indexes: BTreeMap<&'static str, IndexMap<T::Id>>,
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            indexes: BTreeMap::new(),
        }
    }
}

impl<T: Record> Table<T> {
    /// Build a table from stored rows; later duplicates replace earlier ones
    pub fn from_records(records: impl IntoIterator<Item = T>) -> Self {
        let mut table = Self::default();
        for record in records {
            table.insert(record);
        }
        table
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.rows.get(id)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.rows.contains_key(id)
    }

    /// Number of rows including tombstones
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows without a tombstone
    pub fn live_len(&self) -> usize {
        self.live().count()
    }

    /// Every row, tombstones included, in id order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    /// Rows without a tombstone, in id order
    pub fn live(&self) -> impl Iterator<Item = &T> {
        self.rows.values().filter(|r| !r.is_deleted())
    }

    /// Insert or replace a row by id, returning the previous row
    pub fn insert(&mut self, record: T) -> Option<T> {
        let id = record.id().clone();
        let previous = self.rows.remove(&id);
        if let Some(old) = &previous {
            self.unindex(old);
        }
        self.index(&record);
        self.rows.insert(id, record);
        previous
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.indexes.clear();
    }

    /// Rows whose index entry equals `key`, tombstones included
    pub fn lookup<'a>(&'a self, index: &str, key: &str) -> impl Iterator<Item = &'a T> + 'a {
        self.indexes
            .get(index)
            .and_then(|entries| entries.get(key))
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(move |id| self.rows.get(id))
    }

    /// Rows whose index entry falls inside the bounds, in key order
    pub fn range<'a>(
        &'a self,
        index: &str,
        lower: Bound<&'a str>,
        upper: Bound<&'a str>,
    ) -> impl Iterator<Item = &'a T> + 'a {
        let entries = if is_empty_range(lower, upper) {
            None
        } else {
            self.indexes.get(index)
        };
        entries
            .into_iter()
            .flat_map(move |entries| entries.range::<str, _>((lower, upper)))
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(move |id| self.rows.get(id))
    }

    /// Distinct keys present in an index
    pub fn index_keys(&self, index: &str) -> Vec<String> {
        self.indexes
            .get(index)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Copy every row out for serialization
    pub fn to_records(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }

    fn index(&mut self, record: &T) {
        for (name, key) in record.index_entries() {
            self.indexes
                .entry(name)
                .or_default()
                .entry(key)
                .or_default()
                .insert(record.id().clone());
        }
    }

    fn unindex(&mut self, record: &T) {
        for (name, key) in record.index_entries() {
            if let Some(entries) = self.indexes.get_mut(name) {
                if let Some(ids) = entries.get_mut(&key) {
                    ids.remove(record.id());
                    if ids.is_empty() {
                        entries.remove(&key);
                    }
                }
            }
        }
    }
}

/// BTreeMap::range panics on inverted bounds; treat them as empty instead
fn is_empty_range(lower: Bound<&str>, upper: Bound<&str>) -> bool {
    match (lower, upper) {
        (Bound::Included(l), Bound::Included(u)) => l > u,
        (Bound::Included(l) | Bound::Excluded(l), Bound::Excluded(u))
        | (Bound::Excluded(l), Bound::Included(u)) => l >= u,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::index;
    use crate::models::{AccountId, Transaction, TransactionKind};
    use chrono::NaiveDate;

    fn txn(account: &str, day: u32) -> Transaction {
        Transaction::new(
            AccountId::from_raw(account),
            TransactionKind::Expense,
            10.0,
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
        )
    }

    #[test]
    fn test_insert_replaces_and_reindexes() {
        let mut table = Table::default();
        let mut t = txn("a", 1);
        table.insert(t.clone());
        assert_eq!(table.lookup(index::ACCOUNT, "a").count(), 1);

        t.account_id = AccountId::from_raw("b");
        let previous = table.insert(t.clone());
        assert!(previous.is_some());
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(index::ACCOUNT, "a").count(), 0);
        assert_eq!(table.lookup(index::ACCOUNT, "b").count(), 1);
        assert_eq!(table.index_keys(index::ACCOUNT), vec!["b".to_string()]);
    }

    #[test]
    fn test_range_by_date() {
        let table = Table::from_records(vec![txn("a", 1), txn("a", 10), txn("a", 20)]);
        let hits: Vec<_> = table
            .range(
                index::DATE,
                Bound::Included("2025-01-05"),
                Bound::Included("2025-01-20"),
            )
            .map(|t| t.date.to_string())
            .collect();
        assert_eq!(hits, vec!["2025-01-10", "2025-01-20"]);
    }

    #[test]
    fn test_live_excludes_tombstones() {
        let mut deleted = txn("a", 2);
        deleted.meta.mark_deleted();
        let table = Table::from_records(vec![txn("a", 1), deleted]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.live_len(), 1);
    }

    #[test]
    fn test_from_records_last_wins() {
        let first = txn("a", 1);
        let mut second = first.clone();
        second.amount = 99.0;
        let table = Table::from_records(vec![first.clone(), second]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&first.id).unwrap().amount, 99.0);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let table = Table::from_records(vec![txn("a", 1)]);
        let hits = table
            .range(
                index::DATE,
                Bound::Included("2025-02-01"),
                Bound::Included("2025-01-01"),
            )
            .count();
        assert_eq!(hits, 0);
    }

    #[test]
    fn test_unknown_index_is_empty() {
        let table = Table::from_records(vec![txn("a", 1)]);
        assert_eq!(table.lookup("nope", "a").count(), 0);
        assert_eq!(
            table
                .range("nope", Bound::Unbounded, Bound::Unbounded)
                .count(),
            0
        );
    }
}
