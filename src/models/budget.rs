//! Budget model
//!
//! A spending limit for one category over a repeating period.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::BudgetId;
use super::record::{ensure_finite, index, Record, RecordMeta, TableName};

/// Length of the period a budget limit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: BudgetId,

    pub name: String,

    pub category: String,

    /// Limit per period in major units
    pub amount: f64,

    #[serde(default)]
    pub period: BudgetPeriod,

    pub start_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Budget {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        amount: f64,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: BudgetId::new(),
            name: name.into(),
            category: category.into(),
            amount,
            period: BudgetPeriod::Monthly,
            start_date,
            end_date: None,
            meta: RecordMeta::new(),
        }
    }

    /// Whether the budget is in force on the given date
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.map_or(true, |end| date <= end)
    }
}

impl Record for Budget {
    type Id = BudgetId;

    const TABLE: TableName = TableName::Budgets;

    fn id(&self) -> &BudgetId {
        &self.id
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (index::CATEGORY, self.category.clone()),
            (index::PERIOD, self.period.as_str().to_string()),
        ]
    }

    fn check(&self) -> Result<(), String> {
        ensure_finite("amount", self.amount)?;
        match self.end_date {
            Some(end) if end < self.start_date => Err("end date precedes start date".into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_covers_open_ended() {
        let budget = Budget::new("Food", "Groceries", 400.0, date(2025, 1, 1));
        assert!(!budget.covers(date(2024, 12, 31)));
        assert!(budget.covers(date(2030, 1, 1)));
    }

    #[test]
    fn test_covers_bounded() {
        let mut budget = Budget::new("Trip", "Travel", 1500.0, date(2025, 6, 1));
        budget.end_date = Some(date(2025, 6, 30));
        assert!(budget.covers(date(2025, 6, 30)));
        assert!(!budget.covers(date(2025, 7, 1)));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut budget = Budget::new("Bad", "Misc", 10.0, date(2025, 6, 1));
        budget.end_date = Some(date(2025, 5, 1));
        assert!(budget.validate().is_err());
    }
}
