//! Recurring rule model
//!
//! Rules describe transactions that repeat. Projecting the next run date is
//! done by the scheduler that owns the rules; the store only persists them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, RecurringRuleId};
use super::record::{ensure_finite, index, Record, RecordMeta, TableName};
use super::transaction::TransactionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringRule {
    pub id: RecurringRuleId,

    pub description: String,

    pub account_id: AccountId,

    #[serde(rename = "type")]
    pub kind: TransactionKind,

    pub amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default)]
    pub frequency: Frequency,

    /// Run every `interval` periods of `frequency`
    #[serde(default = "default_interval")]
    pub interval: u32,

    pub start_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    pub next_run_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_date: Option<NaiveDate>,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(flatten)]
    pub meta: RecordMeta,
}

fn default_interval() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

impl RecurringRule {
    pub fn new(
        description: impl Into<String>,
        account_id: AccountId,
        kind: TransactionKind,
        amount: f64,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: RecurringRuleId::new(),
            description: description.into(),
            account_id,
            kind,
            amount,
            category: None,
            frequency: Frequency::Monthly,
            interval: 1,
            start_date,
            end_date: None,
            next_run_date: start_date,
            last_run_date: None,
            active: true,
            meta: RecordMeta::new(),
        }
    }

    /// Whether the rule should fire on or before `today`
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.active
            && self.next_run_date <= today
            && self.end_date.map_or(true, |end| self.next_run_date <= end)
    }
}

impl Record for RecurringRule {
    type Id = RecurringRuleId;

    const TABLE: TableName = TableName::RecurringRules;

    fn id(&self) -> &RecurringRuleId {
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
            (index::ACCOUNT, self.account_id.to_string()),
            (index::NEXT_RUN, self.next_run_date.to_string()),
            (index::ACTIVE, self.active.to_string()),
        ]
    }

    fn check(&self) -> Result<(), String> {
        if self.interval == 0 {
            return Err("interval must be at least 1".into());
        }
        if self.account_id.is_blank() {
            return Err("rule must reference an account".into());
        }
        ensure_finite("amount", self.amount)
    }
}
