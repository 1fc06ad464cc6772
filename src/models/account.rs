//! Account model
//!
//! Represents financial accounts (checking, savings, cash, etc.)

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AccountId;
use super::record::{ensure_finite, index, Record, RecordMeta, TableName};

/// Type of financial account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    #[default]
    Checking,
    Savings,
    Credit,
    Cash,
    Investment,
    Loan,
    Other,
}

impl AccountKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::Credit => "credit",
            Self::Cash => "cash",
            Self::Investment => "investment",
            Self::Loan => "loan",
            Self::Other => "other",
        }
    }

    /// Returns true if a positive balance on this account is money owed
    pub fn is_liability(&self) -> bool {
        matches!(self, Self::Credit | Self::Loan)
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A financial account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,

    pub name: String,

    #[serde(rename = "type")]
    pub kind: AccountKind,

    /// Current balance in major units
    #[serde(default)]
    pub balance: f64,

    pub currency: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Account {
    /// Create a new account with a zero balance
    pub fn new(name: impl Into<String>, kind: AccountKind, currency: impl Into<String>) -> Self {
        Self {
            id: AccountId::new(),
            name: name.into(),
            kind,
            balance: 0.0,
            currency: currency.into(),
            institution: None,
            notes: None,
            meta: RecordMeta::new(),
        }
    }

    pub fn with_balance(mut self, balance: f64) -> Self {
        self.balance = balance;
        self
    }
}

impl Record for Account {
    type Id = AccountId;

    const TABLE: TableName = TableName::Accounts;

    fn id(&self) -> &AccountId {
        &self.id
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        vec![(index::KIND, self.kind.as_str().to_string())]
    }

    fn check(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("account name cannot be empty".into());
        }
        ensure_finite("balance", self.balance)
    }
}
