//! Subscription model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, SubscriptionId};
use super::record::{ensure_finite, index, Record, RecordMeta, TableName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingCycle {
    /// Approximate number of charges per year
    pub const fn per_year(&self) -> f64 {
        match self {
            Self::Weekly => 52.0,
            Self::Monthly => 12.0,
            Self::Quarterly => 4.0,
            Self::Yearly => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Paused,
    Cancelled,
}

impl SubscriptionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A recurring charge such as a streaming service or gym membership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: SubscriptionId,

    pub name: String,

    pub amount: f64,

    pub currency: String,

    #[serde(default)]
    pub billing_cycle: BillingCycle,

    pub next_billing_date: NaiveDate,

    #[serde(default)]
    pub status: SubscriptionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,

    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Subscription {
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        currency: impl Into<String>,
        next_billing_date: NaiveDate,
    ) -> Self {
        Self {
            id: SubscriptionId::new(),
            name: name.into(),
            amount,
            currency: currency.into(),
            billing_cycle: BillingCycle::Monthly,
            next_billing_date,
            status: SubscriptionStatus::Active,
            category: None,
            account_id: None,
            meta: RecordMeta::new(),
        }
    }

    /// Yearly cost implied by the billing cycle
    pub fn annual_cost(&self) -> f64 {
        self.amount * self.billing_cycle.per_year()
    }
}

impl Record for Subscription {
    type Id = SubscriptionId;

    const TABLE: TableName = TableName::Subscriptions;

    fn id(&self) -> &SubscriptionId {
        &self.id
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            (index::STATUS, self.status.as_str().to_string()),
            (index::NEXT_BILLING, self.next_billing_date.to_string()),
        ];
        if let Some(account_id) = &self.account_id {
            entries.push((index::ACCOUNT, account_id.to_string()));
        }
        entries
    }

    fn check(&self) -> Result<(), String> {
        ensure_finite("amount", self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annual_cost() {
        let mut sub = Subscription::new(
            "Music",
            9.99,
            "USD",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        assert!((sub.annual_cost() - 119.88).abs() < 1e-9);

        sub.billing_cycle = BillingCycle::Yearly;
        assert!((sub.annual_cost() - 9.99).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_amount_rejected() {
        let sub = Subscription::new(
            "Video",
            f64::NAN,
            "USD",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        assert!(sub.validate().is_err());
    }

    #[test]
    fn test_wire_format() {
        let sub = Subscription::new(
            "News",
            5.0,
            "GBP",
            NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
        );
        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(json["billingCycle"], "monthly");
        assert_eq!(json["nextBillingDate"], "2025-06-15");
        assert_eq!(json["status"], "active");
    }
}
