//! Credit card model
//!
//! A card embeds its own charge history. Charges are stored in integer minor
//! units and carry their own timestamps; like loan payments they are unique
//! within one card and are changed by rewriting the whole card record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CardTransactionId, CreditCardId};
use super::money::Money;
use super::record::{ensure_unique_children, index, Record, RecordMeta, TableName};

/// A charge or refund on a credit card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardTransaction {
    pub id: CardTransactionId,
    pub merchant: String,
    pub category: String,
    /// Positive for charges, negative for refunds and payments
    pub amount_minor_units: Money,
    pub currency: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    pub id: CreditCardId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_four: Option<String>,

    #[serde(default)]
    pub credit_limit_minor_units: Money,

    pub currency: String,

    /// Day of month the statement closes (1-31)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_day: Option<u8>,

    /// Day of month payment is due (1-31)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_due_day: Option<u8>,

    #[serde(default)]
    pub transactions: Vec<CreditCardTransaction>,

    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl CreditCard {
    pub fn new(name: impl Into<String>, currency: impl Into<String>, limit: Money) -> Self {
        Self {
            id: CreditCardId::new(),
            name: name.into(),
            issuer: None,
            last_four: None,
            credit_limit_minor_units: limit,
            currency: currency.into(),
            statement_day: None,
            payment_due_day: None,
            transactions: Vec::new(),
            meta: RecordMeta::new(),
        }
    }

    /// Append a charge in the card's currency and return its id
    pub fn record_charge(
        &mut self,
        merchant: impl Into<String>,
        category: impl Into<String>,
        amount: Money,
        date: NaiveDate,
        notes: Option<String>,
    ) -> CardTransactionId {
        let now = Utc::now();
        let id = CardTransactionId::new();
        self.transactions.push(CreditCardTransaction {
            id: id.clone(),
            merchant: merchant.into(),
            category: category.into(),
            amount_minor_units: amount,
            currency: self.currency.clone(),
            date,
            notes,
            created_at: now,
            updated_at: now,
        });
        id
    }

    /// Edit one embedded charge in place, bumping its `updatedAt`
    pub fn edit_charge<F>(&mut self, charge_id: &CardTransactionId, edit: F) -> bool
    where
        F: FnOnce(&mut CreditCardTransaction),
    {
        match self.transactions.iter_mut().find(|t| &t.id == charge_id) {
            Some(charge) => {
                edit(charge);
                charge.updated_at = charge.updated_at.max(Utc::now());
                true
            }
            None => false,
        }
    }

    pub fn remove_charge(&mut self, charge_id: &CardTransactionId) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| &t.id != charge_id);
        self.transactions.len() != before
    }

    /// Sum of charges in the card's own currency
    pub fn balance(&self) -> Money {
        self.transactions
            .iter()
            .filter(|t| t.currency == self.currency)
            .map(|t| t.amount_minor_units)
            .sum()
    }

    pub fn available_credit(&self) -> Money {
        self.credit_limit_minor_units - self.balance()
    }
}

impl Record for CreditCard {
    type Id = CreditCardId;

    const TABLE: TableName = TableName::CreditCards;

    fn id(&self) -> &CreditCardId {
        &self.id
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        vec![(index::CURRENCY, self.currency.clone())]
    }

    fn check(&self) -> Result<(), String> {
        for (label, day) in [
            ("statement day", self.statement_day),
            ("payment due day", self.payment_due_day),
        ] {
            if let Some(day) = day {
                if !(1..=31).contains(&day) {
                    return Err(format!("{} {} is not a day of the month", label, day));
                }
            }
        }
        ensure_unique_children(
            "card transaction",
            self.transactions.iter().map(|t| t.id.as_str()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_balance_and_available_credit() {
        let mut card = CreditCard::new("Visa", "USD", Money::from_minor_units(100_000));
        card.record_charge("Grocer", "Food", Money::from_minor_units(4_250), date(2025, 1, 3), None);
        card.record_charge("Airline", "Travel", Money::from_minor_units(30_000), date(2025, 1, 9), None);
        card.record_charge("Grocer", "Food", Money::from_minor_units(-1_000), date(2025, 1, 10), None);

        assert_eq!(card.balance().minor_units(), 33_250);
        assert_eq!(card.available_credit().minor_units(), 66_750);
    }

    #[test]
    fn test_edit_and_remove_charge() {
        let mut card = CreditCard::new("Amex", "USD", Money::from_minor_units(50_000));
        let id = card.record_charge("Cafe", "Dining", Money::from_minor_units(500), date(2025, 2, 1), None);

        assert!(card.edit_charge(&id, |c| c.notes = Some("with client".into())));
        assert_eq!(card.transactions[0].notes.as_deref(), Some("with client"));
        assert!(card.transactions[0].updated_at >= card.transactions[0].created_at);

        assert!(card.remove_charge(&id));
        assert!(!card.edit_charge(&id, |_| {}));
    }

    #[test]
    fn test_charge_wire_format() {
        let mut card = CreditCard::new("Visa", "USD", Money::zero());
        card.record_charge("Shop", "Misc", Money::from_minor_units(1234), date(2025, 4, 1), None);
        let json = serde_json::to_value(&card).unwrap();
        let charge = &json["transactions"][0];
        assert_eq!(charge["amountMinorUnits"], 1234);
        assert_eq!(charge["currency"], "USD");
        assert!(charge.get("createdAt").is_some());
        assert!(charge.get("updatedAt").is_some());
    }

    #[test]
    fn test_invalid_statement_day() {
        let mut card = CreditCard::new("Visa", "USD", Money::zero());
        card.statement_day = Some(0);
        assert!(card.validate().is_err());
    }
}
