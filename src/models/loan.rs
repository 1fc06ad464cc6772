//! Loan model
//!
//! A loan owns its repayment history as an embedded list. Payment ids are
//! unique within one loan only; any change to the list rewrites the whole loan
//! record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{LoanId, LoanPaymentId};
use super::record::{ensure_finite, ensure_unique_children, index, Record, RecordMeta, TableName};

/// Lifecycle state of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum LoanStatus {
    #[default]
    Active,
    PaidOff,
    Defaulted,
}

impl LoanStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PaidOff => "paidOff",
            Self::Defaulted => "defaulted",
        }
    }
}

/// One repayment recorded against a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanPayment {
    pub id: LoanPaymentId,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A loan taken or given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: LoanId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lender: Option<String>,

    pub principal: f64,

    /// Annual rate in percent
    #[serde(default)]
    pub interest_rate: f64,

    pub start_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_months: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    pub status: LoanStatus,

    #[serde(default)]
    pub payments: Vec<LoanPayment>,

    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Loan {
    pub fn new(name: impl Into<String>, principal: f64, start_date: NaiveDate) -> Self {
        Self {
            id: LoanId::new(),
            name: name.into(),
            lender: None,
            principal,
            interest_rate: 0.0,
            start_date,
            term_months: None,
            due_date: None,
            status: LoanStatus::Active,
            payments: Vec::new(),
            meta: RecordMeta::new(),
        }
    }

    /// Append a payment and return its id
    pub fn record_payment(
        &mut self,
        amount: f64,
        date: NaiveDate,
        notes: Option<String>,
    ) -> LoanPaymentId {
        let id = LoanPaymentId::new();
        self.payments.push(LoanPayment {
            id: id.clone(),
            amount,
            date,
            notes,
        });
        if self.outstanding() <= 0.0 && self.status == LoanStatus::Active {
            self.status = LoanStatus::PaidOff;
        }
        id
    }

    /// Remove a payment; returns false if no payment had that id
    pub fn remove_payment(&mut self, payment_id: &LoanPaymentId) -> bool {
        let before = self.payments.len();
        self.payments.retain(|p| &p.id != payment_id);
        let removed = self.payments.len() != before;
        if removed && self.status == LoanStatus::PaidOff && self.outstanding() > 0.0 {
            self.status = LoanStatus::Active;
        }
        removed
    }

    pub fn total_paid(&self) -> f64 {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Principal not yet repaid, never below zero
    pub fn outstanding(&self) -> f64 {
        (self.principal - self.total_paid()).max(0.0)
    }
}

impl Record for Loan {
    type Id = LoanId;

    const TABLE: TableName = TableName::Loans;

    fn id(&self) -> &LoanId {
        &self.id
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![(index::STATUS, self.status.as_str().to_string())];
        if let Some(due) = self.due_date {
            entries.push((index::DUE_DATE, due.to_string()));
        }
        entries
    }

    fn check(&self) -> Result<(), String> {
        ensure_finite("principal", self.principal)?;
        ensure_finite("interest rate", self.interest_rate)?;
        for payment in &self.payments {
            ensure_finite("payment amount", payment.amount)?;
        }
        ensure_unique_children("payment", self.payments.iter().map(|p| p.id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_record_payment_updates_totals() {
        let mut loan = Loan::new("Car", 1000.0, date(2024, 1, 1));
        loan.record_payment(400.0, date(2024, 2, 1), None);
        assert_eq!(loan.total_paid(), 400.0);
        assert_eq!(loan.outstanding(), 600.0);
        assert_eq!(loan.status, LoanStatus::Active);
    }

    #[test]
    fn test_full_repayment_marks_paid_off() {
        let mut loan = Loan::new("Laptop", 500.0, date(2024, 1, 1));
        let id = loan.record_payment(500.0, date(2024, 3, 1), Some("final".into()));
        assert_eq!(loan.status, LoanStatus::PaidOff);

        assert!(loan.remove_payment(&id));
        assert_eq!(loan.status, LoanStatus::Active);
        assert!(!loan.remove_payment(&id));
    }

    #[test]
    fn test_duplicate_payment_ids_rejected() {
        let mut loan = Loan::new("Student", 2000.0, date(2020, 9, 1));
        loan.record_payment(100.0, date(2020, 10, 1), None);
        let dup = loan.payments[0].clone();
        loan.payments.push(dup);
        let err = loan.validate().unwrap_err();
        assert!(err.contains("duplicate payment id"));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let mut loan = Loan::new("Boat", 8000.0, date(2024, 1, 1));
        loan.interest_rate = f64::NAN;
        assert!(loan.validate().is_err());

        let mut loan = Loan::new("Boat", 8000.0, date(2024, 1, 1));
        loan.record_payment(f64::INFINITY, date(2024, 2, 1), None);
        assert!(loan.validate().is_err());
    }

    #[test]
    fn test_payment_wire_format() {
        let mut loan = Loan::new("Mortgage", 1.0, date(2024, 1, 1));
        loan.record_payment(1.0, date(2024, 1, 31), None);
        let json = serde_json::to_value(&loan).unwrap();
        assert_eq!(json["status"], "paidOff");
        assert_eq!(json["startDate"], "2024-01-01");
        let payment = &json["payments"][0];
        assert_eq!(payment["date"], "2024-01-31");
        assert!(payment.get("notes").is_none());
    }
}
