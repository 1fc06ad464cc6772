//! Core data models for finvault
//!
//! This module contains every record kind the store persists: accounts,
//! transactions, loans, subscriptions, budgets, goals, recurring rules and
//! credit cards, plus the shared `Record` metadata.

pub mod account;
pub mod budget;
pub mod credit_card;
pub mod goal;
pub mod ids;
pub mod loan;
pub mod money;
pub mod record;
pub mod recurring;
pub mod subscription;
pub mod transaction;

pub use account::{Account, AccountKind};
pub use budget::{Budget, BudgetPeriod};
pub use credit_card::{CreditCard, CreditCardTransaction};
pub use goal::{FinancialGoal, GoalStatus};
pub use ids::{
    AccountId, BudgetId, CardTransactionId, CreditCardId, GoalId, LoanId, LoanPaymentId,
    RecurringRuleId, SubscriptionId, TransactionId,
};
pub use loan::{Loan, LoanPayment, LoanStatus};
pub use money::Money;
pub use record::{Record, RecordMeta, TableName};
pub use recurring::{Frequency, RecurringRule};
pub use subscription::{BillingCycle, Subscription, SubscriptionStatus};
pub use transaction::{Transaction, TransactionKind};
