//! Named queries backed by the secondary indexes
//!
//! Every query returns live records only. Date-keyed queries walk the index
//! in key order, which is date order for `YYYY-MM-DD` keys.

use std::ops::Bound;

use chrono::NaiveDate;

use crate::error::VaultResult;
use crate::models::record::index;
use crate::models::{
    Account, AccountId, AccountKind, Budget, BudgetPeriod, CreditCard, FinancialGoal, GoalStatus,
    Loan, LoanStatus, Record, RecurringRule, RecurringRuleId, Subscription, SubscriptionStatus,
    Transaction,
};

use super::{Store, Stored, Table};

fn live_lookup<T: Record>(table: &Table<T>, index: &str, key: &str) -> Vec<T> {
    table
        .lookup(index, key)
        .filter(|r| !r.is_deleted())
        .cloned()
        .collect()
}

fn live_up_to<T: Record>(table: &Table<T>, index: &str, date: NaiveDate) -> Vec<T> {
    let upper = date.to_string();
    table
        .range(index, Bound::Unbounded, Bound::Included(upper.as_str()))
        .filter(|r| !r.is_deleted())
        .cloned()
        .collect()
}

impl Store {
    fn lookup<T: Stored>(&self, index: &str, key: &str) -> VaultResult<Vec<T>> {
        self.read(|tables| live_lookup(T::table(tables), index, key))
    }

    pub fn accounts_of_kind(&self, kind: AccountKind) -> VaultResult<Vec<Account>> {
        self.lookup(index::KIND, kind.as_str())
    }

    /// Transactions of one account, oldest first
    pub fn transactions_for_account(&self, account_id: &AccountId) -> VaultResult<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = self.lookup(index::ACCOUNT, account_id.as_str())?;
        transactions.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(transactions)
    }

    /// Transactions dated within `[from, to]`, oldest first
    pub fn transactions_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> VaultResult<Vec<Transaction>> {
        let (from, to) = (from.to_string(), to.to_string());
        self.read(|tables| {
            tables
                .transactions
                .range(
                    index::DATE,
                    Bound::Included(from.as_str()),
                    Bound::Included(to.as_str()),
                )
                .filter(|t| !t.is_deleted())
                .cloned()
                .collect()
        })
    }

    pub fn transactions_in_category(&self, category: &str) -> VaultResult<Vec<Transaction>> {
        self.lookup(index::CATEGORY, category)
    }

    /// Transactions generated by a recurring rule
    pub fn transactions_for_rule(&self, rule_id: &RecurringRuleId) -> VaultResult<Vec<Transaction>> {
        self.lookup(index::RECURRING_RULE, rule_id.as_str())
    }

    pub fn loans_with_status(&self, status: LoanStatus) -> VaultResult<Vec<Loan>> {
        self.lookup(index::STATUS, status.as_str())
    }

    /// Loans with a due date on or before `date`, earliest first
    pub fn loans_due_by(&self, date: NaiveDate) -> VaultResult<Vec<Loan>> {
        self.read(|tables| live_up_to(&tables.loans, index::DUE_DATE, date))
    }

    pub fn subscriptions_with_status(
        &self,
        status: SubscriptionStatus,
    ) -> VaultResult<Vec<Subscription>> {
        self.lookup(index::STATUS, status.as_str())
    }

    /// Active subscriptions billing on or before `date`
    pub fn subscriptions_due_by(&self, date: NaiveDate) -> VaultResult<Vec<Subscription>> {
        self.read(|tables| {
            live_up_to(&tables.subscriptions, index::NEXT_BILLING, date)
                .into_iter()
                .filter(|s| s.status == SubscriptionStatus::Active)
                .collect()
        })
    }

    pub fn subscriptions_for_account(
        &self,
        account_id: &AccountId,
    ) -> VaultResult<Vec<Subscription>> {
        self.lookup(index::ACCOUNT, account_id.as_str())
    }

    pub fn budgets_for_category(&self, category: &str) -> VaultResult<Vec<Budget>> {
        self.lookup(index::CATEGORY, category)
    }

    pub fn budgets_with_period(&self, period: BudgetPeriod) -> VaultResult<Vec<Budget>> {
        self.lookup(index::PERIOD, period.as_str())
    }

    pub fn goals_with_status(&self, status: GoalStatus) -> VaultResult<Vec<FinancialGoal>> {
        self.lookup(index::STATUS, status.as_str())
    }

    /// Goals whose target date is on or before `date`
    pub fn goals_due_by(&self, date: NaiveDate) -> VaultResult<Vec<FinancialGoal>> {
        self.read(|tables| live_up_to(&tables.goals, index::TARGET_DATE, date))
    }

    pub fn rules_for_account(&self, account_id: &AccountId) -> VaultResult<Vec<RecurringRule>> {
        self.lookup(index::ACCOUNT, account_id.as_str())
    }

    /// Active rules whose next run is on or before `date`
    pub fn rules_due_by(&self, date: NaiveDate) -> VaultResult<Vec<RecurringRule>> {
        self.read(|tables| {
            live_up_to(&tables.recurring_rules, index::NEXT_RUN, date)
                .into_iter()
                .filter(|r| r.active)
                .collect()
        })
    }

    pub fn cards_in_currency(&self, currency: &str) -> VaultResult<Vec<CreditCard>> {
        self.lookup(index::CURRENCY, currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::VaultPaths;
    use crate::models::{Money, TransactionKind};
    use tempfile::TempDir;

    fn open() -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = Store::open(paths).unwrap();
        (temp_dir, store)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_transaction_queries() {
        let (_temp, store) = open();
        let checking = Account::new("Checking", AccountKind::Checking, "USD");
        let savings = Account::new("Savings", AccountKind::Savings, "USD");

        let late = Transaction::new(checking.id.clone(), TransactionKind::Expense, 20.0, date(2025, 3, 10))
            .with_category("Food");
        let early = Transaction::new(checking.id.clone(), TransactionKind::Income, 1000.0, date(2025, 3, 1));
        let other = Transaction::new(savings.id.clone(), TransactionKind::Income, 5.0, date(2025, 4, 1))
            .with_category("Interest");
        let mut deleted = Transaction::new(checking.id.clone(), TransactionKind::Expense, 1.0, date(2025, 3, 5))
            .with_category("Food");
        deleted.meta.mark_deleted();

        store
            .bulk_upsert(vec![late.clone(), early.clone(), other.clone(), deleted])
            .unwrap();

        let for_checking: Vec<_> = store
            .transactions_for_account(&checking.id)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(for_checking, vec![early.id.clone(), late.id.clone()]);

        let march = store
            .transactions_between(date(2025, 3, 1), date(2025, 3, 31))
            .unwrap();
        assert_eq!(march.len(), 2);

        assert_eq!(store.transactions_in_category("Food").unwrap().len(), 1);
        assert!(store
            .transactions_between(date(2025, 5, 1), date(2025, 4, 1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_accounts_of_kind_tracks_updates() {
        let (_temp, store) = open();
        let account = Account::new("Wallet", AccountKind::Cash, "USD");
        let id = account.id.clone();
        store.add(account).unwrap();
        assert_eq!(store.accounts_of_kind(AccountKind::Cash).unwrap().len(), 1);

        store
            .update(&id, |a: &mut Account| a.kind = AccountKind::Savings)
            .unwrap();
        assert!(store.accounts_of_kind(AccountKind::Cash).unwrap().is_empty());
        assert_eq!(store.accounts_of_kind(AccountKind::Savings).unwrap().len(), 1);
    }

    #[test]
    fn test_due_queries_respect_status() {
        let (_temp, store) = open();

        let due = Subscription::new("Music", 9.99, "USD", date(2025, 1, 5));
        let mut paused = Subscription::new("Gym", 30.0, "USD", date(2025, 1, 3));
        paused.status = SubscriptionStatus::Paused;
        let later = Subscription::new("News", 5.0, "USD", date(2025, 2, 1));
        store.bulk_upsert(vec![due.clone(), paused, later]).unwrap();

        let hits = store.subscriptions_due_by(date(2025, 1, 31)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, due.id);

        let account = AccountId::new();
        let rule = RecurringRule::new("Rent", account.clone(), TransactionKind::Expense, 1200.0, date(2025, 1, 1));
        let mut stopped = RecurringRule::new("Old rent", account.clone(), TransactionKind::Expense, 900.0, date(2024, 1, 1));
        stopped.active = false;
        store.bulk_upsert(vec![rule.clone(), stopped]).unwrap();

        let rules = store.rules_due_by(date(2025, 1, 1)).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, rule.id);
        assert_eq!(store.rules_for_account(&account).unwrap().len(), 2);
    }

    #[test]
    fn test_status_and_currency_lookups() {
        let (_temp, store) = open();

        let mut loan = Loan::new("Car", 100.0, date(2024, 1, 1));
        loan.due_date = Some(date(2026, 1, 1));
        store.add(loan.clone()).unwrap();
        assert_eq!(store.loans_with_status(LoanStatus::Active).unwrap().len(), 1);
        assert!(store.loans_due_by(date(2025, 12, 31)).unwrap().is_empty());
        assert_eq!(store.loans_due_by(date(2026, 1, 1)).unwrap().len(), 1);

        store
            .add(CreditCard::new("Travel", "EUR", Money::from_minor_units(500_000)))
            .unwrap();
        assert_eq!(store.cards_in_currency("EUR").unwrap().len(), 1);
        assert!(store.cards_in_currency("USD").unwrap().is_empty());

        let goal = FinancialGoal::new("Emergency fund", 5000.0);
        store.add(goal).unwrap();
        assert_eq!(store.goals_with_status(GoalStatus::Active).unwrap().len(), 1);
    }
}
