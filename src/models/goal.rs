//! Financial goal model
//!
//! Savings targets such as an emergency fund or a down payment.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, GoalId};
use super::record::{ensure_finite, index, Record, RecordMeta, TableName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Abandoned,
}

impl GoalStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialGoal {
    pub id: GoalId,

    pub name: String,

    pub target_amount: f64,

    #[serde(default)]
    pub current_amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,

    #[serde(default)]
    pub status: GoalStatus,

    /// Account the savings are held in, if tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,

    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl FinancialGoal {
    pub fn new(name: impl Into<String>, target_amount: f64) -> Self {
        Self {
            id: GoalId::new(),
            name: name.into(),
            target_amount,
            current_amount: 0.0,
            target_date: None,
            status: GoalStatus::Active,
            account_id: None,
            meta: RecordMeta::new(),
        }
    }

    /// Fraction of the target reached, clamped to `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 1.0;
        }
        (self.current_amount / self.target_amount).clamp(0.0, 1.0)
    }

    /// Add to the saved amount, completing the goal once the target is met
    pub fn contribute(&mut self, amount: f64) {
        self.current_amount += amount;
        if self.status == GoalStatus::Active && self.current_amount >= self.target_amount {
            self.status = GoalStatus::Completed;
        }
    }
}

impl Record for FinancialGoal {
    type Id = GoalId;

    const TABLE: TableName = TableName::Goals;

    fn id(&self) -> &GoalId {
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
        if let Some(target) = self.target_date {
            entries.push((index::TARGET_DATE, target.to_string()));
        }
        entries
    }

    fn check(&self) -> Result<(), String> {
        ensure_finite("target amount", self.target_amount)?;
        ensure_finite("current amount", self.current_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contribute_completes_goal() {
        let mut goal = FinancialGoal::new("Emergency fund", 1000.0);
        goal.contribute(600.0);
        assert_eq!(goal.status, GoalStatus::Active);
        assert!((goal.progress() - 0.6).abs() < 1e-9);

        goal.contribute(500.0);
        assert_eq!(goal.status, GoalStatus::Completed);
        assert_eq!(goal.progress(), 1.0);
    }

    #[test]
    fn test_non_finite_amounts_rejected() {
        assert!(FinancialGoal::new("Car", f64::INFINITY).validate().is_err());

        let mut goal = FinancialGoal::new("Car", 5000.0);
        goal.current_amount = f64::NAN;
        assert!(goal.validate().is_err());
    }

    #[test]
    fn test_abandoned_goal_stays_abandoned() {
        let mut goal = FinancialGoal::new("Boat", 10.0);
        goal.status = GoalStatus::Abandoned;
        goal.contribute(20.0);
        assert_eq!(goal.status, GoalStatus::Abandoned);
    }
}
