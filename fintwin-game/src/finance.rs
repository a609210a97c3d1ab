//! Player finances: the four tracked fields plus derived metrics.
use serde::{Deserialize, Serialize};
use std::ops::Add;

use crate::constants::MONTHS_PER_YEAR;

/// Monthly income and expenses plus the savings and debt balances.
///
/// `income` and `debt` are never negative once an effect has been applied;
/// `savings` and `expenses` are free to go below zero (an overdraft is a
/// legitimate game state).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FinancialState {
    #[serde(default)]
    pub income: f64,
    #[serde(default)]
    pub expenses: f64,
    #[serde(default)]
    pub savings: f64,
    #[serde(default)]
    pub debt: f64,
}

/// Signed change to each financial field produced by an effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FinancialDelta {
    #[serde(default)]
    pub income: f64,
    #[serde(default)]
    pub expenses: f64,
    #[serde(default)]
    pub savings: f64,
    #[serde(default)]
    pub debt: f64,
}

/// Read-only metrics recomputed from a [`FinancialState`] on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinancialMetrics {
    pub monthly_net_cash_flow: f64,
    /// `+inf` when there is no income; serialized as `null` in that case.
    pub debt_to_income_ratio: f64,
    pub savings_ratio: f64,
    pub net_worth: f64,
}

impl FinancialState {
    #[must_use]
    pub const fn new(income: f64, expenses: f64, savings: f64, debt: f64) -> Self {
        Self {
            income,
            expenses,
            savings,
            debt,
        }
    }

    #[must_use]
    pub fn monthly_net_cash_flow(&self) -> f64 {
        self.income - self.expenses
    }

    /// Debt relative to a year of income, or `+inf` without income.
    #[must_use]
    pub fn debt_to_income_ratio(&self) -> f64 {
        if self.income > 0.0 {
            self.debt / (self.income * MONTHS_PER_YEAR)
        } else {
            f64::INFINITY
        }
    }

    /// Savings measured in months of income, or `0` without income.
    #[must_use]
    pub fn savings_ratio(&self) -> f64 {
        if self.income > 0.0 {
            self.savings / self.income
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn net_worth(&self) -> f64 {
        self.savings - self.debt
    }

    #[must_use]
    pub fn metrics(&self) -> FinancialMetrics {
        FinancialMetrics {
            monthly_net_cash_flow: self.monthly_net_cash_flow(),
            debt_to_income_ratio: self.debt_to_income_ratio(),
            savings_ratio: self.savings_ratio(),
            net_worth: self.net_worth(),
        }
    }

    /// Apply a delta, clamping income and debt at zero.
    #[must_use]
    pub fn apply(&self, delta: &FinancialDelta) -> Self {
        Self {
            income: self.income + delta.income,
            expenses: self.expenses + delta.expenses,
            savings: self.savings + delta.savings,
            debt: self.debt + delta.debt,
        }
        .clamped()
    }

    /// Restore the non-negativity invariants on income and debt.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            income: clamp_non_negative(self.income),
            debt: clamp_non_negative(self.debt),
            ..self
        }
    }

    /// Field-wise difference `self - before`.
    #[must_use]
    pub fn delta_from(&self, before: &Self) -> FinancialDelta {
        FinancialDelta {
            income: self.income - before.income,
            expenses: self.expenses - before.expenses,
            savings: self.savings - before.savings,
            debt: self.debt - before.debt,
        }
    }
}

// `-0.0` and NaN both normalize to a plain zero.
fn clamp_non_negative(value: f64) -> f64 {
    if value > 0.0 { value } else { 0.0 }
}

impl FinancialDelta {
    #[must_use]
    pub const fn new(income: f64, expenses: f64, savings: f64, debt: f64) -> Self {
        Self {
            income,
            expenses,
            savings,
            debt,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.income == 0.0 && self.expenses == 0.0 && self.savings == 0.0 && self.debt == 0.0
    }
}

impl Add for FinancialDelta {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            income: self.income + rhs.income,
            expenses: self.expenses + rhs.expenses,
            savings: self.savings + rhs.savings,
            debt: self.debt + rhs.debt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FLOAT_EPSILON;

    fn student() -> FinancialState {
        FinancialState::new(1200.0, 1000.0, 500.0, 20_000.0)
    }

    #[test]
    fn metrics_follow_definitions() {
        let metrics = student().metrics();
        assert!((metrics.monthly_net_cash_flow - 200.0).abs() < FLOAT_EPSILON);
        assert!((metrics.debt_to_income_ratio - 20_000.0 / 14_400.0).abs() < FLOAT_EPSILON);
        assert!((metrics.savings_ratio - 500.0 / 1200.0).abs() < FLOAT_EPSILON);
        assert!((metrics.net_worth + 19_500.0).abs() < FLOAT_EPSILON);
    }

    #[test]
    fn zero_income_guards_ratios() {
        let state = FinancialState::new(0.0, 300.0, 100.0, 50.0);
        assert!(state.debt_to_income_ratio().is_infinite());
        assert!(state.savings_ratio().abs() < FLOAT_EPSILON);
    }

    #[test]
    fn apply_clamps_debt_and_income_but_not_savings() {
        let delta = FinancialDelta::new(-5_000.0, -1_500.0, -900.0, -20_500.0);
        let next = student().apply(&delta);
        assert!(next.income.abs() < FLOAT_EPSILON);
        assert!(next.debt.abs() < FLOAT_EPSILON);
        assert!((next.savings + 400.0).abs() < FLOAT_EPSILON);
        assert!((next.expenses + 500.0).abs() < FLOAT_EPSILON);
    }

    #[test]
    fn delta_from_reports_signed_changes() {
        let before = student();
        let after = before.apply(&FinancialDelta::new(10.0, 0.0, -20.0, 0.0));
        let delta = after.delta_from(&before);
        assert_eq!(delta, FinancialDelta::new(10.0, 0.0, -20.0, 0.0));
        assert!(!delta.is_zero());
        assert!(FinancialDelta::default().is_zero());
    }

    #[test]
    fn deltas_add_fieldwise() {
        let sum = FinancialDelta::new(1.0, 2.0, 3.0, 4.0) + FinancialDelta::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(sum, FinancialDelta::new(2.0, 3.0, 4.0, 5.0));
    }
}
