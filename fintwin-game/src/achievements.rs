//! Achievement definitions and their idempotent evaluation.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;

use crate::error::CatalogError;
use crate::finance::FinancialState;

pub(crate) const DEFAULT_ACHIEVEMENTS_DATA: &str = include_str!("../assets/data/achievements.json");

/// Predicate deciding when an achievement unlocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AchievementRule {
    PositiveCashFlow,
    /// Positive cash flow at least `margin` above the starting cash flow.
    CashFlowAboveStart { margin: f64 },
    SavingsRatioAbove { threshold: f64 },
    /// Savings ratio above `threshold` and at least `gain` above the start.
    SavingsRatioRise { threshold: f64, gain: f64 },
    DebtToIncomeBelow { threshold: f64 },
    SavingsAbove { amount: f64 },
    DebtFree,
    /// Debt down by at least `fraction` of the session's starting debt.
    DebtReducedBy { fraction: f64 },
    NetWorthAbove { amount: f64 },
    /// Never true on its own; unlocked by a decision naming it as a hint.
    Milestone,
}

impl AchievementRule {
    #[must_use]
    pub fn is_met(&self, state: &FinancialState, initial: &FinancialState) -> bool {
        match *self {
            Self::PositiveCashFlow => state.monthly_net_cash_flow() > 0.0,
            Self::CashFlowAboveStart { margin } => {
                let cash_flow = state.monthly_net_cash_flow();
                cash_flow > 0.0 && cash_flow >= initial.monthly_net_cash_flow() + margin
            }
            Self::SavingsRatioAbove { threshold } => state.savings_ratio() > threshold,
            Self::SavingsRatioRise { threshold, gain } => {
                let ratio = state.savings_ratio();
                ratio > threshold && ratio >= initial.savings_ratio() + gain
            }
            Self::DebtToIncomeBelow { threshold } => state.debt_to_income_ratio() < threshold,
            Self::SavingsAbove { amount } => state.savings > amount,
            Self::DebtFree => state.debt <= 0.0,
            Self::DebtReducedBy { fraction } => {
                initial.debt > 0.0 && state.debt <= initial.debt * (1.0 - fraction)
            }
            Self::NetWorthAbove { amount } => state.net_worth() > amount,
            Self::Milestone => false,
        }
    }

    fn validate(&self) -> Result<(), String> {
        match *self {
            Self::SavingsRatioAbove { threshold } if !threshold.is_finite() => {
                Err(format!("savings ratio threshold {threshold} is not finite"))
            }
            Self::CashFlowAboveStart { margin } if !(margin.is_finite() && margin > 0.0) => {
                Err(format!("cash flow margin {margin} must be positive"))
            }
            Self::SavingsRatioRise { threshold, gain }
                if !(threshold.is_finite() && gain.is_finite() && gain > 0.0) =>
            {
                Err(format!(
                    "savings ratio rise needs a finite threshold and a positive gain (got {threshold}, {gain})"
                ))
            }
            Self::DebtToIncomeBelow { threshold } if !(threshold.is_finite() && threshold > 0.0) => {
                Err(format!("debt-to-income threshold {threshold} must be positive"))
            }
            Self::SavingsAbove { amount } | Self::NetWorthAbove { amount } if !amount.is_finite() => {
                Err(format!("amount {amount} is not finite"))
            }
            Self::DebtReducedBy { fraction } if !(fraction > 0.0 && fraction <= 1.0) => {
                Err(format!("fraction {fraction} is outside (0, 1]"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rule: AchievementRule,
    #[serde(default)]
    pub xp_bonus: u32,
}

/// Achievements unlocked by one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Evaluation {
    /// Ids in registry declaration order.
    pub newly_unlocked: SmallVec<[String; 4]>,
    pub xp_bonus: u32,
}

impl Evaluation {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.newly_unlocked.is_empty()
    }
}

/// Ordered set of achievements, loaded once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AchievementRegistry {
    #[serde(default)]
    achievements: Vec<Achievement>,
}

impl AchievementRegistry {
    /// # Errors
    ///
    /// Returns an error if the embedded registry fails validation.
    pub fn load_default() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_ACHIEVEMENTS_DATA)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, an id repeats or a rule has
    /// an unusable parameter.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let registry: Self = serde_json::from_str(json).map_err(|error| CatalogError::Parse {
            source_name: "achievements",
            error,
        })?;
        registry.validate()?;
        Ok(registry)
    }

    /// # Errors
    ///
    /// Returns an error under the same rules as [`AchievementRegistry::from_json`].
    pub fn from_achievements(achievements: Vec<Achievement>) -> Result<Self, CatalogError> {
        let registry = Self { achievements };
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut ids = HashSet::new();
        for achievement in &self.achievements {
            if !ids.insert(achievement.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    kind: "achievement",
                    id: achievement.id.clone(),
                });
            }
            achievement
                .rule
                .validate()
                .map_err(|reason| CatalogError::InvalidRule {
                    id: achievement.id.clone(),
                    reason,
                })?;
        }
        Ok(())
    }

    #[must_use]
    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.achievements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.achievements.is_empty()
    }

    /// Evaluate every achievement not yet in `already_unlocked`.
    #[must_use]
    pub fn evaluate<S: AsRef<str>>(
        &self,
        state: &FinancialState,
        initial: &FinancialState,
        already_unlocked: &[S],
    ) -> Evaluation {
        self.evaluate_with_hints::<S, &str>(state, initial, already_unlocked, &[])
    }

    /// Like [`AchievementRegistry::evaluate`], also unlocking any achievement
    /// named in `hints` regardless of its rule.
    #[must_use]
    pub fn evaluate_with_hints<S: AsRef<str>, H: AsRef<str>>(
        &self,
        state: &FinancialState,
        initial: &FinancialState,
        already_unlocked: &[S],
        hints: &[H],
    ) -> Evaluation {
        let mut evaluation = Evaluation::default();
        for achievement in &self.achievements {
            let id = achievement.id.as_str();
            if already_unlocked.iter().any(|u| u.as_ref() == id) {
                continue;
            }
            let hinted = hints.iter().any(|h| h.as_ref() == id);
            if hinted || achievement.rule.is_met(state, initial) {
                log::debug!("achievement '{id}' unlocked");
                evaluation.newly_unlocked.push(achievement.id.clone());
                evaluation.xp_bonus = evaluation.xp_bonus.saturating_add(achievement.xp_bonus);
            }
        }
        evaluation
    }
}
