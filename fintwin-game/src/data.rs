use serde::{Deserialize, Serialize};

use crate::finance::{FinancialDelta, FinancialState};

/// Effects applied when a decision is chosen or an event fires.
///
/// The additive fields are plain currency deltas. `income_change_pct` and
/// `debt_payment` depend on the state they are applied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Effects {
    #[serde(default)]
    pub income: f64,
    #[serde(default)]
    pub expenses: f64,
    #[serde(default)]
    pub savings: f64,
    #[serde(default)]
    pub debt: f64,
    /// Fractional change of current income, e.g. `-0.25` for a 25% cut.
    #[serde(default)]
    pub income_change_pct: f64,
    /// Pay down up to this much debt out of savings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_payment: Option<f64>,
}

impl Effects {
    /// Resolve the effect against `state`, producing the raw (unclamped) delta.
    #[must_use]
    pub fn delta(&self, state: &FinancialState) -> FinancialDelta {
        let mut delta = FinancialDelta::new(self.income, self.expenses, self.savings, self.debt);
        if self.income_change_pct != 0.0 {
            delta.income += state.income.max(0.0) * self.income_change_pct;
        }
        if let Some(cap) = self.debt_payment {
            let payment = cap.max(0.0).min(state.debt.max(0.0));
            delta.debt -= payment;
            delta.savings -= payment;
        }
        delta
    }

    /// Resolve and apply in one step, with the usual clamping.
    #[must_use]
    pub fn apply(&self, state: &FinancialState) -> FinancialState {
        state.apply(&self.delta(state))
    }
}

/// A selectable option within a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effects: Effects,
    pub xp_grant: u32,
    /// Achievement id this decision unlocks directly, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievement_hint: Option<String>,
    pub message_key: String,
}

/// One turn's prompt plus the decisions offered for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub narrative_key: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<Decision>,
}

impl Scenario {
    #[must_use]
    pub fn option(&self, decision_id: &str) -> Option<&Decision> {
        self.options.iter().find(|option| option.id == decision_id)
    }

    pub fn option_ids(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|option| option.id.as_str())
    }
}
