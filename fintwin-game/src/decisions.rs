//! Resolution of an explicit decision against the offered scenario.
use serde::Serialize;

use crate::data::{Decision, Scenario};
use crate::error::EngineError;
use crate::finance::{FinancialDelta, FinancialState};

/// Outcome of applying one decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub state: FinancialState,
    /// Clamped change actually applied.
    pub delta: FinancialDelta,
    pub xp_grant: u32,
    pub message_key: String,
    pub achievement_hint: Option<String>,
}

/// Maps a decision id onto its fixed effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionResolver;

impl DecisionResolver {
    /// Resolve `decision_id` against the options `scenario` offers.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidDecision` when the id is not one of the
    /// scenario's options; ids are matched exactly.
    pub fn resolve(
        &self,
        state: &FinancialState,
        scenario: &Scenario,
        decision_id: &str,
    ) -> Result<Resolution, EngineError> {
        let decision = Self::lookup(scenario, decision_id)?;
        let next = decision.effects.apply(state);
        Ok(Resolution {
            state: next,
            delta: next.delta_from(state),
            xp_grant: decision.xp_grant,
            message_key: decision.message_key.clone(),
            achievement_hint: decision.achievement_hint.clone(),
        })
    }

    fn lookup<'a>(scenario: &'a Scenario, decision_id: &str) -> Result<&'a Decision, EngineError> {
        scenario
            .option(decision_id)
            .ok_or_else(|| EngineError::InvalidDecision {
                decision_id: decision_id.to_string(),
                scenario_id: scenario.id.clone(),
            })
    }
}
