//! Per-turn output handed to the narrator, plus the compact history record.
use serde::Serialize;
use smallvec::SmallVec;

use super::LifecycleState;
use crate::careers::CareerArchetype;
use crate::data::Scenario;
use crate::events::FiredEvent;
use crate::finance::{FinancialDelta, FinancialMetrics, FinancialState};
use crate::progression::ProgressionState;
use crate::trace::EventDecisionTrace;

/// Returned by `welcome`: the starting position for the chosen career.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Welcome {
    pub narrative_key: String,
    pub player_name: String,
    pub archetype: CareerArchetype,
    pub career_name: String,
    pub career_description: String,
    pub financial_state: FinancialState,
    pub metrics: FinancialMetrics,
    pub progression: ProgressionState,
}

/// Everything that changed during one resolved turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnResult {
    /// 1-based number of the turn just played.
    pub turn_index: u32,
    pub scenario_id: String,
    pub narrative_key: String,
    pub decision_id: String,
    pub decision_message_key: String,
    pub financial_state: FinancialState,
    pub metrics: FinancialMetrics,
    /// Net change over the whole turn (decision plus event).
    pub delta: FinancialDelta,
    pub progression: ProgressionState,
    /// Decision grant, achievement bonuses and any completion bonus.
    pub xp_gained: u32,
    pub newly_unlocked_achievements: SmallVec<[String; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fired_event: Option<FiredEvent>,
    pub event_trace: EventDecisionTrace,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_scenario: Option<Scenario>,
    pub lifecycle: LifecycleState,
}

/// Compact record kept in the session history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnRecord {
    pub turn_index: u32,
    pub scenario_id: String,
    pub decision_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub xp_gained: u32,
    pub newly_unlocked: SmallVec<[String; 4]>,
    pub financial_state: FinancialState,
}

impl From<&TurnResult> for TurnRecord {
    fn from(result: &TurnResult) -> Self {
        Self {
            turn_index: result.turn_index,
            scenario_id: result.scenario_id.clone(),
            decision_id: result.decision_id.clone(),
            event_id: result.fired_event.as_ref().map(|event| event.id.clone()),
            xp_gained: result.xp_gained,
            newly_unlocked: result.newly_unlocked_achievements.clone(),
            financial_state: result.financial_state,
        }
    }
}
