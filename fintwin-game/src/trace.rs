//! Explainability telemetry for the per-turn event roll.
use serde::{Deserialize, Serialize};

/// Record of one event roll.
///
/// Populated by the event resolver so a replay can show which roll landed on
/// which candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDecisionTrace {
    /// Identifier for the selection pool (e.g., `fintwin.events`).
    pub pool_id: String,
    /// Draw compared against the trigger probability.
    pub trigger_roll: f64,
    pub trigger_threshold: f64,
    /// Draw used to select from the catalog, if the trigger passed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_roll: Option<f64>,
    /// Catalog entries in selection order, each with the upper edge of its
    /// interval.
    #[serde(default)]
    pub candidates: Vec<WeightedCandidate>,
    /// Identifier of the selected candidate; `None` when nothing fired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_id: Option<String>,
}

impl EventDecisionTrace {
    #[must_use]
    pub fn fired(&self) -> bool {
        self.chosen_id.is_some()
    }
}

/// One catalog entry as seen by the selection roll.
///
/// The entry covers `[cumulative - weight, cumulative)` of the unit interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedCandidate {
    pub id: String,
    pub weight: f64,
    pub cumulative: f64,
}
