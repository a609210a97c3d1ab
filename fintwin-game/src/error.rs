//! Error taxonomy for catalog loading and session operations.
use thiserror::Error;

use crate::careers::CareerArchetype;
use crate::config::ConfigError;
use crate::session::LifecycleState;

/// Errors raised by session operations.
///
/// Arithmetic edge cases (zero income, debt pushed below zero) are game
/// states and are clamped inline; they never surface here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("unknown career archetype '{0}'")]
    InvalidArchetype(String),
    #[error("decision '{decision_id}' is not offered by scenario '{scenario_id}'")]
    InvalidDecision {
        decision_id: String,
        scenario_id: String,
    },
    #[error("session is concluded")]
    SessionClosed,
    #[error("{operation} is not allowed while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },
    #[error("player name must be between 1 and {max} visible characters")]
    InvalidPlayerName { max: usize },
}

/// Errors raised while loading or validating the static catalogs.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("JSON parsing error in {source_name}: {error}")]
    Parse {
        source_name: &'static str,
        #[source]
        error: serde_json::Error,
    },
    #[error("failed to read {source_name} catalog: {error}")]
    Io {
        source_name: &'static str,
        #[source]
        error: std::io::Error,
    },
    #[error("career catalog has no entry for {0}")]
    MissingArchetype(CareerArchetype),
    #[error("career catalog lists {0} more than once")]
    DuplicateArchetype(CareerArchetype),
    #[error("{0} has no scenarios")]
    NoScenarios(CareerArchetype),
    #[error("{archetype} baseline has a negative {field}")]
    NegativeBaseline {
        archetype: CareerArchetype,
        field: &'static str,
    },
    #[error("scenario '{scenario_id}' offers {count} options (at least {min} required)")]
    TooFewOptions {
        scenario_id: String,
        count: usize,
        min: usize,
    },
    #[error("scenario '{scenario_id}' repeats option '{decision_id}'")]
    DuplicateOption {
        scenario_id: String,
        decision_id: String,
    },
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },
    #[error("event '{id}' probability {probability} is outside (0, 1]")]
    EventProbability { id: String, probability: f64 },
    #[error("event probabilities sum to {total:.4}, which exceeds 1")]
    EventProbabilitySum { total: f64 },
    #[error("achievement '{id}' has an invalid rule: {reason}")]
    InvalidRule { id: String, reason: String },
    #[error("decision '{decision_id}' hints at unknown achievement '{achievement_id}'")]
    UnknownAchievementHint {
        decision_id: String,
        achievement_id: String,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
