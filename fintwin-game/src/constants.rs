//! Centralized balance and tuning constants for the Financial Twin engine.
//!
//! The JSON catalogs carry content; the numbers that shape every session
//! live here.

// Narrative keys -----------------------------------------------------------
pub const KEY_WELCOME_PREFIX: &str = "welcome.";
pub const KEY_SESSION_CONCLUDED: &str = "session.concluded";

// RNG domain tags ----------------------------------------------------------
pub(crate) const RNG_DOMAIN_SCENARIO: &[u8] = b"scenario";
pub(crate) const RNG_DOMAIN_EVENT: &[u8] = b"event";

// Event tuning -------------------------------------------------------------
/// Chance that any event is considered on a turn.
pub const DEFAULT_EVENT_TRIGGER_PROBABILITY: f64 = 0.2;
/// Tolerance applied when checking that event probabilities sum to at most one.
pub(crate) const PROBABILITY_SUM_TOLERANCE: f64 = 1e-9;
pub(crate) const EVENT_POOL_ID: &str = "fintwin.events";

// Progression tuning -------------------------------------------------------
pub const DEFAULT_XP_PER_LEVEL: u32 = 100;
pub const DEFAULT_COMPLETION_BONUS_XP: u32 = 100;
pub const MIN_LEVEL: u32 = 1;

// Finance ------------------------------------------------------------------
pub const MONTHS_PER_YEAR: f64 = 12.0;

// Catalog rules ------------------------------------------------------------
pub const MIN_SCENARIO_OPTIONS: usize = 2;
pub(crate) const MAX_PLAYER_NAME_LEN: usize = 64;

#[cfg(test)]
pub(crate) const FLOAT_EPSILON: f64 = 1e-9;
