//! Engine tuning loaded from JSON with per-field defaults.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_COMPLETION_BONUS_XP, DEFAULT_EVENT_TRIGGER_PROBABILITY};
use crate::progression::LevelCurve;

/// Construction-time parameters shared by every session of an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Chance that a turn rolls for an event at all.
    #[serde(default = "EngineConfig::default_event_trigger_probability")]
    pub event_trigger_probability: f64,
    #[serde(default)]
    pub level_curve: LevelCurve,
    /// XP granted once when a session concludes.
    #[serde(default = "EngineConfig::default_completion_bonus_xp")]
    pub completion_bonus_xp: u32,
    /// Skip the scenario just played when the career offers more than one.
    #[serde(default = "EngineConfig::default_avoid_immediate_repeat")]
    pub avoid_immediate_repeat: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_trigger_probability: Self::default_event_trigger_probability(),
            level_curve: LevelCurve::default(),
            completion_bonus_xp: Self::default_completion_bonus_xp(),
            avoid_immediate_repeat: Self::default_avoid_immediate_repeat(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub const fn default_event_trigger_probability() -> f64 {
        DEFAULT_EVENT_TRIGGER_PROBABILITY
    }

    #[must_use]
    pub const fn default_completion_bonus_xp() -> u32 {
        DEFAULT_COMPLETION_BONUS_XP
    }

    #[must_use]
    pub const fn default_avoid_immediate_repeat() -> bool {
        true
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.event_trigger_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::RangeViolation {
                field: "event_trigger_probability",
                min: 0.0,
                max: 1.0,
                value: p,
            });
        }
        self.level_curve.validate()
    }
}

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("{field} must be between {min:.2} and {max:.2} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("linear level curve needs a positive xp_per_level")]
    ZeroXpPerLevel,
    #[error("level threshold table is empty")]
    EmptyThresholds,
    #[error("level threshold {value} at index {index} is not above the previous entry")]
    UnsortedThresholds { index: usize, value: u32 },
}
