//! XP accumulation, level curves and the unlocked-achievement set.
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::constants::{DEFAULT_XP_PER_LEVEL, MIN_LEVEL};
use crate::numbers::{floor_f64_to_u32, saturating_usize_to_u32};

/// Monotonic mapping from total XP to level.
///
/// Chosen once per engine and fixed for the life of every session it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LevelCurve {
    /// `floor(xp / xp_per_level) + 1`.
    Linear { xp_per_level: u32 },
    /// `floor(sqrt(xp) / 2) + 1`.
    SquareRoot,
    /// `xp[i]` is the total needed to reach level `i + 2`.
    Thresholds { xp: Vec<u32> },
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self::Linear {
            xp_per_level: DEFAULT_XP_PER_LEVEL,
        }
    }
}

impl LevelCurve {
    /// # Errors
    ///
    /// Returns `ConfigError` for a zero linear step or a threshold table that
    /// is empty or not strictly increasing from above zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Linear { xp_per_level: 0 } => Err(ConfigError::ZeroXpPerLevel),
            Self::Linear { .. } | Self::SquareRoot => Ok(()),
            Self::Thresholds { xp } => {
                if xp.is_empty() {
                    return Err(ConfigError::EmptyThresholds);
                }
                let mut previous = 0;
                for (index, &value) in xp.iter().enumerate() {
                    if value <= previous {
                        return Err(ConfigError::UnsortedThresholds { index, value });
                    }
                    previous = value;
                }
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn level_for(&self, xp: u32) -> u32 {
        match self {
            Self::Linear { xp_per_level } => {
                if *xp_per_level == 0 {
                    return MIN_LEVEL;
                }
                (xp / xp_per_level).saturating_add(MIN_LEVEL)
            }
            Self::SquareRoot => {
                floor_f64_to_u32(f64::from(xp).sqrt() / 2.0).saturating_add(MIN_LEVEL)
            }
            Self::Thresholds { xp: table } => {
                let reached = table.iter().take_while(|&&needed| needed <= xp).count();
                saturating_usize_to_u32(reached).saturating_add(MIN_LEVEL)
            }
        }
    }

    /// Total XP at which `level` begins.
    #[must_use]
    pub fn xp_for_level(&self, level: u32) -> Option<u32> {
        let steps = level.checked_sub(MIN_LEVEL)?;
        if steps == 0 {
            return Some(0);
        }
        match self {
            Self::Linear { xp_per_level } => steps.checked_mul(*xp_per_level),
            Self::SquareRoot => steps.checked_mul(steps)?.checked_mul(4),
            Self::Thresholds { xp } => xp.get(usize::try_from(steps - 1).ok()?).copied(),
        }
    }

    /// Total XP needed to leave `level`, or `None` at the top of a table.
    #[must_use]
    pub fn xp_for_next_level(&self, level: u32) -> Option<u32> {
        self.xp_for_level(level.max(MIN_LEVEL).checked_add(1)?)
    }

    /// Fraction of the way from the current level to the next, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self, xp: u32) -> f64 {
        let level = self.level_for(xp);
        let Some(start) = self.xp_for_level(level) else {
            return 1.0;
        };
        let Some(end) = self.xp_for_next_level(level) else {
            return 1.0;
        };
        if end <= start {
            return 1.0;
        }
        (f64::from(xp.saturating_sub(start)) / f64::from(end - start)).clamp(0.0, 1.0)
    }
}

/// XP, level and unlocked achievements for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    pub xp: u32,
    pub level: u32,
    /// Achievement ids in unlock order; never contains duplicates.
    #[serde(default)]
    pub unlocked: Vec<String>,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            xp: 0,
            level: MIN_LEVEL,
            unlocked: Vec::new(),
        }
    }
}

impl ProgressionState {
    #[must_use]
    pub fn has_unlocked(&self, achievement_id: &str) -> bool {
        self.unlocked.iter().any(|id| id == achievement_id)
    }
}

/// Applies XP and unlocks under a fixed level curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionTracker {
    curve: LevelCurve,
}

impl ProgressionTracker {
    #[must_use]
    pub const fn new(curve: LevelCurve) -> Self {
        Self { curve }
    }

    #[must_use]
    pub const fn curve(&self) -> &LevelCurve {
        &self.curve
    }

    /// Produce the next progression state.
    ///
    /// XP only grows, the level never drops and previously unlocked ids are
    /// kept; ids already present are not added twice.
    #[must_use]
    pub fn advance<S: AsRef<str>>(
        &self,
        progression: &ProgressionState,
        xp_delta: u32,
        newly_unlocked: &[S],
    ) -> ProgressionState {
        let xp = progression.xp.saturating_add(xp_delta);
        let level = self.curve.level_for(xp).max(progression.level);
        let mut unlocked = progression.unlocked.clone();
        for id in newly_unlocked {
            let id = id.as_ref();
            if !unlocked.iter().any(|existing| existing == id) {
                unlocked.push(id.to_string());
            }
        }
        ProgressionState {
            xp,
            level,
            unlocked,
        }
    }
}
