//! Session lifecycle and the turn loop.
//!
//! A [`TurnEngine`] owns the shared catalogs and configuration; each
//! [`Session`] it creates is an independent state machine:
//!
//! ```text
//! Created --welcome--> Initialized --start_turn--> InProgress --submit(continue=false)/conclude--> Concluded
//! ```
//!
//! Every mutating call computes its full result first and only then swaps it
//! into the session, so a rejected call leaves the session untouched.
mod turn;

pub use turn::{TurnRecord, TurnResult, Welcome};

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::careers::{CareerArchetype, CareerProfile};
use crate::catalog::GameData;
use crate::config::{ConfigError, EngineConfig};
use crate::constants::{KEY_SESSION_CONCLUDED, KEY_WELCOME_PREFIX, MAX_PLAYER_NAME_LEN};
use crate::data::Scenario;
use crate::decisions::DecisionResolver;
use crate::error::{CatalogError, EngineError};
use crate::events::resolve_event;
use crate::finance::{FinancialMetrics, FinancialState};
use crate::numbers::saturating_usize_to_u32;
use crate::progression::{ProgressionState, ProgressionTracker};
use crate::result::SessionSummary;
use crate::rng::RngBundle;
use crate::seed::share_code_for;

/// Where a session is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Created,
    Initialized,
    InProgress,
    Concluded,
}

impl LifecycleState {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Initialized => "initialized",
            Self::InProgress => "in_progress",
            Self::Concluded => "concluded",
        }
    }

    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Initialized | Self::InProgress)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Shared catalogs plus configuration; creates sessions.
#[derive(Debug, Clone)]
pub struct TurnEngine {
    data: Arc<GameData>,
    config: EngineConfig,
    tracker: ProgressionTracker,
}

impl TurnEngine {
    /// # Errors
    ///
    /// Returns `ConfigError` if `config` fails validation.
    pub fn new(data: Arc<GameData>, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let tracker = ProgressionTracker::new(config.level_curve.clone());
        Ok(Self {
            data,
            config,
            tracker,
        })
    }

    /// Engine over the embedded catalogs with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalogs fail validation.
    pub fn with_defaults() -> Result<Self, CatalogError> {
        Ok(Self::new(GameData::shared_default()?, EngineConfig::default())?)
    }

    #[must_use]
    pub fn data(&self) -> &GameData {
        &self.data
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn tracker(&self) -> &ProgressionTracker {
        &self.tracker
    }

    #[must_use]
    pub fn create_session(&self, seed: u64) -> Session {
        log::debug!("session created with seed {seed}");
        Session {
            engine: self.clone(),
            lifecycle: LifecycleState::Created,
            player_name: None,
            archetype: None,
            financial: FinancialState::default(),
            initial_financial: FinancialState::default(),
            progression: ProgressionState::default(),
            turns_played: 0,
            offered: None,
            last_scenario: None,
            last_decision_id: None,
            history: Vec::new(),
            rng: RngBundle::from_user_seed(seed),
            pending_summary: None,
        }
    }
}

/// One player's run through the game.
#[derive(Debug, Clone)]
pub struct Session {
    engine: TurnEngine,
    lifecycle: LifecycleState,
    player_name: Option<String>,
    archetype: Option<CareerArchetype>,
    financial: FinancialState,
    initial_financial: FinancialState,
    progression: ProgressionState,
    turns_played: u32,
    /// Index into the archetype's scenario list.
    offered: Option<usize>,
    last_scenario: Option<usize>,
    last_decision_id: Option<String>,
    history: Vec<TurnRecord>,
    rng: RngBundle,
    /// Summary built by `submit_decision(.., false)`, handed out by `conclude`.
    pending_summary: Option<SessionSummary>,
}

impl Session {
    /// Register the player and load the career's starting profile.
    ///
    /// # Errors
    ///
    /// `InvalidArchetype` for an unknown career key, `InvalidPlayerName` for a
    /// blank or overlong name, `InvalidState`/`SessionClosed` when the session
    /// has already been welcomed. The session is unchanged on error.
    pub fn welcome(&mut self, player_name: &str, archetype_key: &str) -> Result<Welcome, EngineError> {
        self.require(LifecycleState::Created, "welcome")?;
        let archetype: CareerArchetype = archetype_key.parse()?;
        let player_name = player_name.trim();
        if player_name.is_empty() || player_name.chars().count() > MAX_PLAYER_NAME_LEN {
            return Err(EngineError::InvalidPlayerName {
                max: MAX_PLAYER_NAME_LEN,
            });
        }

        let profile = self.engine.data.careers.profile(archetype);
        let baseline = profile.baseline;
        let welcome = Welcome {
            narrative_key: format!("{KEY_WELCOME_PREFIX}{}", archetype.key()),
            player_name: player_name.to_string(),
            archetype,
            career_name: profile.name.clone(),
            career_description: profile.desc.clone(),
            financial_state: baseline,
            metrics: baseline.metrics(),
            progression: ProgressionState::default(),
        };

        self.player_name = Some(welcome.player_name.clone());
        self.archetype = Some(archetype);
        self.financial = baseline;
        self.initial_financial = baseline;
        self.progression = ProgressionState::default();
        self.lifecycle = LifecycleState::Initialized;
        log::info!(
            "welcomed '{}' as {archetype} (seed {})",
            welcome.player_name,
            self.rng.seed()
        );
        Ok(welcome)
    }

    /// Offer the next scenario.
    ///
    /// Idempotent while a scenario is pending: the same one is returned and
    /// no random draw is made.
    ///
    /// # Errors
    ///
    /// `InvalidState` before `welcome`, `SessionClosed` after conclusion.
    pub fn start_turn(&mut self) -> Result<Scenario, EngineError> {
        let archetype = self.open_archetype("start_turn")?;
        let data = Arc::clone(&self.engine.data);
        let profile = data.careers.profile(archetype);
        let index = match self.offered {
            Some(index) => index,
            None => self.pick_scenario(profile),
        };
        let scenario = Self::scenario_at(profile, index, "start_turn", self.lifecycle)?.clone();
        self.offered = Some(index);
        if self.lifecycle == LifecycleState::Initialized {
            self.lifecycle = LifecycleState::InProgress;
            log::info!("session {} in progress", self.rng.seed());
        }
        Ok(scenario)
    }

    /// Resolve the decision for the offered scenario.
    ///
    /// With `continue_playing == false` the session concludes after this turn
    /// and the completion bonus is folded into the result.
    ///
    /// # Errors
    ///
    /// `InvalidDecision` when the id is not one of the offered options (the
    /// same scenario stays offered, nothing is drawn or changed);
    /// `InvalidState` without an offered scenario; `SessionClosed` after
    /// conclusion.
    pub fn submit_decision(
        &mut self,
        decision_id: &str,
        continue_playing: bool,
    ) -> Result<TurnResult, EngineError> {
        let archetype = self.open_archetype("submit_decision")?;
        let index = self.offered.ok_or(EngineError::InvalidState {
            operation: "submit_decision",
            state: self.lifecycle,
        })?;
        let data = Arc::clone(&self.engine.data);
        let profile = data.careers.profile(archetype);
        let scenario = Self::scenario_at(profile, index, "submit_decision", self.lifecycle)?;

        let before = self.financial;
        let resolution = DecisionResolver.resolve(&before, scenario, decision_id)?;

        // Nothing below can fail; build the next session state in locals.
        let event = resolve_event(
            &resolution.state,
            &data.events,
            self.engine.config.event_trigger_probability,
            self.rng.event(),
        );
        let financial = event.state;
        let hints: Vec<&str> = resolution.achievement_hint.as_deref().into_iter().collect();
        let evaluation = data.achievements.evaluate_with_hints(
            &financial,
            &self.initial_financial,
            self.progression.unlocked.as_slice(),
            hints.as_slice(),
        );
        let turn_xp = resolution.xp_grant.saturating_add(evaluation.xp_bonus);
        let mut progression =
            self.engine
                .tracker
                .advance(&self.progression, turn_xp, evaluation.newly_unlocked.as_slice());

        let turns_played = self.turns_played.saturating_add(1);
        let mut xp_gained = turn_xp;
        let (lifecycle, next_index) = if continue_playing {
            (LifecycleState::InProgress, Some(self.pick_next_scenario(profile, index)))
        } else {
            let bonus = self.engine.config.completion_bonus_xp;
            progression = self.engine.tracker.advance::<&str>(&progression, bonus, &[]);
            xp_gained = xp_gained.saturating_add(bonus);
            (LifecycleState::Concluded, None)
        };
        let next_scenario = next_index.and_then(|i| profile.scenarios.get(i).cloned());

        let result = TurnResult {
            turn_index: turns_played,
            scenario_id: scenario.id.clone(),
            narrative_key: scenario.narrative_key.clone(),
            decision_id: decision_id.to_string(),
            decision_message_key: resolution.message_key,
            financial_state: financial,
            metrics: financial.metrics(),
            delta: financial.delta_from(&before),
            progression: progression.clone(),
            xp_gained,
            newly_unlocked_achievements: evaluation.newly_unlocked,
            fired_event: event.fired,
            event_trace: event.trace,
            next_scenario,
            lifecycle,
        };
        log::debug!(
            "turn {turns_played}: '{}' -> '{decision_id}', xp +{xp_gained}",
            scenario.id
        );

        self.financial = financial;
        self.progression = progression;
        self.turns_played = turns_played;
        self.last_scenario = Some(index);
        self.offered = next_index;
        self.last_decision_id = Some(decision_id.to_string());
        self.history.push(TurnRecord::from(&result));
        self.lifecycle = lifecycle;
        if lifecycle == LifecycleState::Concluded {
            self.pending_summary = Some(self.build_summary());
            log::info!("session {} concluded after {turns_played} turns", self.rng.seed());
        }
        Ok(result)
    }

    /// End the session and return its summary.
    ///
    /// From an open session this applies the completion bonus. After
    /// `submit_decision(.., false)` it hands out the summary built there. It
    /// succeeds once; later calls return `SessionClosed`.
    ///
    /// # Errors
    ///
    /// `InvalidState` before `welcome`, `SessionClosed` once claimed.
    pub fn conclude(&mut self) -> Result<SessionSummary, EngineError> {
        match self.lifecycle {
            LifecycleState::Created => Err(EngineError::InvalidState {
                operation: "conclude",
                state: self.lifecycle,
            }),
            LifecycleState::Concluded => self.pending_summary.take().ok_or(EngineError::SessionClosed),
            LifecycleState::Initialized | LifecycleState::InProgress => {
                let bonus = self.engine.config.completion_bonus_xp;
                self.progression = self.engine.tracker.advance::<&str>(&self.progression, bonus, &[]);
                self.offered = None;
                self.lifecycle = LifecycleState::Concluded;
                log::info!(
                    "session {} concluded after {} turns",
                    self.rng.seed(),
                    self.turns_played
                );
                Ok(self.build_summary())
            }
        }
    }

    #[must_use]
    pub const fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    #[must_use]
    pub const fn financial_state(&self) -> FinancialState {
        self.financial
    }

    #[must_use]
    pub const fn initial_financial_state(&self) -> FinancialState {
        self.initial_financial
    }

    #[must_use]
    pub fn metrics(&self) -> FinancialMetrics {
        self.financial.metrics()
    }

    #[must_use]
    pub const fn progression(&self) -> &ProgressionState {
        &self.progression
    }

    /// Fraction of the way to the next level.
    #[must_use]
    pub fn level_progress(&self) -> f64 {
        self.engine.tracker.curve().progress(self.progression.xp)
    }

    #[must_use]
    pub fn offered_scenario(&self) -> Option<&Scenario> {
        let archetype = self.archetype?;
        self.engine
            .data
            .careers
            .scenarios(archetype)
            .get(self.offered?)
    }

    #[must_use]
    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    #[must_use]
    pub const fn turns_played(&self) -> u32 {
        self.turns_played
    }

    #[must_use]
    pub fn player_name(&self) -> Option<&str> {
        self.player_name.as_deref()
    }

    #[must_use]
    pub const fn archetype(&self) -> Option<CareerArchetype> {
        self.archetype
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Code that replays this session, once a career is chosen.
    ///
    /// `None` when the seed did not come from a share code.
    #[must_use]
    pub fn share_code(&self) -> Option<String> {
        share_code_for(self.archetype?, self.rng.seed())
    }

    /// Draws made so far across all RNG streams.
    #[must_use]
    pub const fn rng_draws(&self) -> u64 {
        self.rng.draws()
    }

    fn require(&self, expected: LifecycleState, operation: &'static str) -> Result<(), EngineError> {
        if self.lifecycle == expected {
            Ok(())
        } else if self.lifecycle == LifecycleState::Concluded {
            Err(EngineError::SessionClosed)
        } else {
            Err(EngineError::InvalidState {
                operation,
                state: self.lifecycle,
            })
        }
    }

    fn open_archetype(&self, operation: &'static str) -> Result<CareerArchetype, EngineError> {
        let invalid = EngineError::InvalidState {
            operation,
            state: self.lifecycle,
        };
        match self.lifecycle {
            LifecycleState::Concluded => Err(EngineError::SessionClosed),
            LifecycleState::Created => Err(invalid),
            LifecycleState::Initialized | LifecycleState::InProgress => {
                self.archetype.ok_or(invalid)
            }
        }
    }

    fn scenario_at<'a>(
        profile: &'a CareerProfile,
        index: usize,
        operation: &'static str,
        state: LifecycleState,
    ) -> Result<&'a Scenario, EngineError> {
        profile
            .scenarios
            .get(index)
            .ok_or(EngineError::InvalidState { operation, state })
    }

    fn pick_scenario(&mut self, profile: &CareerProfile) -> usize {
        match self.last_scenario {
            Some(last) => self.pick_next_scenario(profile, last),
            None => self.rng.scenario().gen_range(0..profile.scenarios.len().max(1)),
        }
    }

    /// Uniform pick, skipping `last` when repeats are avoided and there is
    /// another scenario to offer.
    fn pick_next_scenario(&mut self, profile: &CareerProfile, last: usize) -> usize {
        let count = profile.scenarios.len().max(1);
        if self.engine.config.avoid_immediate_repeat && count > 1 {
            let pick = self.rng.scenario().gen_range(0..count - 1);
            if pick >= last { pick + 1 } else { pick }
        } else {
            self.rng.scenario().gen_range(0..count)
        }
    }

    fn build_summary(&self) -> SessionSummary {
        let archetype = self.archetype.unwrap_or(CareerArchetype::Student);
        SessionSummary {
            narrative_key: KEY_SESSION_CONCLUDED.to_string(),
            player_name: self.player_name.clone().unwrap_or_default(),
            archetype,
            final_xp: self.progression.xp,
            final_level: self.progression.level,
            final_achievements: self.progression.unlocked.clone(),
            turns_played: self.turns_played,
            achievements_available: saturating_usize_to_u32(self.engine.data.achievements.len()),
            final_financial_state: self.financial,
            final_metrics: self.financial.metrics(),
            completion_bonus_xp: self.engine.config.completion_bonus_xp,
            last_decision_id: self.last_decision_id.clone(),
            seed: self.rng.seed(),
            share_code: self.share_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::AchievementRegistry;
    use crate::careers::CareerCatalog;
    use crate::events::EventCatalog;

    fn quiet_engine() -> TurnEngine {
        let data = GameData::from_parts(
            CareerCatalog::load_default().unwrap(),
            EventCatalog::default(),
            AchievementRegistry::load_default().unwrap(),
        )
        .unwrap();
        let config = EngineConfig {
            event_trigger_probability: 0.0,
            ..EngineConfig::default()
        };
        TurnEngine::new(Arc::new(data), config).unwrap()
    }

    fn welcomed(seed: u64) -> Session {
        let mut session = quiet_engine().create_session(seed);
        session.welcome("Ada", "student").unwrap();
        session
    }

    #[test]
    fn lifecycle_keys_display() {
        assert_eq!(LifecycleState::InProgress.to_string(), "in_progress");
        assert!(LifecycleState::Initialized.is_open());
        assert!(!LifecycleState::Concluded.is_open());
    }

    #[test]
    fn invalid_archetype_keeps_session_created() {
        let mut session = quiet_engine().create_session(1);
        let err = session.welcome("Ada", "astronaut").unwrap_err();
        assert_eq!(err, EngineError::InvalidArchetype(String::from("astronaut")));
        assert_eq!(session.lifecycle(), LifecycleState::Created);
        assert!(session.welcome("Ada", "Student").is_ok());
        assert_eq!(session.lifecycle(), LifecycleState::Initialized);
    }

    #[test]
    fn blank_player_name_is_rejected() {
        let mut session = quiet_engine().create_session(1);
        let err = session.welcome("   ", "student").unwrap_err();
        assert!(matches!(err, EngineError::InvalidPlayerName { .. }));
        assert_eq!(session.lifecycle(), LifecycleState::Created);
    }

    #[test]
    fn welcome_twice_is_invalid_state() {
        let mut session = welcomed(1);
        let err = session.welcome("Ada", "student").unwrap_err();
        assert!(matches!(err, EngineError::InvalidState { operation: "welcome", .. }));
    }

    #[test]
    fn start_turn_before_welcome_is_invalid_state() {
        let mut session = quiet_engine().create_session(1);
        assert!(matches!(
            session.start_turn(),
            Err(EngineError::InvalidState {
                state: LifecycleState::Created,
                ..
            })
        ));
    }

    #[test]
    fn start_turn_is_idempotent_while_pending() {
        let mut session = welcomed(3);
        let first = session.start_turn().unwrap();
        let draws = session.rng_draws();
        let again = session.start_turn().unwrap();
        assert_eq!(first, again);
        assert_eq!(session.rng_draws(), draws);
        assert_eq!(session.lifecycle(), LifecycleState::InProgress);
    }

    #[test]
    fn invalid_decision_changes_nothing() {
        let mut session = welcomed(5);
        let scenario = session.start_turn().unwrap();
        let before_state = session.financial_state();
        let before_draws = session.rng_draws();
        let err = session.submit_decision("not_an_option", true).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDecision { .. }));
        assert_eq!(session.financial_state(), before_state);
        assert_eq!(session.rng_draws(), before_draws);
        assert_eq!(session.offered_scenario(), Some(&scenario));
        assert_eq!(session.turns_played(), 0);
    }

    #[test]
    fn submit_without_offer_is_invalid_state() {
        let mut session = welcomed(5);
        let err = session.submit_decision("budget_review", true).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState { operation: "submit_decision", .. }));
    }

    #[test]
    fn continuing_offers_a_different_scenario() {
        let mut session = welcomed(11);
        let scenario = session.start_turn().unwrap();
        let first_option = scenario.options[0].id.clone();
        let result = session.submit_decision(&first_option, true).unwrap();
        let next = result.next_scenario.expect("next scenario offered");
        assert_ne!(next.id, scenario.id);
        assert_eq!(session.offered_scenario().map(|s| s.id.as_str()), Some(next.id.as_str()));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn stopping_concludes_and_claims_summary_once() {
        let mut session = welcomed(13);
        let scenario = session.start_turn().unwrap();
        let option = &scenario.options[0];
        let result = session.submit_decision(&option.id, false).unwrap();
        assert_eq!(result.lifecycle, LifecycleState::Concluded);
        assert!(result.next_scenario.is_none());
        assert!(result.xp_gained >= option.xp_grant + 100);

        let summary = session.conclude().unwrap();
        assert_eq!(summary.final_xp, session.progression().xp);
        assert_eq!(summary.turns_played, 1);
        assert_eq!(summary.last_decision_id.as_deref(), Some(option.id.as_str()));
        assert_eq!(session.conclude().unwrap_err(), EngineError::SessionClosed);
    }

    #[test]
    fn explicit_conclude_applies_bonus() {
        let mut session = welcomed(17);
        let summary = session.conclude().unwrap();
        assert_eq!(summary.final_xp, 100);
        assert_eq!(summary.final_level, 2);
        assert_eq!(summary.turns_played, 0);
        assert_eq!(session.conclude().unwrap_err(), EngineError::SessionClosed);
        assert_eq!(session.start_turn().unwrap_err(), EngineError::SessionClosed);
    }

    #[test]
    fn conclude_before_welcome_is_invalid_state() {
        let mut session = quiet_engine().create_session(1);
        assert!(matches!(
            session.conclude(),
            Err(EngineError::InvalidState { operation: "conclude", .. })
        ));
    }

    #[test]
    fn share_code_tracks_archetype() {
        let (_, seed) = crate::seed::decode_to_seed("ST-PENSION00").unwrap();
        let mut session = quiet_engine().create_session(seed);
        assert_eq!(session.share_code(), None);
        session.welcome("Ada", "student").unwrap();
        assert_eq!(session.share_code().as_deref(), Some("ST-PENSION00"));
        let summary = session.conclude().unwrap();
        assert_eq!(summary.share_code.as_deref(), Some("ST-PENSION00"));
    }

    #[test]
    fn arbitrary_seed_has_no_share_code() {
        let mut session = quiet_engine().create_session(1337);
        session.welcome("Ada", "banker").unwrap();
        assert_eq!(session.share_code(), None);
        assert_eq!(session.conclude().unwrap().share_code, None);
    }
}
