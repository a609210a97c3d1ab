use anyhow::{Context, Result, anyhow};
use fintwin_game::{
    CareerArchetype, EngineError, LevelCurve, LifecycleState, ProgressionState, Session,
    SessionSummary, TurnEngine, TurnResult,
};

use crate::logic::policy::{GameplayStrategy, PolicyDecision};

/// Decision id no catalog offers; submitted once per run to probe rejection.
const PROBE_DECISION_ID: &str = "__not_an_option__";

/// Configuration for one automated session.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub archetype: CareerArchetype,
    pub strategy: GameplayStrategy,
    pub turns: u32,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(archetype: CareerArchetype, strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            seed,
            archetype,
            strategy,
            turns: 12,
        }
    }

    #[must_use]
    pub fn with_turns(mut self, turns: u32) -> Self {
        self.turns = turns;
        self
    }
}

/// Snapshot of one resolved decision.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub turn: u32,
    pub scenario_id: String,
    pub decision_id: String,
    pub event_id: Option<String>,
    pub xp_gained: u32,
    pub policy_name: &'static str,
    pub rationale: Option<String>,
}

/// Outcome of a full automated session.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub config: SimulationConfig,
    /// `None` for seeds that did not come from a share code.
    pub share_code: Option<String>,
    pub decisions: Vec<DecisionRecord>,
    pub summary: SessionSummary,
    /// Broken invariants, empty for a healthy run.
    pub violations: Vec<String>,
    /// One JSON document per turn result, used for replay comparison.
    pub transcript: Vec<String>,
}

impl SimulationSummary {
    #[must_use]
    pub fn events_fired(&self) -> usize {
        self.decisions
            .iter()
            .filter(|record| record.event_id.is_some())
            .count()
    }

    /// Last few decisions, newest first, for failure messages.
    #[must_use]
    pub fn decision_path(&self) -> String {
        if self.decisions.is_empty() {
            return "no decisions recorded".to_string();
        }

        self.decisions
            .iter()
            .rev()
            .take(3)
            .map(|record| {
                let rationale = record
                    .rationale
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .unwrap_or("-");
                let event = record.event_id.as_deref().unwrap_or("none");
                format!(
                    "turn {} ({}): {} [{}] reason {} xp +{} event {}",
                    record.turn,
                    record.scenario_id,
                    record.decision_id,
                    record.policy_name,
                    rationale,
                    record.xp_gained,
                    event
                )
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Play one session to completion with the configured strategy.
///
/// # Errors
///
/// Returns an error when the engine rejects a call a well-behaved client
/// would expect to succeed; invariant breaches are reported in
/// [`SimulationSummary::violations`] instead.
pub fn run_simulation(engine: &TurnEngine, config: SimulationConfig) -> Result<SimulationSummary> {
    let mut session = engine.create_session(config.seed);
    let player_name = format!("Autoplay {}", config.strategy);
    session
        .welcome(&player_name, config.archetype.key())
        .with_context(|| format!("welcome as {}", config.archetype))?;
    let share_code = session.share_code();

    let mut policy = config.strategy.create_policy(config.seed);
    let mut monitor = InvariantMonitor::new(engine.tracker().curve().clone());
    let mut decisions = Vec::with_capacity(config.turns as usize);
    let mut transcript = Vec::with_capacity(config.turns as usize);

    for turn in 1..=config.turns {
        let scenario = session
            .start_turn()
            .with_context(|| format!("start turn {turn}"))?;
        if turn == 1 {
            monitor.probe_rejection(&mut session);
        }

        let state = session.financial_state();
        let PolicyDecision {
            choice_index,
            rationale,
        } = policy.pick_decision(&state, &scenario);
        let option = scenario.options.get(choice_index).ok_or_else(|| {
            anyhow!(
                "{} picked option {choice_index} of {} in {}",
                policy.name(),
                scenario.options.len(),
                scenario.id
            )
        })?;

        let continue_playing = turn < config.turns;
        let result = session
            .submit_decision(&option.id, continue_playing)
            .with_context(|| format!("submit {} on turn {turn}", option.id))?;
        log::debug!(
            "turn {turn}: {} -> {} (xp +{})",
            scenario.id,
            option.id,
            result.xp_gained
        );

        monitor.observe(&result, continue_playing);
        transcript.push(serde_json::to_string(&result)?);
        decisions.push(DecisionRecord {
            turn,
            scenario_id: scenario.id.clone(),
            decision_id: option.id.clone(),
            event_id: result.fired_event.as_ref().map(|event| event.id.clone()),
            xp_gained: result.xp_gained,
            policy_name: policy.name(),
            rationale,
        });
    }

    let summary = session.conclude().context("conclude session")?;
    if session.conclude() != Err(EngineError::SessionClosed) {
        monitor.flag("second conclude did not report a closed session");
    }
    monitor.check_summary(&summary, config.turns, share_code.as_deref());

    Ok(SimulationSummary {
        config,
        share_code,
        decisions,
        summary,
        violations: monitor.into_violations(),
        transcript,
    })
}

/// Tracks what must never go backwards across a session.
struct InvariantMonitor {
    curve: LevelCurve,
    progression: ProgressionState,
    last_turn: u32,
    violations: Vec<String>,
}

impl InvariantMonitor {
    fn new(curve: LevelCurve) -> Self {
        Self {
            curve,
            progression: ProgressionState::default(),
            last_turn: 0,
            violations: Vec::new(),
        }
    }

    fn flag(&mut self, message: impl Into<String>) {
        self.violations.push(message.into());
    }

    fn probe_rejection(&mut self, session: &mut Session) {
        let state = session.financial_state();
        let draws = session.rng_draws();
        let history = session.history().len();
        match session.submit_decision(PROBE_DECISION_ID, true) {
            Err(EngineError::InvalidDecision { .. }) => {}
            other => self.flag(format!("unknown decision was not rejected: {other:?}")),
        }
        if session.financial_state() != state
            || session.rng_draws() != draws
            || session.history().len() != history
        {
            self.flag("rejected decision changed the session");
        }
    }

    fn observe(&mut self, result: &TurnResult, continue_playing: bool) {
        let turn = result.turn_index;
        let state = &result.financial_state;
        if state.debt < 0.0 {
            self.flag(format!("turn {turn}: negative debt {}", state.debt));
        }
        if state.income < 0.0 {
            self.flag(format!("turn {turn}: negative income {}", state.income));
        }
        if turn != self.last_turn + 1 {
            self.flag(format!("turn index jumped from {} to {turn}", self.last_turn));
        }

        let next = &result.progression;
        if next.xp < self.progression.xp {
            self.flag(format!("turn {turn}: xp fell to {}", next.xp));
        }
        if next.xp - self.progression.xp.min(next.xp) != result.xp_gained {
            self.flag(format!(
                "turn {turn}: xp moved by {} but xp_gained is {}",
                next.xp.saturating_sub(self.progression.xp),
                result.xp_gained
            ));
        }
        if next.level < self.progression.level {
            self.flag(format!("turn {turn}: level fell to {}", next.level));
        }
        if next.level != self.curve.level_for(next.xp) {
            self.flag(format!(
                "turn {turn}: level {} does not match {} xp",
                next.level, next.xp
            ));
        }
        if !next.unlocked.starts_with(&self.progression.unlocked) {
            self.flag(format!("turn {turn}: previously unlocked achievements lost"));
        }
        for id in &result.newly_unlocked_achievements {
            if self.progression.has_unlocked(id) || !next.has_unlocked(id) {
                self.flag(format!("turn {turn}: bad unlock bookkeeping for {id}"));
            }
        }

        if let Some(event) = &result.fired_event
            && result.event_trace.chosen_id.as_deref() != Some(event.id.as_str())
        {
            self.flag(format!("turn {turn}: trace disagrees on event {}", event.id));
        }

        let expected = if continue_playing {
            LifecycleState::InProgress
        } else {
            LifecycleState::Concluded
        };
        if result.lifecycle != expected {
            self.flag(format!(
                "turn {turn}: lifecycle {} but expected {expected}",
                result.lifecycle
            ));
        }

        self.progression = next.clone();
        self.last_turn = turn;
    }

    fn check_summary(&mut self, summary: &SessionSummary, turns: u32, share_code: Option<&str>) {
        if summary.turns_played != turns {
            self.flag(format!(
                "summary reports {} turns, played {turns}",
                summary.turns_played
            ));
        }
        if turns > 0 && summary.final_xp != self.progression.xp {
            self.flag(format!(
                "summary xp {} differs from last turn {}",
                summary.final_xp, self.progression.xp
            ));
        }
        if summary.final_achievements.len() < self.progression.unlocked.len() {
            self.flag("summary dropped unlocked achievements");
        }
        if summary.share_code.as_deref() != share_code {
            self.flag(format!(
                "summary share code {:?} differs from session {share_code:?}",
                summary.share_code
            ));
        }
    }

    fn into_violations(self) -> Vec<String> {
        self.violations
    }
}
