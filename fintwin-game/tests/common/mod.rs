#![allow(dead_code)]

use std::sync::Arc;

use fintwin_game::{
    Achievement, AchievementRegistry, AchievementRule, CareerArchetype, CareerCatalog,
    CareerProfile, Decision, Effects, EngineConfig, EventCatalog, FinancialState, GameData,
    Scenario, Session, TurnEngine,
};

pub fn decision(id: &str, effects: Effects, xp_grant: u32) -> Decision {
    Decision {
        id: id.to_string(),
        label: id.to_string(),
        description: String::new(),
        effects,
        xp_grant,
        achievement_hint: None,
        message_key: format!("decision.test.{id}"),
    }
}

pub fn scenario(id: &str, options: Vec<Decision>) -> Scenario {
    Scenario {
        id: id.to_string(),
        narrative_key: format!("scenario.test.{id}"),
        prompt: String::new(),
        options,
    }
}

/// Every archetype gets `baseline` and the same single scenario.
pub fn uniform_careers(baseline: FinancialState, scenario: &Scenario) -> CareerCatalog {
    careers_with(baseline, std::slice::from_ref(scenario))
}

/// Every archetype gets `baseline` and the same scenario list.
pub fn careers_with(baseline: FinancialState, scenarios: &[Scenario]) -> CareerCatalog {
    let profiles = CareerArchetype::ALL
        .iter()
        .map(|&archetype| CareerProfile {
            archetype,
            name: archetype.key().to_string(),
            desc: String::new(),
            baseline,
            scenarios: scenarios.to_vec(),
        })
        .collect();
    CareerCatalog::from_profiles(profiles).expect("test catalog is valid")
}

pub fn engine(
    careers: CareerCatalog,
    events: EventCatalog,
    achievements: Vec<Achievement>,
    config: EngineConfig,
) -> TurnEngine {
    let registry = AchievementRegistry::from_achievements(achievements).expect("valid registry");
    let data = GameData::from_parts(careers, events, registry).expect("valid game data");
    TurnEngine::new(Arc::new(data), config).expect("valid config")
}

pub fn no_events() -> EngineConfig {
    EngineConfig {
        event_trigger_probability: 0.0,
        ..EngineConfig::default()
    }
}

pub fn achievement(id: &str, rule: AchievementRule, xp_bonus: u32) -> Achievement {
    Achievement {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        rule,
        xp_bonus,
    }
}

/// Play `turns` turns always taking the first option, stopping on the last.
pub fn play_first_options(session: &mut Session, turns: u32) {
    for turn in 1..=turns {
        let scenario = session.start_turn().expect("turn starts");
        let choice = scenario.options[0].id.clone();
        session
            .submit_decision(&choice, turn < turns)
            .expect("offered decision resolves");
    }
}
