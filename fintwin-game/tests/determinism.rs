use std::hash::Hasher;
use std::thread;

use fintwin_game::{
    CareerArchetype, EngineConfig, GameData, Session, TurnEngine, decode_to_seed,
    generate_code_from_entropy,
};
use twox_hash::XxHash64;

fn transcript(engine: &TurnEngine, archetype: CareerArchetype, seed: u64, turns: usize) -> String {
    let mut session = engine.create_session(seed);
    session.welcome("Replay", archetype.key()).unwrap();
    play(&mut session, turns)
}

fn play(session: &mut Session, turns: usize) -> String {
    let mut lines = Vec::with_capacity(turns);
    for turn in 0..turns {
        let scenario = session.start_turn().unwrap();
        let pick = scenario.options[turn % scenario.options.len()].id.clone();
        let result = session.submit_decision(&pick, turn + 1 < turns).unwrap();
        lines.push(serde_json::to_string(&result).unwrap());
    }
    lines.join("\n")
}

fn digest(text: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(text.as_bytes());
    hasher.finish()
}

fn eventful_engine() -> TurnEngine {
    let config = EngineConfig {
        event_trigger_probability: 1.0,
        ..EngineConfig::default()
    };
    TurnEngine::new(GameData::shared_default().unwrap(), config).unwrap()
}

#[test]
fn same_seed_replays_identical_transcript() {
    let engine = TurnEngine::with_defaults().unwrap();
    for &archetype in CareerArchetype::ALL {
        let first = transcript(&engine, archetype, 0xDEAD_BEEF, 15);
        let second = transcript(&engine, archetype, 0xDEAD_BEEF, 15);
        assert_eq!(digest(&first), digest(&second), "{archetype} replay diverged");
    }
}

#[test]
fn different_seeds_diverge() {
    let engine = eventful_engine();
    let a = transcript(&engine, CareerArchetype::Banker, 1, 20);
    let b = transcript(&engine, CareerArchetype::Banker, 2, 20);
    assert_ne!(digest(&a), digest(&b));
}

#[test]
fn share_code_seed_replays_session() {
    let engine = eventful_engine();
    let code = generate_code_from_entropy(CareerArchetype::Entrepreneur, 0x1234_5678);
    let (archetype, seed) = decode_to_seed(&code).unwrap();
    assert_eq!(archetype, CareerArchetype::Entrepreneur);

    let mut session: Session = engine.create_session(seed);
    session.welcome("Coder", archetype.key()).unwrap();
    assert_eq!(session.share_code().as_deref(), Some(code.as_str()));

    let original = transcript(&engine, archetype, seed, 10);
    let (_, replay_seed) = decode_to_seed(&code).unwrap();
    assert_eq!(original, transcript(&engine, archetype, replay_seed, 10));
}

fn assert_send<T: Send>() {}

#[test]
fn sessions_play_on_separate_threads() {
    assert_send::<Session>();
    assert_send::<TurnEngine>();

    let engine = eventful_engine();
    let sessions: Vec<(CareerArchetype, Session)> = CareerArchetype::ALL
        .iter()
        .map(|&archetype| {
            let mut session = engine.create_session(0xC0FF_EE00 + archetype as u64);
            session.welcome("Replay", archetype.key()).unwrap();
            (archetype, session)
        })
        .collect();

    let threaded: Vec<(CareerArchetype, String)> = thread::scope(|scope| {
        let handles: Vec<_> = sessions
            .into_iter()
            .map(|(archetype, mut session)| {
                scope.spawn(move || (archetype, play(&mut session, 12)))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    for (archetype, text) in threaded {
        let sequential = transcript(&engine, archetype, 0xC0FF_EE00 + archetype as u64, 12);
        assert_eq!(digest(&text), digest(&sequential), "{archetype} diverged across threads");
    }
}

#[test]
fn rejected_decisions_do_not_shift_the_event_stream() {
    let engine = eventful_engine();
    let clean = transcript(&engine, CareerArchetype::Artist, 99, 6);

    let mut session = engine.create_session(99);
    session.welcome("Replay", "artist").unwrap();
    let mut lines = Vec::new();
    for turn in 0..6 {
        let scenario = session.start_turn().unwrap();
        assert!(session.submit_decision("definitely_not_offered", true).is_err());
        let pick = scenario.options[turn % scenario.options.len()].id.clone();
        let result = session.submit_decision(&pick, turn + 1 < 6).unwrap();
        lines.push(serde_json::to_string(&result).unwrap());
    }
    assert_eq!(clean, lines.join("\n"));
}
