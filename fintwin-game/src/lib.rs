//! Financial Twin turn engine
//!
//! Platform-agnostic core for the Financial Twin literacy game: career
//! catalogs, decision and event resolution, achievements, progression and the
//! session state machine. Narration and persistence live outside this crate.

pub mod achievements;
pub mod careers;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod data;
pub mod decisions;
pub mod error;
pub mod events;
pub mod finance;
pub mod numbers;
pub mod progression;
pub mod result;
pub mod rng;
pub mod seed;
pub mod session;
pub mod trace;

// Re-export commonly used types
pub use achievements::{Achievement, AchievementRegistry, AchievementRule, Evaluation};
pub use careers::{CareerArchetype, CareerCatalog, CareerProfile};
pub use catalog::{CatalogLoader, CatalogSource, DirectoryCatalogs, EmbeddedCatalogs, GameData};
pub use config::{ConfigError, EngineConfig};
pub use data::{Decision, Effects, Scenario};
pub use decisions::{DecisionResolver, Resolution};
pub use error::{CatalogError, EngineError};
pub use events::{EventCatalog, EventDef, EventOutcome, FiredEvent, resolve_event};
pub use finance::{FinancialDelta, FinancialMetrics, FinancialState};
pub use progression::{LevelCurve, ProgressionState, ProgressionTracker};
pub use result::{Leaderboard, LeaderboardEntry, SessionSummary};
pub use rng::{CountingRng, RngBundle};
pub use seed::{decode_to_seed, encode_friendly, generate_code_from_entropy, share_code_for};
pub use session::{LifecycleState, Session, TurnEngine, TurnRecord, TurnResult, Welcome};
pub use trace::{EventDecisionTrace, WeightedCandidate};
