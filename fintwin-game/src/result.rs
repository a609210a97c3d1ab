//! End-of-session summary and the leaderboard display list.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::careers::CareerArchetype;
use crate::finance::{FinancialMetrics, FinancialState};

/// Everything a narrator needs to close out a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub narrative_key: String,
    pub player_name: String,
    pub archetype: CareerArchetype,
    pub final_xp: u32,
    pub final_level: u32,
    /// Unlock order.
    pub final_achievements: Vec<String>,
    pub turns_played: u32,
    /// Size of the registry the achievements were drawn from.
    pub achievements_available: u32,
    pub final_financial_state: FinancialState,
    pub final_metrics: FinancialMetrics,
    pub completion_bonus_xp: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_decision_id: Option<String>,
    pub seed: u64,
    /// Present only when the seed came from a share code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_code: Option<String>,
}

impl SessionSummary {
    #[must_use]
    pub fn leaderboard_entry(&self) -> LeaderboardEntry {
        LeaderboardEntry {
            player_name: self.player_name.clone(),
            archetype: self.archetype,
            xp: self.final_xp,
            level: self.final_level,
            achievements: self.final_achievements.len(),
            net_worth: self.final_financial_state.net_worth(),
        }
    }
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_name: String,
    pub archetype: CareerArchetype,
    pub xp: u32,
    pub level: u32,
    pub achievements: usize,
    pub net_worth: f64,
}

impl LeaderboardEntry {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .xp
            .cmp(&self.xp)
            .then_with(|| other.level.cmp(&self.level))
            .then_with(|| other.achievements.cmp(&self.achievements))
            .then_with(|| other.net_worth.total_cmp(&self.net_worth))
    }
}

/// In-memory ranking for display; nothing is persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry and return its 1-based position.
    ///
    /// Ties keep earlier entries ahead.
    pub fn insert(&mut self, entry: LeaderboardEntry) -> usize {
        let index = self
            .entries
            .iter()
            .position(|existing| entry.rank_cmp(existing) == Ordering::Less)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, entry);
        index + 1
    }

    pub fn record(&mut self, summary: &SessionSummary) -> usize {
        self.insert(summary.leaderboard_entry())
    }

    #[must_use]
    pub fn top(&self, n: usize) -> &[LeaderboardEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    #[must_use]
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
