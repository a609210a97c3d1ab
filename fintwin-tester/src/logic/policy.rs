use std::fmt;

use fintwin_game::constants::MONTHS_PER_YEAR;
use fintwin_game::{Decision, FinancialState, Scenario};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Debt-to-income ratios above this are treated as equally hopeless.
const DTI_CAP: f64 = 10.0;

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub choice_index: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(choice_index: usize, rationale: Option<String>) -> Self {
        Self {
            choice_index,
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select one of the scenario's options given the current finances.
    fn pick_decision(&mut self, state: &FinancialState, scenario: &Scenario) -> PolicyDecision;
}

/// Built-in strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Saver,
    Investor,
    DebtCrusher,
    Balanced,
    Random,
}

impl GameplayStrategy {
    pub const ALL: &'static [Self] = &[
        Self::Saver,
        Self::Investor,
        Self::DebtCrusher,
        Self::Balanced,
        Self::Random,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GameplayStrategy::Saver => "Saver",
            GameplayStrategy::Investor => "Investor",
            GameplayStrategy::DebtCrusher => "Debt Crusher",
            GameplayStrategy::Balanced => "Balanced",
            GameplayStrategy::Random => "Random",
        }
    }

    /// Command-line spelling.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            GameplayStrategy::Saver => "saver",
            GameplayStrategy::Investor => "investor",
            GameplayStrategy::DebtCrusher => "debt-crusher",
            GameplayStrategy::Balanced => "balanced",
            GameplayStrategy::Random => "random",
        }
    }

    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.key().eq_ignore_ascii_case(&token))
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            GameplayStrategy::Saver => "Maximise the savings balance every turn",
            GameplayStrategy::Investor => "Chase net worth plus a year of cash flow",
            GameplayStrategy::DebtCrusher => "Pay debt down before anything else",
            GameplayStrategy::Balanced => "Weigh savings ratio against debt-to-income",
            GameplayStrategy::Random => "Uniformly random option (seeded)",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            GameplayStrategy::Saver => Box::new(SaverPolicy),
            GameplayStrategy::Investor => Box::new(InvestorPolicy),
            GameplayStrategy::DebtCrusher => Box::new(DebtCrusherPolicy),
            GameplayStrategy::Balanced => Box::new(BalancedPolicy),
            GameplayStrategy::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct SaverPolicy;
struct InvestorPolicy;
struct DebtCrusherPolicy;
struct BalancedPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for SaverPolicy {
    fn name(&self) -> &'static str {
        "Saver"
    }

    fn pick_decision(&mut self, state: &FinancialState, scenario: &Scenario) -> PolicyDecision {
        let (idx, savings) =
            best_option(scenario, |option| projected(state, option).savings).unwrap_or((0, 0.0));
        PolicyDecision::new(idx, Some(format!("savings {savings:.0}")))
    }
}

impl PlayerPolicy for InvestorPolicy {
    fn name(&self) -> &'static str {
        "Investor"
    }

    fn pick_decision(&mut self, state: &FinancialState, scenario: &Scenario) -> PolicyDecision {
        let (idx, score) = best_option(scenario, |option| investor_score(&projected(state, option)))
            .unwrap_or((0, 0.0));
        PolicyDecision::new(idx, Some(format!("outlook {score:.0}")))
    }
}

impl PlayerPolicy for DebtCrusherPolicy {
    fn name(&self) -> &'static str {
        "Debt Crusher"
    }

    fn pick_decision(&mut self, state: &FinancialState, scenario: &Scenario) -> PolicyDecision {
        let (idx, score) =
            best_option(scenario, |option| -projected(state, option).debt).unwrap_or((0, 0.0));
        PolicyDecision::new(idx, Some(format!("debt {:.0}", -score)))
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_decision(&mut self, state: &FinancialState, scenario: &Scenario) -> PolicyDecision {
        let (idx, score) = best_option(scenario, |option| balanced_score(&projected(state, option)))
            .unwrap_or((0, 0.0));
        PolicyDecision::new(idx, Some(format!("score {score:.2}")))
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_decision(&mut self, _state: &FinancialState, scenario: &Scenario) -> PolicyDecision {
        if scenario.options.is_empty() {
            return PolicyDecision::new(0, Some("no options".to_string()));
        }
        let idx = self.rng.gen_range(0..scenario.options.len());
        PolicyDecision::new(idx, None)
    }
}

fn projected(state: &FinancialState, option: &Decision) -> FinancialState {
    option.effects.apply(state)
}

/// First option with the highest score.
fn best_option(
    scenario: &Scenario,
    mut score: impl FnMut(&Decision) -> f64,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, option) in scenario.options.iter().enumerate() {
        let value = score(option);
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((idx, value));
        }
    }
    best
}

fn investor_score(state: &FinancialState) -> f64 {
    state.net_worth() + state.monthly_net_cash_flow() * MONTHS_PER_YEAR
}

fn balanced_score(state: &FinancialState) -> f64 {
    let dti = state.debt_to_income_ratio().min(DTI_CAP);
    state.savings_ratio() * 100.0 - dti * 25.0 + state.monthly_net_cash_flow() / 100.0
}
