use colored::Colorize;
use fintwin_game::{CareerArchetype, Leaderboard, TurnEngine};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::policy::GameplayStrategy;
use crate::logic::seeds::SeedInfo;
use crate::logic::simulation::{SimulationConfig, SimulationSummary, run_simulation};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub archetype: String,
    pub strategy: String,
    pub seed: String,
    /// Share code of every iteration, in order.
    pub share_codes: Vec<String>,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
    pub average_final_xp: f64,
    pub average_final_level: f64,
    pub average_achievements: f64,
    pub average_net_worth: f64,
    pub events_fired: usize,
}

/// One archetype/strategy pairing to exercise.
#[derive(Debug, Clone, Copy)]
pub struct TestPlan {
    pub archetype: CareerArchetype,
    pub strategy: GameplayStrategy,
}

impl TestPlan {
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}/{}", self.archetype, self.strategy.key())
    }
}

pub struct LogicTester {
    engine: TurnEngine,
    turns: u32,
    verbose: bool,
    leaderboard: Leaderboard,
}

impl LogicTester {
    #[must_use]
    pub fn new(engine: TurnEngine, turns: u32, verbose: bool) -> Self {
        Self {
            engine,
            turns,
            verbose,
            leaderboard: Leaderboard::new(),
        }
    }

    /// Every concluded run, best first.
    #[must_use]
    pub const fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn run_plan(
        &mut self,
        plan: TestPlan,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for seed in seeds.iter().filter(|s| s.matches_archetype(plan.archetype)) {
            if self.verbose {
                println!(
                    "🧪 Testing {} (seed {})",
                    plan.name().bright_white(),
                    seed.label()
                );
            }
            results.push(self.run_single_plan(plan, seed, iterations));
        }

        results
    }

    fn run_single_plan(
        &mut self,
        plan: TestPlan,
        seed: &SeedInfo,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut share_codes = Vec::with_capacity(iterations);
        let mut finished: Vec<SimulationSummary> = Vec::with_capacity(iterations);

        for i in 0..iterations {
            let (session_seed, code) = seed.session_seed(plan.archetype, i);
            share_codes.push(code.clone());
            let config = SimulationConfig::new(plan.archetype, plan.strategy, session_seed)
                .with_turns(self.turns);

            let start_time = Instant::now();
            let outcome = run_simulation(&self.engine, config);
            let duration = start_time.elapsed();

            let run = match outcome {
                Ok(run) => run,
                Err(err) => {
                    failures.push(format!("Iteration {} ({code}): {err:#}", i + 1));
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{iterations} errored: {}",
                            i + 1,
                            format!("{err:#}").red()
                        );
                    }
                    continue;
                }
            };

            let mut problems = run.violations.clone();
            if i == 0 {
                problems.extend(self.replay_mismatch(config, &run));
            }

            if problems.is_empty() {
                successes += 1;
                performance_data.push(duration);
                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{iterations} passed ({duration:?}) code:{code} xp:{} level:{} events:{}",
                        i + 1,
                        run.summary.final_xp,
                        run.summary.final_level,
                        run.events_fired()
                    );
                }
            } else {
                let message = format!(
                    "Iteration {} (strategy {}, code {}, seed {}, turns {}): {} | {}",
                    i + 1,
                    run.config.strategy.label(),
                    run.share_code.as_deref().unwrap_or("none"),
                    run.config.seed,
                    run.config.turns,
                    problems.join("; "),
                    run.decision_path()
                );
                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{iterations} failed: {}",
                        i + 1,
                        message.clone().red()
                    );
                }
                failures.push(message);
            }

            self.leaderboard.record(&run.summary);
            finished.push(run);
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: plan.name(),
            archetype: plan.archetype.key().to_string(),
            strategy: plan.strategy.key().to_string(),
            seed: seed.label(),
            share_codes,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
            average_final_xp: mean(&finished, |run| f64::from(run.summary.final_xp)),
            average_final_level: mean(&finished, |run| f64::from(run.summary.final_level)),
            average_achievements: mean(&finished, |run| {
                f64::from(u32::try_from(run.summary.final_achievements.len()).unwrap_or(u32::MAX))
            }),
            average_net_worth: mean(&finished, |run| run.summary.final_financial_state.net_worth()),
            events_fired: finished.iter().map(SimulationSummary::events_fired).sum(),
        }
    }

    fn replay_mismatch(&self, config: SimulationConfig, first: &SimulationSummary) -> Option<String> {
        match run_simulation(&self.engine, config) {
            Ok(replay) if replay.transcript == first.transcript => None,
            Ok(replay) => {
                let turn = first
                    .transcript
                    .iter()
                    .zip(&replay.transcript)
                    .position(|(a, b)| a != b)
                    .unwrap_or(first.transcript.len().min(replay.transcript.len()));
                Some(format!("replay diverged at turn {}", turn + 1))
            }
            Err(err) => Some(format!("replay failed: {err:#}")),
        }
    }
}

fn mean(runs: &[SimulationSummary], value: impl Fn(&SimulationSummary) -> f64) -> f64 {
    if runs.is_empty() {
        return 0.0;
    }
    let total: f64 = runs.iter().map(value).sum();
    total / f64::from(u32::try_from(runs.len()).unwrap_or(u32::MAX))
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u64>::deserialize(deserializer)?;
        Ok(millis.into_iter().map(Duration::from_millis).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tester() -> LogicTester {
        LogicTester::new(TurnEngine::with_defaults().expect("embedded data"), 8, false)
    }

    #[test]
    fn healthy_plan_passes_every_iteration() {
        let mut tester = tester();
        let plan = TestPlan {
            archetype: CareerArchetype::Student,
            strategy: GameplayStrategy::Balanced,
        };
        let results = tester.run_plan(plan, &[SeedInfo::from_numeric(42)], 3);
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert!(result.passed, "{:?}", result.failures);
        assert_eq!(result.successful_iterations, 3);
        assert_eq!(result.share_codes.len(), 3);
        assert!(result.share_codes.iter().all(|code| code.starts_with("ST-")));
        assert!(result.average_final_xp > 0.0);
        assert_eq!(tester.leaderboard().len(), 3);
    }

    #[test]
    fn share_code_seeds_skip_other_careers() {
        let mut tester = tester();
        let (archetype, seed) = fintwin_game::decode_to_seed("AR-PENNY10").unwrap();
        let seeds = [SeedInfo::from_share_code(seed, archetype, "AR-PENNY10".to_string())];
        let plan = TestPlan {
            archetype: CareerArchetype::Banker,
            strategy: GameplayStrategy::Saver,
        };
        assert!(tester.run_plan(plan, &seeds, 1).is_empty());
    }

    #[test]
    fn result_serializes_durations_as_millis() {
        let mut tester = tester();
        let plan = TestPlan {
            archetype: CareerArchetype::Entrepreneur,
            strategy: GameplayStrategy::Investor,
        };
        let results = tester.run_plan(plan, &[SeedInfo::from_numeric(1)], 1);
        let value = serde_json::to_value(&results[0]).unwrap();
        assert!(value["average_duration"].is_u64());
        assert_eq!(value["scenario_name"], "entrepreneur/investor");
    }
}
