mod common;
mod logic;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use fintwin_game::{CareerArchetype, DirectoryCatalogs, EngineConfig, GameData, TurnEngine};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use common::split_csv;
use logic::{GameplayStrategy, LogicTester, ScenarioResult, TestPlan, resolve_seed_inputs};

#[derive(Debug, Parser)]
#[command(name = "fintwin-tester", version = "0.1.0")]
#[command(about = "Automated play-through QA for the Financial Twin turn engine")]
struct Args {
    /// Careers to play (comma-separated keys, or "all")
    #[arg(long, default_value = "all")]
    careers: String,

    /// Decision strategies to play with (comma-separated, or "all")
    #[arg(long, default_value = "balanced")]
    strategies: String,

    /// List careers and strategies and exit
    #[arg(long)]
    list: bool,

    /// Seeds to run: numbers, share codes, or "all" (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of sessions per career, strategy and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Turns played in each session
    #[arg(long, default_value_t = 12)]
    turns: u32,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Engine configuration JSON (trigger probability, level curve, bonus)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding careers.json, events.json and achievements.json
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the per-turn event trigger probability
    #[arg(long)]
    event_probability: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let engine = build_engine(&args)?;

    if maybe_list(&args, &engine)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let careers = expand_careers(&args.careers)?;
    let strategies = expand_strategies(&args.strategies)?;
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;

    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let mut tester = LogicTester::new(engine, args.turns, args.verbose);
    let mut results: Vec<ScenarioResult> = Vec::new();
    for &archetype in &careers {
        for &strategy in &strategies {
            let plan = TestPlan {
                archetype,
                strategy,
            };
            let plan_results = tester.run_plan(plan, &seed_infos, args.iterations);
            if plan_results.is_empty() {
                log::warn!("no seeds apply to {}", plan.name());
            }
            results.extend(plan_results);
        }
    }

    write_reports(&args, &results, &tester, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn build_engine(args: &Args) -> Result<TurnEngine> {
    let data = match &args.data_dir {
        Some(dir) => Arc::new(
            GameData::load(&DirectoryCatalogs::new(dir))
                .with_context(|| format!("failed to load catalogs from {}", dir.display()))?,
        ),
        None => GameData::shared_default().context("embedded catalogs are invalid")?,
    };

    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            EngineConfig::from_json(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(probability) = args.event_probability {
        config.event_trigger_probability = probability;
    }

    TurnEngine::new(data, config).context("invalid engine configuration")
}

fn maybe_list(args: &Args, engine: &TurnEngine) -> Result<bool> {
    if !args.list {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available careers:")?;
    for profile in &engine.data().careers {
        writeln!(
            output_target.writer(),
            "  {:14} - {} (income £{:.0}, debt £{:.0}, {} scenarios)",
            profile.archetype.key(),
            profile.name,
            profile.baseline.income,
            profile.baseline.debt,
            profile.scenarios.len()
        )?;
    }
    writeln!(output_target.writer())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in GameplayStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:14} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "💷 Financial Twin Automated Tester".bright_cyan().bold());
    println!("{}", "==================================".cyan());
}

fn expand_careers(arg: &str) -> Result<Vec<CareerArchetype>> {
    let tokens = split_csv(arg);
    if tokens.is_empty() || tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok(CareerArchetype::ALL.to_vec());
    }
    let mut careers = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let Some(archetype) = CareerArchetype::parse(token) else {
            bail!("Unknown career: {token}");
        };
        if !careers.contains(&archetype) {
            careers.push(archetype);
        }
    }
    Ok(careers)
}

fn expand_strategies(arg: &str) -> Result<Vec<GameplayStrategy>> {
    let tokens = split_csv(arg);
    if tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok(GameplayStrategy::ALL.to_vec());
    }
    let mut strategies = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let Some(strategy) = GameplayStrategy::parse(token) else {
            bail!("Unknown strategy: {token}");
        };
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    if strategies.is_empty() {
        strategies.push(GameplayStrategy::Balanced);
    }
    Ok(strategies)
}

fn write_reports(
    args: &Args,
    results: &[ScenarioResult],
    tester: &LogicTester,
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    let leaderboard = tester.leaderboard();

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results, leaderboard)?,
        "markdown" => {
            logic::reports::generate_markdown_report(&mut output_target, results, leaderboard)?;
        }
        "csv" => logic::reports::generate_csv_report(&mut output_target, results)?,
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    leaderboard,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
