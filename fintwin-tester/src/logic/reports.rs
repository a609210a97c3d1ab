use anyhow::Result;
use colored::Colorize;
use fintwin_game::{Leaderboard, LeaderboardEntry};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;
use crate::common::report_timestamp;

/// Rows shown from the leaderboard in console and markdown reports.
pub const LEADERBOARD_ROWS: usize = 10;

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    total_scenarios: usize,
    passed: usize,
    results: &'a [ScenarioResult],
    leaderboard: &'a [LeaderboardEntry],
}

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
    leaderboard: &Leaderboard,
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(passed_tests, total_tests))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(out, "{} {} (seed {})", status, result.scenario_name.bold(), result.seed)?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(
            out,
            "   Avg XP {:.1} | Avg level {:.2} | Avg achievements {:.2} | Avg net worth £{:.0} | Events {}",
            result.average_final_xp,
            result.average_final_level,
            result.average_achievements,
            result.average_net_worth,
            result.events_fired
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    if !leaderboard.is_empty() {
        writeln!(out, "{}", "🏆 Leaderboard".bright_yellow().bold())?;
        writeln!(out, "{}", "==============".yellow())?;
        for (rank, entry) in leaderboard.top(LEADERBOARD_ROWS).iter().enumerate() {
            writeln!(
                out,
                "{:>3}. {:<28} {:<13} xp {:>5}  lvl {:>3}  ach {:>2}  £{:.0}",
                rank + 1,
                entry.player_name,
                entry.archetype.key(),
                entry.xp,
                entry.level,
                entry.achievements,
                entry.net_worth
            )?;
        }
    }

    if let Some(fastest) = results.iter().min_by_key(|r| r.average_duration)
        && let Some(slowest) = results.iter().max_by_key(|r| r.average_duration)
    {
        writeln!(out)?;
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(out, "Fastest: {} ({:?})", fastest.scenario_name, fastest.average_duration)?;
        writeln!(out, "Slowest: {} ({:?})", slowest.scenario_name, slowest.average_duration)?;
    }

    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
    leaderboard: &Leaderboard,
) -> Result<()> {
    let report = JsonReport {
        generated_at: report_timestamp(),
        total_scenarios: results.len(),
        passed: results.iter().filter(|r| r.passed).count(),
        results,
        leaderboard: leaderboard.top(LEADERBOARD_ROWS),
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
    leaderboard: &Leaderboard,
) -> Result<()> {
    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();

    writeln!(out, "# Financial Twin Logic Test Report")?;
    writeln!(out)?;
    writeln!(out, "_Generated {}_", report_timestamp())?;
    writeln!(out)?;
    writeln!(out, "## Summary")?;
    writeln!(out)?;
    writeln!(out, "- **Total scenarios:** {total_tests}")?;
    writeln!(out, "- **Passed:** {passed_tests}")?;
    writeln!(out, "- **Failed:** {}", total_tests - passed_tests)?;
    writeln!(
        out,
        "- **Success rate:** {:.1}%",
        success_rate(passed_tests, total_tests)
    )?;
    writeln!(out)?;
    writeln!(out, "## Results")?;
    writeln!(out)?;
    writeln!(
        out,
        "| Scenario | Seed | Status | Iterations | Avg XP | Avg level | Avg achievements | Avg net worth | Events |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|---|")?;
    for result in results {
        let status = if result.passed { "✅ Pass" } else { "❌ Fail" };
        writeln!(
            out,
            "| {} | {} | {} | {}/{} | {:.1} | {:.2} | {:.2} | £{:.0} | {} |",
            result.scenario_name,
            result.seed,
            status,
            result.successful_iterations,
            result.iterations_run,
            result.average_final_xp,
            result.average_final_level,
            result.average_achievements,
            result.average_net_worth,
            result.events_fired
        )?;
    }

    let failed: Vec<_> = results.iter().filter(|r| !r.passed).collect();
    if !failed.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Failures")?;
        for result in failed {
            writeln!(out)?;
            writeln!(out, "### {} (seed {})", result.scenario_name, result.seed)?;
            writeln!(out)?;
            for failure in &result.failures {
                writeln!(out, "- {failure}")?;
            }
        }
    }

    if !leaderboard.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Leaderboard")?;
        writeln!(out)?;
        writeln!(out, "| # | Player | Career | XP | Level | Achievements | Net worth |")?;
        writeln!(out, "|---|---|---|---|---|---|---|")?;
        for (rank, entry) in leaderboard.top(LEADERBOARD_ROWS).iter().enumerate() {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} | £{:.0} |",
                rank + 1,
                entry.player_name,
                entry.archetype.key(),
                entry.xp,
                entry.level,
                entry.achievements,
                entry.net_worth
            )?;
        }
    }

    Ok(())
}

pub fn generate_csv_report<W: Write + ?Sized>(out: &mut W, results: &[ScenarioResult]) -> Result<()> {
    writeln!(
        out,
        "scenario,archetype,strategy,seed,passed,iterations,successes,avg_ms,avg_xp,avg_level,avg_achievements,avg_net_worth,events_fired"
    )?;
    for result in results {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{:.2},{:.2},{:.2},{:.2},{}",
            csv_field(&result.scenario_name),
            csv_field(&result.archetype),
            csv_field(&result.strategy),
            csv_field(&result.seed),
            result.passed,
            result.iterations_run,
            result.successful_iterations,
            result.average_duration.as_millis(),
            result.average_final_xp,
            result.average_final_level,
            result.average_achievements,
            result.average_net_worth,
            result.events_fired
        )?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let rate = (passed as f64 / total as f64) * 100.0;
    rate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: name.to_string(),
            archetype: "student".to_string(),
            strategy: "saver".to_string(),
            seed: "ST-PENNY42".to_string(),
            share_codes: vec!["ST-PENNY42".to_string()],
            passed,
            iterations_run: 2,
            successful_iterations: usize::from(passed) * 2,
            failures: if passed {
                Vec::new()
            } else {
                vec!["Iteration 1: negative debt".to_string()]
            },
            average_duration: Duration::from_millis(3),
            performance_data: vec![Duration::from_millis(3)],
            average_final_xp: 420.0,
            average_final_level: 5.0,
            average_achievements: 2.5,
            average_net_worth: -18_500.0,
            events_fired: 3,
        }
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        f(&mut buf).expect("report renders");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn csv_has_header_and_row_per_result() {
        let results = [sample("student/saver", true), sample("student,odd", false)];
        let text = render(|buf| generate_csv_report(buf, &results));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("scenario,archetype"));
        assert!(lines[1].starts_with("student/saver,student,saver,ST-PENNY42,true"));
        assert!(lines[2].starts_with("\"student,odd\""));
    }

    #[test]
    fn json_report_parses_back() {
        let results = [sample("student/saver", true)];
        let text = render(|buf| generate_json_report(buf, &results, &Leaderboard::new()));
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value["total_scenarios"], 1);
        assert_eq!(value["passed"], 1);
        assert_eq!(value["results"][0]["average_duration"], 3);
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn markdown_lists_failures() {
        let results = [sample("student/saver", true), sample("banker/random", false)];
        let text = render(|buf| generate_markdown_report(buf, &results, &Leaderboard::new()));
        assert!(text.starts_with("# Financial Twin Logic Test Report"));
        assert!(text.contains("## Failures"));
        assert!(text.contains("### banker/random"));
        assert!(!text.contains("## Leaderboard"));
    }

    #[test]
    fn console_report_mentions_every_scenario() {
        let results = [sample("student/saver", true), sample("banker/random", false)];
        let text = render(|buf| {
            generate_console_report(buf, &results, &Leaderboard::new(), Duration::from_secs(1))
        });
        assert!(text.contains("Total scenarios: 2"));
        assert!(text.contains("student/saver"));
        assert!(text.contains("banker/random"));
        assert!(text.contains("Success rate: 50.0%"));
    }
}
