//! Subcommand dispatcher: maps parsed `Commands` onto `Tracker` operations
//! and renders their output (§4.I, §6.6).

use super::args::Commands;
use crate::project;
use crate::tracker::{Tracker, TrackerConfig};
use anyhow::Result;
use std::path::PathBuf;

/// Exit code for a CLI-level logical failure (verification returned false,
/// missing arguments) as distinct from a propagated `TrackerError` (§6.6).
pub const LOGICAL_FAILURE: i32 = 1;

pub fn execute_command(command: Commands, project_root_override: Option<PathBuf>) -> Result<i32> {
    let project_root = match project_root_override {
        Some(p) => p,
        None => project::discover_project_root()?,
    };

    let test_mode = !std::env::var("PYTEST_CURRENT_TEST")
        .unwrap_or_default()
        .is_empty();
    let config = TrackerConfig::new(project_root).with_test_mode(test_mode);
    let mut tracker = Tracker::new(config)?;

    match command {
        Commands::Start { agent, message } => {
            tracker.start(&agent, &message.join(" "))?;
            println!("Started {agent}");
            Ok(0)
        }
        Commands::Complete {
            agent,
            message,
            tools,
        } => {
            let tools_used = tools.map(|t| t.split(',').map(str::to_string).collect());
            tracker.complete(&agent, &message.join(" "), tools_used)?;
            println!("Completed {agent}");
            Ok(0)
        }
        Commands::Fail { agent, message } => {
            tracker.fail(&agent, &message.join(" "))?;
            println!("Failed {agent}");
            Ok(0)
        }
        Commands::SetGithubIssue { issue } => {
            tracker.set_github_issue(issue)?;
            println!("GitHub issue set to #{issue}");
            Ok(0)
        }
        Commands::Status => {
            render_status(&mut tracker)?;
            Ok(0)
        }
        Commands::VerifyParallelExploration => {
            run_verification(tracker.verify_parallel_exploration()?, &tracker, "exploration")
        }
        Commands::VerifyParallelValidation => {
            run_verification(tracker.verify_parallel_validation()?, &tracker, "validation")
        }
        Commands::AutoTrack { message } => {
            let default_message = if message.is_empty() {
                None
            } else {
                Some(message.join(" "))
            };
            let tracked = tracker.auto_track_from_environment(default_message.as_deref())?;
            if tracked {
                println!("Auto-tracked agent from CLAUDE_AGENT_NAME");
            }
            Ok(0)
        }
    }
}

fn render_status(tracker: &mut Tracker) -> Result<()> {
    println!("Session: {}", tracker.session_path().display());
    if let Some(issue) = tracker.github_issue()? {
        println!("GitHub issue: #{issue}");
    }
    println!("Progress: {}%", tracker.progress_percent()?);

    for entry in tracker.display_metadata()? {
        let mut line = format!("{} {} — {}", entry.glyph, entry.display_name, entry.status);
        if let Some(duration) = entry.duration_seconds {
            line.push_str(&format!(" ({duration}s)"));
        }
        println!("{line}");
    }

    let total = tracker.total_duration_seconds()?;
    println!("Total duration: {}m {}s", total / 60, total % 60);

    if tracker.is_pipeline_complete()? {
        println!("Pipeline complete.");
    } else if let Some(remaining) = tracker.estimated_remaining_seconds()? {
        println!("Estimated remaining: {}s", remaining.round() as i64);
    }

    Ok(())
}

fn run_verification(succeeded: bool, tracker: &Tracker, label: &str) -> Result<i32> {
    let slot = match label {
        "exploration" => crate::tracker::PhaseSlot::Exploration,
        _ => crate::tracker::PhaseSlot::Validation,
    };
    if let Some(result) = tracker.phase_result(slot) {
        println!(
            "{label}: status={:?} efficiency={}% time_saved={}s",
            result.status, result.efficiency_percent, result.time_saved_seconds
        );
    }
    Ok(if succeeded { 0 } else { LOGICAL_FAILURE })
}
