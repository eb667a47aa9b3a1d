//! Phase Verifier (§4.G): classifies a designated agent group as having run
//! in parallel, sequentially, incompletely, or with a failure, and computes
//! the associated timing metrics.

use crate::document::{AgentEntry, PhaseResult, PhaseStatus, SessionDocument};
use crate::error::{Result, TrackerError};
use crate::reconciler;
use chrono::{DateTime, Utc};

/// Outcome of one phase check: whether verification succeeded (`true` iff
/// `status` is `parallel` or `sequential`), and the phase result to persist
/// (which itself carries `duplicate_agents` when observed while resolving
/// members, per §3.4).
#[derive(Debug)]
pub struct Verification {
    pub succeeded: bool,
    pub result: PhaseResult,
}

/// Run the shared two/three-agent parallel-phase algorithm (§4.G) against
/// `members`, resolving each member through the evidence reconciler.
pub fn verify_phase(
    doc: &SessionDocument,
    members: &[&str],
    narrative_text: Option<&str>,
) -> Result<Verification> {
    let mut resolved: Vec<(&str, Option<AgentEntry>)> = Vec::with_capacity(members.len());
    let mut duplicate_agents = Vec::new();

    for &member in members {
        let reconciled = reconciler::find_agent(doc, member, narrative_text);
        if reconciled.duplicate {
            duplicate_agents.push(member.to_string());
        }
        resolved.push((member, reconciled.entry));
    }

    let mut missing = Vec::new();
    let mut failed = Vec::new();
    let mut incomplete = Vec::new();

    for (member, entry) in &resolved {
        match entry {
            None => missing.push(member.to_string()),
            Some(e) if e.status == crate::document::AgentStatus::Failed => {
                failed.push(member.to_string())
            }
            Some(e) if e.status != crate::document::AgentStatus::Completed => {
                incomplete.push(member.to_string())
            }
            Some(_) => {}
        }
    }

    if !failed.is_empty() {
        return Ok(Verification {
            succeeded: false,
            result: PhaseResult {
                status: PhaseStatus::Failed,
                sequential_time_seconds: 0,
                parallel_time_seconds: 0,
                time_saved_seconds: 0,
                efficiency_percent: 0.0,
                missing_agents: None,
                failed_agents: Some(failed),
                duplicate_agents: none_if_empty(duplicate_agents),
            },
        });
    }

    if !missing.is_empty() || !incomplete.is_empty() {
        let mut missing_agents = missing;
        missing_agents.extend(incomplete);
        return Ok(Verification {
            succeeded: false,
            result: PhaseResult {
                status: PhaseStatus::Incomplete,
                sequential_time_seconds: 0,
                parallel_time_seconds: 0,
                time_saved_seconds: 0,
                efficiency_percent: 0.0,
                missing_agents: Some(missing_agents),
                failed_agents: None,
                duplicate_agents: none_if_empty(duplicate_agents),
            },
        });
    }

    let entries: Vec<AgentEntry> = resolved.into_iter().map(|(_, e)| e.unwrap()).collect();

    let mut started_ats = Vec::with_capacity(entries.len());
    for entry in &entries {
        let (Some(started_at), Some(_completed_at)) = (entry.started_at, entry.completed_at)
        else {
            return Err(TrackerError::InvalidTimestamp {
                agent: entry.agent.clone(),
                reason: "missing started_at or completed_at".to_string(),
            });
        };
        started_ats.push(started_at);
    }

    let is_parallel = max_pairwise_diff_seconds(&started_ats) < 5.0;

    let sequential_time: i64 = entries.iter().map(|e| e.duration_seconds.unwrap_or(0)).sum();
    let parallel_time: i64 = entries
        .iter()
        .map(|e| e.duration_seconds.unwrap_or(0))
        .max()
        .unwrap_or(0);

    let (time_saved, efficiency) = if is_parallel {
        let saved = sequential_time - parallel_time;
        let eff = if sequential_time > 0 {
            round2(100.0 * saved as f64 / sequential_time as f64)
        } else {
            0.0
        };
        (saved, eff)
    } else {
        (0, 0.0)
    };

    let status = if is_parallel {
        PhaseStatus::Parallel
    } else {
        PhaseStatus::Sequential
    };

    Ok(Verification {
        succeeded: true,
        result: PhaseResult {
            status,
            sequential_time_seconds: sequential_time,
            parallel_time_seconds: parallel_time,
            time_saved_seconds: time_saved,
            efficiency_percent: efficiency,
            missing_agents: None,
            failed_agents: None,
            duplicate_agents: none_if_empty(duplicate_agents),
        },
    })
}

fn none_if_empty(v: Vec<String>) -> Option<Vec<String>> {
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

/// Maximum pairwise absolute difference, in seconds, among `timestamps`.
fn max_pairwise_diff_seconds(timestamps: &[DateTime<Utc>]) -> f64 {
    let mut max_diff = 0.0;
    for i in 0..timestamps.len() {
        for j in (i + 1)..timestamps.len() {
            let diff = (timestamps[i] - timestamps[j]).num_milliseconds().abs() as f64 / 1000.0;
            if diff > max_diff {
                max_diff = diff;
            }
        }
    }
    max_diff
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
