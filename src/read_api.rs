//! Read API (§4.H): pure functions over the current in-memory document. No
//! store writes, no validation side-effects.

use crate::agent::{self, AGENT_METADATA, EXPECTED_AGENTS};
use crate::document::{AgentEntry, AgentStatus, SessionDocument};
use chrono::Utc;
use serde::Serialize;

pub fn expected_agents() -> [&'static str; 7] {
    EXPECTED_AGENTS
}

/// Count of expected agents whose latest entry is terminal, as an integer
/// percent of 7 (floor).
pub fn progress_percent(doc: &SessionDocument) -> u32 {
    let done = EXPECTED_AGENTS
        .iter()
        .filter(|name| {
            doc.latest_entry_for(name)
                .is_some_and(|e| e.status.is_terminal())
        })
        .count();
    (done * 100 / EXPECTED_AGENTS.len()) as u32
}

/// Expected agents with no entry at all yet.
pub fn pending_agents(doc: &SessionDocument) -> Vec<&'static str> {
    EXPECTED_AGENTS
        .iter()
        .copied()
        .filter(|name| doc.entries_for(name).is_empty())
        .collect()
}

/// The most recently appended entry with `status = started`, if any.
pub fn running_agent(doc: &SessionDocument) -> Option<&AgentEntry> {
    doc.agents.iter().rev().find(|e| e.status == AgentStatus::Started)
}

/// Mean `duration_seconds` over terminal entries; `None` when there are
/// none.
pub fn average_agent_duration_seconds(doc: &SessionDocument) -> Option<f64> {
    let durations: Vec<i64> = doc
        .agents
        .iter()
        .filter(|e| e.status.is_terminal())
        .filter_map(|e| e.duration_seconds)
        .collect();
    if durations.is_empty() {
        return None;
    }
    Some(durations.iter().sum::<i64>() as f64 / durations.len() as f64)
}

/// True iff `name` has at least one entry (of any status) that ever reached
/// a terminal status, regardless of whether a later entry for the same
/// agent (e.g. a retry's fresh `started`) is now the latest one.
fn has_any_terminal_entry(doc: &SessionDocument, name: &str) -> bool {
    doc.entries_for(name).iter().any(|e| e.status.is_terminal())
}

/// Estimated remaining wall-clock time, in seconds, to finish the pipeline.
pub fn estimated_remaining_seconds(doc: &SessionDocument) -> Option<f64> {
    let avg = average_agent_duration_seconds(doc)?;
    let done_count = EXPECTED_AGENTS
        .iter()
        .filter(|name| has_any_terminal_entry(doc, name))
        .count();
    let pending = EXPECTED_AGENTS.len() - done_count;
    let running = running_agent(doc);

    // Every pending agent is charged a full `avg`, except the single
    // running agent (if any), whose share is discounted by its elapsed
    // time instead.
    let full_share_count = if running.is_some() {
        pending.saturating_sub(1)
    } else {
        pending
    };

    let mut remaining = full_share_count as f64 * avg;
    if let Some(entry) = running {
        let elapsed = entry
            .started_at
            .map(|s| (Utc::now() - s).num_seconds() as f64)
            .unwrap_or(0.0);
        let running_share = (avg - elapsed).max(0.0);
        remaining += running_share;
    }
    Some(remaining.max(0.0))
}

/// True iff every expected agent has at least one terminal entry, anywhere
/// in its history (not just its latest entry — a later retry's fresh
/// `started` entry must not un-complete an agent for this check).
pub fn is_pipeline_complete(doc: &SessionDocument) -> bool {
    EXPECTED_AGENTS
        .iter()
        .all(|name| has_any_terminal_entry(doc, name))
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentDisplay {
    pub name: &'static str,
    pub display_name: String,
    pub description: &'static str,
    pub status: &'static str,
    pub glyph: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_used: Option<Vec<String>>,
}

/// Assemble per-agent display metadata for every expected agent, including
/// those not yet seen (status `pending`).
pub fn display_metadata(doc: &SessionDocument) -> Vec<AgentDisplay> {
    EXPECTED_AGENTS
        .iter()
        .map(|&name| {
            let description = AGENT_METADATA.get(name).copied().unwrap_or("");
            match doc.latest_entry_for(name) {
                None => AgentDisplay {
                    name,
                    display_name: agent::format_agent_name(name),
                    description,
                    status: "pending",
                    glyph: agent::status_glyph("pending"),
                    started_at: None,
                    completed_at: None,
                    duration_seconds: None,
                    message: None,
                    tools_used: None,
                },
                Some(entry) => AgentDisplay {
                    name,
                    display_name: agent::format_agent_name(name),
                    description,
                    status: entry.status.as_str(),
                    glyph: agent::status_glyph(entry.status.as_str()),
                    started_at: entry.started_at.map(|t| t.to_rfc3339()),
                    completed_at: entry.completed_at.map(|t| t.to_rfc3339()),
                    duration_seconds: entry.duration_seconds,
                    message: Some(entry.message.clone()),
                    tools_used: entry.tools_used.clone(),
                },
            }
        })
        .collect()
}

/// Sum of every terminal entry's duration, for the CLI status line's
/// "Nm Ss" total (§10.7 supplement, grounded on the original's `show_status`
/// total-duration render).
pub fn total_duration_seconds(doc: &SessionDocument) -> i64 {
    doc.agents
        .iter()
        .filter(|e| e.status.is_terminal())
        .filter_map(|e| e.duration_seconds)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn completed(agent: &str, duration: i64) -> AgentEntry {
        let now = Utc::now();
        AgentEntry {
            agent: agent.to_string(),
            status: AgentStatus::Completed,
            started_at: Some(now - Duration::seconds(duration)),
            completed_at: Some(now),
            failed_at: None,
            duration_seconds: Some(duration),
            message: "done".to_string(),
            error: None,
            tools_used: None,
        }
    }

    #[test]
    fn progress_percent_counts_terminal_entries_only() {
        let mut doc = SessionDocument::new("s", Utc::now());
        doc.agents.push(completed("researcher", 10));
        doc.agents.push(completed("planner", 10));
        assert_eq!(progress_percent(&doc), 28); // 2/7 floored
    }

    #[test]
    fn pending_agents_excludes_any_tracked_agent() {
        let mut doc = SessionDocument::new("s", Utc::now());
        doc.agents
            .push(AgentEntry::new_started("researcher", "go", Utc::now()));
        let pending = pending_agents(&doc);
        assert!(!pending.contains(&"researcher"));
        assert!(pending.contains(&"planner"));
    }

    #[test]
    fn average_duration_is_none_without_terminal_entries() {
        let mut doc = SessionDocument::new("s", Utc::now());
        doc.agents
            .push(AgentEntry::new_started("researcher", "go", Utc::now()));
        assert!(average_agent_duration_seconds(&doc).is_none());
    }

    #[test]
    fn is_pipeline_complete_requires_all_seven() {
        let mut doc = SessionDocument::new("s", Utc::now());
        for name in EXPECTED_AGENTS {
            doc.agents.push(completed(name, 5));
        }
        assert!(is_pipeline_complete(&doc));
    }

    #[test]
    fn is_pipeline_complete_survives_a_retry_entry_after_completion() {
        let mut doc = SessionDocument::new("s", Utc::now());
        for name in EXPECTED_AGENTS {
            doc.agents.push(completed(name, 5));
        }
        // researcher retries: a fresh started entry is now its latest, but
        // it still has an earlier terminal entry.
        doc.agents
            .push(AgentEntry::new_started("researcher", "retry", Utc::now()));
        assert!(is_pipeline_complete(&doc));
    }

    #[test]
    fn estimated_remaining_counts_non_running_started_agent_as_pending() {
        let mut doc = SessionDocument::new("s", Utc::now());
        doc.agents.push(completed("researcher", 300));
        // Two agents started in a genuinely parallel phase; only the later
        // one is "running". The earlier one must still count toward the
        // remaining estimate at a full average share.
        doc.agents
            .push(AgentEntry::new_started("planner", "go", Utc::now()));
        doc.agents
            .push(AgentEntry::new_started("test-master", "go", Utc::now()));

        let avg = average_agent_duration_seconds(&doc).unwrap();
        // done: researcher (1). remaining: 6 agents, one of which (test-master,
        // the most recently appended started entry) is "running" with ~0
        // elapsed, so its share is ~avg; the other 5 (including planner)
        // each contribute a full avg.
        let remaining = estimated_remaining_seconds(&doc).unwrap();
        assert!(
            (remaining - 6.0 * avg).abs() < 1.0,
            "expected ~{} got {}",
            6.0 * avg,
            remaining
        );
    }

    #[test]
    fn display_metadata_covers_every_expected_agent() {
        let doc = SessionDocument::new("s", Utc::now());
        let display = display_metadata(&doc);
        assert_eq!(display.len(), 7);
        assert!(display.iter().all(|d| d.status == "pending"));
    }
}
