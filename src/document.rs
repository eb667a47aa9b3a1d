//! Session document and agent entry types (§3.1, §3.2, §3.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of an agent entry's lifecycle (§3.2, §4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Started,
    Completed,
    Failed,
}

impl AgentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::Started => "started",
            AgentStatus::Completed => "completed",
            AgentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AgentStatus::Completed | AgentStatus::Failed)
    }
}

/// One agent invocation record (§3.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEntry {
    pub agent: String,
    pub status: AgentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_used: Option<Vec<String>>,
}

impl AgentEntry {
    pub fn new_started(agent: impl Into<String>, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            agent: agent.into(),
            status: AgentStatus::Started,
            started_at: Some(now),
            completed_at: None,
            failed_at: None,
            duration_seconds: None,
            message: message.into(),
            error: None,
            tools_used: None,
        }
    }
}

/// Classification of a designated parallel phase (§3.4, §4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Parallel,
    Sequential,
    Incomplete,
    Failed,
}

/// Result of a phase verification run (§3.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    pub status: PhaseStatus,
    pub sequential_time_seconds: i64,
    pub parallel_time_seconds: i64,
    pub time_saved_seconds: i64,
    pub efficiency_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_agents: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_agents: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_agents: Option<Vec<String>>,
}

/// The per-session JSON document (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDocument {
    pub session_id: String,
    pub started: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_issue: Option<u32>,
    pub agents: Vec<AgentEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_exploration: Option<PhaseResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_validation: Option<PhaseResult>,
}

impl SessionDocument {
    /// Create a freshly initialized document with the given session id.
    pub fn new(session_id: impl Into<String>, started: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            started,
            github_issue: None,
            agents: Vec::new(),
            parallel_exploration: None,
            parallel_validation: None,
        }
    }

    /// All entries for a given agent name, in file order (oldest first).
    pub fn entries_for(&self, agent_name: &str) -> Vec<&AgentEntry> {
        self.agents
            .iter()
            .filter(|e| e.agent == agent_name)
            .collect()
    }

    /// Latest entry for a given agent name (last by file order), if any.
    pub fn latest_entry_for(&self, agent_name: &str) -> Option<&AgentEntry> {
        self.agents.iter().rev().find(|e| e.agent == agent_name)
    }

    /// Mutable reference to the latest entry for a given agent name.
    pub fn latest_entry_for_mut(&mut self, agent_name: &str) -> Option<&mut AgentEntry> {
        self.agents.iter_mut().rev().find(|e| e.agent == agent_name)
    }
}

/// Session id format: `YYYYMMDD-HHMMSS` (§3.1).
pub fn new_session_id(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d-%H%M%S").to_string()
}
