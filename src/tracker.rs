//! The tracker: construction-time configuration (§9 design note) plus the
//! Agent State Machine (§4.C) and Auto-Tracker (§4.D) operations, wired to
//! the Session Store, Validation Layer, Evidence Reconciler and Phase
//! Verifier.

use crate::agent;
use crate::audit::{self, AuditOutcome};
use crate::document::{AgentEntry, AgentStatus, PhaseResult, SessionDocument};
use crate::error::{Result, TrackerError};
use crate::read_api;
use crate::reconciler;
use crate::store::SessionStore;
use crate::validation::{self, PathValidationContext};
use crate::verifier;
use chrono::Utc;
use std::path::{Path, PathBuf};

const MAX_MESSAGE_BYTES: usize = 10_000;

/// Construction-time configuration for a [`Tracker`] instance (§9: lift
/// mutable module-level configuration into a struct passed at construction).
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub project_root: PathBuf,
    pub session_file: Option<PathBuf>,
    pub audit_log_path: Option<PathBuf>,
    pub test_mode: bool,
}

impl TrackerConfig {
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            session_file: None,
            audit_log_path: None,
            test_mode: !std::env::var("PYTEST_CURRENT_TEST")
                .unwrap_or_default()
                .is_empty(),
        }
    }

    pub fn with_session_file(mut self, path: PathBuf) -> Self {
        self.session_file = Some(path);
        self
    }

    pub fn with_audit_log_path(mut self, path: PathBuf) -> Self {
        self.audit_log_path = Some(path);
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }
}

/// The session id embedded in a `<session_id>-pipeline.json` file name.
fn session_id_from_path(path: &Path) -> String {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned());
    match stem {
        Some(s) => s.strip_suffix("-pipeline").map(str::to_string).unwrap_or(s),
        None => crate::document::new_session_id(Utc::now()),
    }
}

/// Resolve the session file for today under `session_dir`: reuse the most
/// recently created matching file if one exists (most-recent-wins), else
/// mint a fresh path (§6.1).
fn discover_or_create_session_path(session_dir: &Path) -> PathBuf {
    let now = Utc::now();
    let today_prefix = now.format("%Y%m%d").to_string();

    if let Ok(read_dir) = std::fs::read_dir(session_dir) {
        let mut candidates: Vec<String> = read_dir
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| {
                name.starts_with(&today_prefix) && name.ends_with("-pipeline.json")
            })
            .collect();
        candidates.sort();
        if let Some(latest) = candidates.pop() {
            return session_dir.join(latest);
        }
    }

    session_dir.join(format!(
        "{}-pipeline.json",
        crate::document::new_session_id(now)
    ))
}

/// Ties together the Session Store, Validation Layer, Evidence Reconciler
/// and Phase Verifier behind the operations of §4.C/§4.D/§4.E/§4.G/§4.H.
pub struct Tracker {
    store: SessionStore,
    validation_ctx: PathValidationContext,
    test_mode: bool,
    memory: Option<SessionDocument>,
    duplicate_agents: Vec<String>,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        if let Some(path) = &config.audit_log_path {
            audit::configure_audit_log(path.clone());
        }

        let validation_ctx =
            PathValidationContext::new(config.project_root.clone(), config.test_mode);

        let session_path = match &config.session_file {
            Some(p) => validation::validate_path(p, &validation_ctx)?,
            None => {
                let session_dir = config.project_root.join("docs").join("sessions");
                std::fs::create_dir_all(&session_dir)?;
                discover_or_create_session_path(&session_dir)
            }
        };

        Ok(Self {
            store: SessionStore::new(session_path),
            validation_ctx,
            test_mode: config.test_mode,
            memory: None,
            duplicate_agents: Vec::new(),
        })
    }

    pub fn session_path(&self) -> &Path {
        self.store.path()
    }

    pub fn duplicate_agents(&self) -> &[String] {
        &self.duplicate_agents
    }

    fn session_id(&self) -> String {
        session_id_from_path(self.store.path())
    }

    /// Force-refresh from the session store, discarding any in-memory
    /// cache and resetting the duplicate-agents marker (§3.5, §4.G step 1).
    fn reload(&mut self) -> Result<()> {
        let session_id = self.session_id();
        let doc = self
            .store
            .load_or_init(|| SessionDocument::new(session_id, Utc::now()))?;
        self.memory = Some(doc);
        self.duplicate_agents.clear();
        Ok(())
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if self.memory.is_none() {
            self.reload()?;
        }
        Ok(())
    }

    fn doc(&self) -> &SessionDocument {
        self.memory.as_ref().expect("document loaded")
    }

    fn doc_mut(&mut self) -> &mut SessionDocument {
        self.memory.as_mut().expect("document loaded")
    }

    fn persist(&mut self) -> Result<()> {
        let doc = self.doc().clone();
        self.store.save(&doc)
    }

    fn validate_agent(&self, name: &str) -> Result<String> {
        let validated = validation::validate_agent_name(name)?;
        if !self.test_mode && !agent::is_known_agent(&validated) {
            return Err(TrackerError::UnknownAgent(validated));
        }
        Ok(validated)
    }

    /// Read the narrative companion text, if any, tolerating its absence or
    /// unreadability (§4.F, §7: never fails the enclosing operation).
    fn read_narrative_text(&self) -> Result<Option<String>> {
        let narrative_path = self.store.path().with_extension("md");
        if !narrative_path.exists() {
            return Ok(None);
        }
        let validated = match validation::validate_path(&narrative_path, &self.validation_ctx) {
            Ok(p) => p,
            Err(_) => return Ok(None),
        };
        Ok(std::fs::read_to_string(validated).ok())
    }

    // ---- Agent State Machine (§4.C) ----

    pub fn start(&mut self, agent_name: &str, message: &str) -> Result<()> {
        let name = self.validate_agent(agent_name)?;
        let msg = validation::validate_string_length(message, MAX_MESSAGE_BYTES)?;
        self.reload()?;

        let now = Utc::now();
        self.doc_mut()
            .agents
            .push(AgentEntry::new_started(name.clone(), msg, now));
        self.persist()?;

        audit::emit_audit_event(
            "AGENT_TRANSITION",
            AuditOutcome::Success,
            &name,
            &[("action", "start")],
        );
        Ok(())
    }

    /// Idempotent: a repeat `complete` on an already-completed agent is a
    /// silent no-op (§4.C, I3).
    pub fn complete(
        &mut self,
        agent_name: &str,
        message: &str,
        tools_used: Option<Vec<String>>,
    ) -> Result<()> {
        let name = self.validate_agent(agent_name)?;
        let msg = validation::validate_string_length(message, MAX_MESSAGE_BYTES)?;
        self.reload()?;

        if let Some(existing) = self.doc().latest_entry_for(&name) {
            if existing.status == AgentStatus::Completed {
                audit::emit_audit_event(
                    "AGENT_TRANSITION",
                    AuditOutcome::Success,
                    &name,
                    &[("action", "complete_skip_duplicate")],
                );
                return Ok(());
            }
        }

        let now = Utc::now();
        let has_started = matches!(
            self.doc().latest_entry_for(&name),
            Some(e) if e.status == AgentStatus::Started
        );

        if has_started {
            let entry = self.doc_mut().latest_entry_for_mut(&name).expect("checked above");
            let duration = entry.started_at.map(|s| (now - s).num_seconds().max(0));
            entry.status = AgentStatus::Completed;
            entry.completed_at = Some(now);
            entry.message = msg;
            entry.duration_seconds = duration;
            if tools_used.is_some() {
                entry.tools_used = tools_used;
            }
        } else {
            self.doc_mut().agents.push(AgentEntry {
                agent: name.clone(),
                status: AgentStatus::Completed,
                started_at: None,
                completed_at: Some(now),
                failed_at: None,
                duration_seconds: None,
                message: msg,
                error: None,
                tools_used,
            });
        }

        self.persist()?;
        audit::emit_audit_event(
            "AGENT_TRANSITION",
            AuditOutcome::Success,
            &name,
            &[("action", "complete")],
        );
        Ok(())
    }

    /// Not idempotent: a repeat `fail` on an already-failed agent appends a
    /// new failed entry, unlike `complete` (§4.C, §9 open question).
    pub fn fail(&mut self, agent_name: &str, message: &str) -> Result<()> {
        let name = self.validate_agent(agent_name)?;
        let msg = validation::validate_string_length(message, MAX_MESSAGE_BYTES)?;
        self.reload()?;

        let now = Utc::now();
        let has_started = matches!(
            self.doc().latest_entry_for(&name),
            Some(e) if e.status == AgentStatus::Started
        );

        if has_started {
            let entry = self.doc_mut().latest_entry_for_mut(&name).expect("checked above");
            let duration = entry.started_at.map(|s| (now - s).num_seconds().max(0));
            entry.status = AgentStatus::Failed;
            entry.failed_at = Some(now);
            entry.message = msg.clone();
            entry.error = Some(msg);
            entry.duration_seconds = duration;
        } else {
            self.doc_mut().agents.push(AgentEntry {
                agent: name.clone(),
                status: AgentStatus::Failed,
                started_at: None,
                completed_at: None,
                failed_at: Some(now),
                duration_seconds: None,
                message: msg.clone(),
                error: Some(msg),
                tools_used: None,
            });
        }

        self.persist()?;
        audit::emit_audit_event(
            "AGENT_TRANSITION",
            AuditOutcome::Success,
            &name,
            &[("action", "fail")],
        );
        Ok(())
    }

    pub fn set_github_issue(&mut self, issue_number: i64) -> Result<()> {
        let n = validation::validate_issue_number(issue_number)?;
        self.reload()?;
        self.doc_mut().github_issue = Some(n);
        self.persist()?;
        audit::emit_audit_event(
            "AGENT_TRANSITION",
            AuditOutcome::Success,
            "github_issue",
            &[],
        );
        Ok(())
    }

    // ---- Auto-Tracker (§4.D) ----

    pub fn auto_track_from_environment(&mut self, default_message: Option<&str>) -> Result<bool> {
        let agent_name = match std::env::var("CLAUDE_AGENT_NAME") {
            Ok(v) if !v.is_empty() => v,
            _ => {
                audit::emit_audit_event(
                    "AUTO_TRACK",
                    AuditOutcome::Success,
                    "CLAUDE_AGENT_NAME",
                    &[("action", "skip_unset")],
                );
                return Ok(false);
            }
        };

        let name = self.validate_agent(&agent_name)?;
        let message = match default_message {
            Some(m) => validation::validate_string_length(m, MAX_MESSAGE_BYTES)?,
            None => format!("Auto-detected via Task tool (CLAUDE_AGENT_NAME={name})"),
        };

        self.reload()?;
        if !self.doc().entries_for(&name).is_empty() {
            audit::emit_audit_event(
                "AUTO_TRACK",
                AuditOutcome::Success,
                &name,
                &[("action", "skip_already_tracked")],
            );
            return Ok(false);
        }

        let now = Utc::now();
        self.doc_mut()
            .agents
            .push(AgentEntry::new_started(name.clone(), message, now));
        self.persist()?;

        audit::emit_audit_event(
            "AUTO_TRACK",
            AuditOutcome::Success,
            &name,
            &[("action", "tracked")],
        );
        Ok(true)
    }

    // ---- Evidence Reconciler (§4.E) ----

    pub fn find_agent(&mut self, agent_name: &str) -> Result<Option<AgentEntry>> {
        self.reload()?;
        let narrative_text = self.read_narrative_text()?;
        let reconciled = reconciler::find_agent(self.doc(), agent_name, narrative_text.as_deref());
        if reconciled.duplicate && !self.duplicate_agents.iter().any(|a| a == agent_name) {
            self.duplicate_agents.push(agent_name.to_string());
        }
        Ok(reconciled.entry)
    }

    // ---- Phase Verifier (§4.G) ----

    pub fn verify_parallel_exploration(&mut self) -> Result<bool> {
        self.verify_phase_and_persist(&agent::EXPLORATION_AGENTS, PhaseSlot::Exploration)
    }

    pub fn verify_parallel_validation(&mut self) -> Result<bool> {
        self.verify_phase_and_persist(&agent::VALIDATION_AGENTS, PhaseSlot::Validation)
    }

    fn verify_phase_and_persist(&mut self, members: &[&str], slot: PhaseSlot) -> Result<bool> {
        self.reload()?;
        let narrative_text = self.read_narrative_text()?;
        let verification = verifier::verify_phase(self.doc(), members, narrative_text.as_deref())?;

        match slot {
            PhaseSlot::Exploration => {
                self.doc_mut().parallel_exploration = Some(verification.result.clone())
            }
            PhaseSlot::Validation => {
                self.doc_mut().parallel_validation = Some(verification.result.clone())
            }
        }
        self.persist()?;

        let status_label = format!("{:?}", verification.result.status).to_lowercase();
        let efficiency_label = verification.result.efficiency_percent.to_string();
        audit::emit_audit_event(
            "PHASE_VERIFICATION",
            if verification.succeeded {
                AuditOutcome::Success
            } else {
                AuditOutcome::Failure
            },
            slot.label(),
            &[
                ("status", status_label.as_str()),
                ("efficiency_percent", efficiency_label.as_str()),
            ],
        );

        Ok(verification.succeeded)
    }

    pub fn phase_result(&self, slot: PhaseSlot) -> Option<&PhaseResult> {
        match slot {
            PhaseSlot::Exploration => self.doc().parallel_exploration.as_ref(),
            PhaseSlot::Validation => self.doc().parallel_validation.as_ref(),
        }
    }

    // ---- Read API (§4.H) ----

    pub fn progress_percent(&mut self) -> Result<u32> {
        self.ensure_loaded()?;
        Ok(read_api::progress_percent(self.doc()))
    }

    pub fn pending_agents(&mut self) -> Result<Vec<&'static str>> {
        self.ensure_loaded()?;
        Ok(read_api::pending_agents(self.doc()))
    }

    pub fn running_agent(&mut self) -> Result<Option<AgentEntry>> {
        self.ensure_loaded()?;
        Ok(read_api::running_agent(self.doc()).cloned())
    }

    pub fn average_agent_duration_seconds(&mut self) -> Result<Option<f64>> {
        self.ensure_loaded()?;
        Ok(read_api::average_agent_duration_seconds(self.doc()))
    }

    pub fn estimated_remaining_seconds(&mut self) -> Result<Option<f64>> {
        self.ensure_loaded()?;
        Ok(read_api::estimated_remaining_seconds(self.doc()))
    }

    pub fn is_pipeline_complete(&mut self) -> Result<bool> {
        self.ensure_loaded()?;
        Ok(read_api::is_pipeline_complete(self.doc()))
    }

    pub fn display_metadata(&mut self) -> Result<Vec<read_api::AgentDisplay>> {
        self.ensure_loaded()?;
        Ok(read_api::display_metadata(self.doc()))
    }

    pub fn total_duration_seconds(&mut self) -> Result<i64> {
        self.ensure_loaded()?;
        Ok(read_api::total_duration_seconds(self.doc()))
    }

    pub fn github_issue(&mut self) -> Result<Option<u32>> {
        self.ensure_loaded()?;
        Ok(self.doc().github_issue)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PhaseSlot {
    Exploration,
    Validation,
}

impl PhaseSlot {
    fn label(self) -> &'static str {
        match self {
            PhaseSlot::Exploration => "parallel_exploration",
            PhaseSlot::Validation => "parallel_validation",
        }
    }
}
