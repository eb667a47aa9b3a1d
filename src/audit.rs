//! Audit event emission (§4.A.5, §6.5).
//!
//! Audit log writes are best-effort: a failure to write never propagates to
//! the calling operation (§7 — "Audit log write failures do not fail the
//! calling operation"). The audit log target is configured once per process
//! (via [`configure_audit_log`] or the `AUDIT_LOG_PATH` environment
//! variable) rather than re-validated on every event, to avoid the
//! self-reference of path-validating the destination that path validation
//! itself writes to.

use chrono::Utc;
use once_cell::sync::Lazy;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

static AUDIT_LOG_PATH: Lazy<Mutex<Option<PathBuf>>> = Lazy::new(|| Mutex::new(None));

/// Set the audit log destination explicitly, overriding `AUDIT_LOG_PATH`.
pub fn configure_audit_log(path: PathBuf) {
    *AUDIT_LOG_PATH.lock().unwrap() = Some(path);
}

fn resolved_audit_log_path() -> Option<PathBuf> {
    if let Some(p) = AUDIT_LOG_PATH.lock().unwrap().clone() {
        return Some(p);
    }
    std::env::var("AUDIT_LOG_PATH").ok().map(PathBuf::from)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Allowed,
    Blocked,
    Success,
    Failure,
}

impl AuditOutcome {
    fn as_str(self) -> &'static str {
        match self {
            AuditOutcome::Allowed => "ALLOWED",
            AuditOutcome::Blocked => "BLOCKED",
            AuditOutcome::Success => "SUCCESS",
            AuditOutcome::Failure => "FAILURE",
        }
    }
}

/// Append one JSON line to the audit log. Never fails the caller: any I/O
/// error is logged to stderr via `tracing` and dropped.
pub fn emit_audit_event(
    event_type: &str,
    outcome: AuditOutcome,
    identifier: &str,
    context: &[(&str, &str)],
) {
    let Some(path) = resolved_audit_log_path() else {
        return;
    };

    let record = json!({
        "timestamp": Utc::now().to_rfc3339(),
        "event_type": event_type,
        "result": outcome.as_str(),
        "operation": identifier,
        "context": context.iter().copied().collect::<std::collections::HashMap<_, _>>(),
    });

    if let Err(e) = append_line(&path, &record.to_string()) {
        tracing::warn!("audit log write failed for {}: {}", path.display(), e);
    }
}

fn append_line(path: &PathBuf, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{line}")
}
