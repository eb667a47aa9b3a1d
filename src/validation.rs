//! Validation Layer (§4.A) — stateless pure functions consulted by every
//! boundary-entering operation. Each returns a canonicalized value on
//! success, or `TrackerError::{InvalidInput,PathRejected}` on failure, and
//! is responsible for logging an audit event for path validation outcomes.

use crate::audit::{emit_audit_event, AuditOutcome};
use crate::error::{Result, TrackerError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Component, Path, PathBuf};

/// Hard-coded system roots that are never writable, regardless of test mode.
const SYSTEM_ROOT_BLOCKLIST: &[&str] = &[
    "/etc", "/var/log", "/usr", "/bin", "/sbin", "/boot", "/sys", "/proc", "/lib", "/lib64",
];

static AGENT_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Options controlling path validation; constructed once per tracker and
/// threaded through every call (§9: construction-time configuration).
#[derive(Debug, Clone)]
pub struct PathValidationContext {
    pub project_root: PathBuf,
    /// PYTEST_CURRENT_TEST-equivalent bypass (§6.4): widens the allowed
    /// prefix to include the OS temp directory. Never weakens the
    /// system-root blocklist.
    pub test_mode: bool,
}

impl PathValidationContext {
    pub fn new(project_root: PathBuf, test_mode: bool) -> Self {
        Self {
            project_root,
            test_mode,
        }
    }
}

/// Validate a user-supplied path: whitelisted, symlink-safe (§4.A.1).
///
/// Resolves the path fully (lexically, since the target may not yet exist),
/// verifies it is a descendant of the project root (or, in test mode, the
/// OS temp directory), rejects any existing symlink component, and rejects
/// paths matching the hard-coded system-root blocklist unconditionally.
pub fn validate_path(input: &Path, ctx: &PathValidationContext) -> Result<PathBuf> {
    let reject = |reason: &str| -> TrackerError {
        emit_audit_event(
            "PATH_VALIDATION",
            AuditOutcome::Blocked,
            &input.display().to_string(),
            &[("reason", reason)],
        );
        TrackerError::path_rejected(input, reason)
    };

    let raw = input.to_string_lossy();

    if has_traversal_component(&raw) {
        return Err(reject("literal path contains '..' components"));
    }

    let decoded = percent_decode(&raw);
    if decoded != raw && has_traversal_component(&decoded) {
        return Err(reject("percent-encoded path resolves to a '..' traversal"));
    }

    let resolved = resolve_lexically(input, &ctx.project_root);

    for blocked in SYSTEM_ROOT_BLOCKLIST {
        if resolved == Path::new(blocked) || resolved.starts_with(blocked) {
            return Err(reject("path matches system-root blocklist"));
        }
    }

    let project_root_canonical = ctx
        .project_root
        .canonicalize()
        .unwrap_or_else(|_| ctx.project_root.clone());

    let mut allowed_roots = vec![project_root_canonical.clone()];
    if ctx.test_mode {
        allowed_roots.push(std::env::temp_dir());
    }

    let within_allowed_root = allowed_roots.iter().any(|root| resolved.starts_with(root));
    if !within_allowed_root {
        return Err(reject("path is not a descendant of the project root"));
    }

    if let Some(symlink_component) = find_symlink_component(&resolved) {
        return Err(reject(&format!(
            "path contains a symlink component: {}",
            symlink_component.display()
        )));
    }

    emit_audit_event(
        "PATH_VALIDATION",
        AuditOutcome::Allowed,
        &resolved.display().to_string(),
        &[],
    );

    Ok(resolved)
}

fn has_traversal_component(s: &str) -> bool {
    Path::new(s)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
}

/// Minimal percent-decoder, sufficient to catch `..`/`/` obfuscation
/// (`%2e%2e`, `%2f`) without pulling in a URL-parsing dependency.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(h) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(h);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Resolve `input` against `root` without touching the filesystem, collapsing
/// `.`/`..` components lexically. This differs from `Path::canonicalize`,
/// which requires the path to exist.
fn resolve_lexically(input: &Path, root: &Path) -> PathBuf {
    let base = if input.is_absolute() {
        input.to_path_buf()
    } else {
        root.join(input)
    };

    let mut out = PathBuf::new();
    for component in base.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Find the first ancestor (inclusive of the leaf) of `path` that is a
/// symlink, checking only components that actually exist on disk.
fn find_symlink_component(path: &Path) -> Option<PathBuf> {
    let mut current = PathBuf::new();
    for component in path.components() {
        current.push(component.as_os_str());
        if let Ok(meta) = std::fs::symlink_metadata(&current) {
            if meta.file_type().is_symlink() {
                return Some(current);
            }
        }
    }
    None
}

/// Validate an agent name syntactically (§4.A.2): non-empty, <= 255 code
/// points, matches `[A-Za-z0-9_-]+`, no NUL bytes. Does NOT check
/// membership in the canonical agent set — that is a separate semantic
/// check performed by the calling layer (§3.3).
pub fn validate_agent_name(name: &str) -> Result<String> {
    if name.is_empty() {
        return Err(TrackerError::invalid_input("agent name must not be empty"));
    }
    if name.chars().count() > 255 {
        return Err(TrackerError::invalid_input(
            "agent name must be at most 255 code points",
        ));
    }
    if name.contains('\0') {
        return Err(TrackerError::invalid_input("agent name contains NUL byte"));
    }
    if !AGENT_NAME_RE.is_match(name) {
        return Err(TrackerError::invalid_input(format!(
            "agent name '{name}' must match [A-Za-z0-9_-]+"
        )));
    }
    Ok(name.to_string())
}

/// Validate a free-form string's length and character content (§4.A.3).
/// `max_bytes` is the caller-supplied limit (default 10,000 for messages).
pub fn validate_string_length(value: &str, max_bytes: usize) -> Result<String> {
    if value.len() > max_bytes {
        return Err(TrackerError::invalid_input(format!(
            "value is {} bytes, exceeds limit of {max_bytes}",
            value.len()
        )));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
    {
        return Err(TrackerError::invalid_input(format!(
            "value contains disallowed control character {:?}",
            bad
        )));
    }
    Ok(value.to_string())
}

/// Validate a GitHub issue number (§4.A.4): integer in `[1, 999_999]`.
pub fn validate_issue_number(value: i64) -> Result<u32> {
    if !(1..=999_999).contains(&value) {
        return Err(TrackerError::invalid_input(format!(
            "issue number {value} out of range [1, 999999]"
        )));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx(root: &Path) -> PathValidationContext {
        PathValidationContext::new(root.to_path_buf(), false)
    }

    #[test]
    fn rejects_literal_parent_dir() {
        let tmp = TempDir::new().unwrap();
        let err = validate_path(Path::new("../../etc/passwd"), &ctx(tmp.path())).unwrap_err();
        assert!(matches!(err, TrackerError::PathRejected { .. }));
    }

    #[test]
    fn rejects_absolute_system_path_even_without_dotdot() {
        let tmp = TempDir::new().unwrap();
        let err = validate_path(Path::new("/etc/passwd"), &ctx(tmp.path())).unwrap_err();
        assert!(matches!(err, TrackerError::PathRejected { .. }));
    }

    #[test]
    fn rejects_percent_encoded_traversal() {
        let tmp = TempDir::new().unwrap();
        let err =
            validate_path(Path::new("..%2F..%2Fetc%2Fpasswd"), &ctx(tmp.path())).unwrap_err();
        assert!(matches!(err, TrackerError::PathRejected { .. }));
    }

    #[test]
    fn accepts_relative_path_inside_project_root() {
        let tmp = TempDir::new().unwrap();
        let resolved =
            validate_path(Path::new("docs/sessions/x.json"), &ctx(tmp.path())).unwrap();
        assert!(resolved.starts_with(tmp.path().canonicalize().unwrap()));
    }

    #[test]
    fn test_mode_widens_to_temp_dir_but_not_system_roots() {
        let tmp = TempDir::new().unwrap();
        let mut c = ctx(tmp.path());
        c.test_mode = true;
        let temp_path = std::env::temp_dir().join("agent_tracker_test_mode_probe.json");
        assert!(validate_path(&temp_path, &c).is_ok());

        let err = validate_path(Path::new("/etc/shadow"), &c).unwrap_err();
        assert!(matches!(err, TrackerError::PathRejected { .. }));
    }

    #[test]
    fn rejects_symlink_component() {
        let tmp = TempDir::new().unwrap();
        let real_dir = tmp.path().join("real");
        std::fs::create_dir_all(&real_dir).unwrap();
        let link = tmp.path().join("link");
        #[cfg(unix)]
        std::os::unix::fs::symlink(&real_dir, &link).unwrap();
        #[cfg(unix)]
        {
            let err = validate_path(&link.join("session.json"), &ctx(tmp.path())).unwrap_err();
            assert!(matches!(err, TrackerError::PathRejected { .. }));
        }
    }

    #[test]
    fn agent_name_boundaries() {
        assert!(validate_agent_name("").is_err());
        assert!(validate_agent_name("a").is_ok());
        assert!(validate_agent_name(&"a".repeat(255)).is_ok());
        assert!(validate_agent_name(&"a".repeat(256)).is_err());
        assert!(validate_agent_name("bad name!").is_err());
    }

    #[test]
    fn message_boundaries() {
        assert!(validate_string_length(&"a".repeat(10_000), 10_000).is_ok());
        assert!(validate_string_length(&"a".repeat(10_001), 10_000).is_err());
        assert!(validate_string_length("hello\tworld\n", 10_000).is_ok());
        assert!(validate_string_length("bad\u{0007}bell", 10_000).is_err());
    }

    #[test]
    fn issue_number_boundaries() {
        assert!(validate_issue_number(0).is_err());
        assert!(validate_issue_number(1).is_ok());
        assert!(validate_issue_number(999_999).is_ok());
        assert!(validate_issue_number(1_000_000).is_err());
    }
}
