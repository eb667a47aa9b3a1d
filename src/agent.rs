//! Canonical agent name set and display metadata (§3.3).

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// The seven canonical agent names, in pipeline order.
pub const EXPECTED_AGENTS: [&str; 7] = [
    "researcher",
    "planner",
    "test-master",
    "implementer",
    "reviewer",
    "security-auditor",
    "doc-master",
];

/// Members of the two-agent parallel exploration phase.
pub const EXPLORATION_AGENTS: [&str; 2] = ["researcher", "planner"];

/// Members of the three-agent parallel validation phase.
pub const VALIDATION_AGENTS: [&str; 3] = ["reviewer", "security-auditor", "doc-master"];

/// Static per-agent display metadata (description only; status glyphs are
/// computed from the entry's status, not stored here).
pub static AGENT_METADATA: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("researcher", "Research patterns and best practices"),
        ("planner", "Create architecture plan and design"),
        ("test-master", "Write tests first (TDD)"),
        ("implementer", "Implement code to make tests pass"),
        ("reviewer", "Code review and quality check"),
        (
            "security-auditor",
            "Security scan and vulnerability detection",
        ),
        ("doc-master", "Update documentation"),
    ])
});

/// True iff `name` is one of the seven canonical agent names (§3.3).
pub fn is_known_agent(name: &str) -> bool {
    EXPECTED_AGENTS.contains(&name)
}

/// Format an agent name for display, e.g. `test-master` -> `Test Master`.
pub fn format_agent_name(agent_name: &str) -> String {
    agent_name
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Status glyph for the textual `status` rendering.
pub fn status_glyph(status: &str) -> &'static str {
    match status {
        "completed" => "\u{2705}",
        "started" => "\u{23f3}",
        "failed" => "\u{274c}",
        _ => "\u{2b1c}",
    }
}
