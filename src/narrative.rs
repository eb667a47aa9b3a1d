//! Narrative Parser (§4.F, §6.3): recovers agent start/completion evidence
//! from a free-form companion markdown transcript when the tracker's own
//! JSON store was bypassed entirely by some other producer.

use crate::document::{AgentEntry, AgentStatus};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

struct Marker<'a> {
    time: NaiveTime,
    agent: &'a str,
    tail: &'a str,
}

/// Parse one line as a `HH:MM:SS - <agent>: <tail>` marker. Linear-scan,
/// backtracking-free: fixed-width time prefix, then two literal separators.
fn parse_marker(line: &str) -> Option<Marker<'_>> {
    let bytes = line.as_bytes();
    if bytes.len() < 8 {
        return None;
    }
    if bytes[2] != b':' || bytes[5] != b':' {
        return None;
    }
    let h: u32 = line.get(0..2)?.parse().ok()?;
    let m: u32 = line.get(3..5)?.parse().ok()?;
    let s: u32 = line.get(6..8)?.parse().ok()?;
    let time = NaiveTime::from_hms_opt(h, m, s)?;

    let rest = line.get(8..)?.trim_start();
    let rest = rest.strip_prefix('-')?.trim_start();

    let colon = rest.find(':')?;
    let agent = rest[..colon].trim();
    let tail = rest[colon + 1..].trim();
    if agent.is_empty() {
        return None;
    }

    Some(Marker { time, agent, tail })
}

fn is_start_tail(tail: &str) -> bool {
    tail.to_ascii_lowercase().starts_with("starting")
}

fn is_completion_tail(tail: &str) -> bool {
    let lower = tail.to_ascii_lowercase();
    lower.starts_with("completed") || lower.starts_with("complete")
}

/// Recover an `AgentEntry` for `agent_name` from narrative session text,
/// promoting the parsed times-of-day to the session's calendar date (taken
/// from `session_id`, format `YYYYMMDD-HHMMSS`).
pub fn detect_from_session_text(
    agent_name: &str,
    session_text: &str,
    session_id: &str,
) -> Option<AgentEntry> {
    let date = session_date(session_id)?;

    let mut pending_start: Option<NaiveTime> = None;
    let mut last_pair: Option<(NaiveTime, NaiveTime, String)> = None;

    for line in session_text.lines() {
        let Some(marker) = parse_marker(line) else {
            continue;
        };
        if marker.agent != agent_name {
            continue;
        }
        if is_start_tail(marker.tail) {
            pending_start = Some(marker.time);
        } else if is_completion_tail(marker.tail) {
            if let Some(start) = pending_start.take() {
                last_pair = Some((start, marker.time, marker.tail.to_string()));
            }
        }
    }

    let (start, completion_time, tail) = last_pair?;

    let started_at = promote_to_datetime(date, start)?;
    let completed_at = promote_to_datetime(date, completion_time)?;
    let duration_seconds = (completed_at - started_at).num_seconds().max(0);

    Some(AgentEntry {
        agent: agent_name.to_string(),
        status: AgentStatus::Completed,
        started_at: Some(started_at),
        completed_at: Some(completed_at),
        failed_at: None,
        duration_seconds: Some(duration_seconds),
        message: tail,
        error: None,
        tools_used: None,
    })
}

fn session_date(session_id: &str) -> Option<NaiveDate> {
    if session_id.len() < 8 {
        return None;
    }
    let y: i32 = session_id.get(0..4)?.parse().ok()?;
    let mo: u32 = session_id.get(4..6)?.parse().ok()?;
    let d: u32 = session_id.get(6..8)?.parse().ok()?;
    NaiveDate::from_ymd_opt(y, mo, d)
}

fn promote_to_datetime(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    let naive = date.and_time(time);
    Utc.from_local_datetime(&naive).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION_ID: &str = "20260731-090000";

    #[test]
    fn parses_start_and_completion_pair() {
        let text = "\
# Session log

09:00:00 - researcher: Starting research on auth patterns
09:06:00 - researcher: completed with 3 findings
";
        let entry = detect_from_session_text("researcher", text, SESSION_ID).unwrap();
        assert_eq!(entry.status, AgentStatus::Completed);
        assert_eq!(entry.duration_seconds, Some(360));
        assert_eq!(entry.message, "completed with 3 findings");
    }

    #[test]
    fn returns_none_without_completion() {
        let text = "09:00:00 - researcher: Starting research\n";
        assert!(detect_from_session_text("researcher", text, SESSION_ID).is_none());
    }

    #[test]
    fn returns_none_for_unrelated_agent() {
        let text = "\
09:00:00 - researcher: Starting research
09:06:00 - researcher: completed
";
        assert!(detect_from_session_text("planner", text, SESSION_ID).is_none());
    }

    #[test]
    fn uses_latest_completion_pair() {
        let text = "\
09:00:00 - researcher: Starting research
09:05:00 - researcher: completed first pass
09:10:00 - researcher: Starting follow-up
09:20:00 - researcher: completed final pass
";
        let entry = detect_from_session_text("researcher", text, SESSION_ID).unwrap();
        assert_eq!(entry.message, "completed final pass");
        assert_eq!(entry.duration_seconds, Some(600));
    }

    #[test]
    fn ignores_malformed_lines() {
        let text = "\
not a marker line
09:00:00 researcher missing dash and colon
09:00:00 - researcher: Starting research
09:05:00 - researcher: completed
";
        let entry = detect_from_session_text("researcher", text, SESSION_ID).unwrap();
        assert_eq!(entry.duration_seconds, Some(300));
    }
}
