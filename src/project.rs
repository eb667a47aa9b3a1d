//! Project root discovery (§6.2).

use crate::error::{Result, TrackerError};
use std::path::{Path, PathBuf};

/// Walk upward from `start` looking for the nearest ancestor containing
/// `.git/` or `.claude/`. `.git/` takes precedence when both occur at the
/// same level or in ancestors — we therefore prefer the first ancestor (from
/// `start` upward) that has `.git/`, falling back to the first ancestor that
/// has `.claude/` only if no `.git/` was found anywhere above it.
pub fn find_project_root(start: &Path) -> Result<PathBuf> {
    let mut claude_fallback: Option<PathBuf> = None;
    let mut current = Some(start);

    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Ok(dir.to_path_buf());
        }
        if claude_fallback.is_none() && dir.join(".claude").exists() {
            claude_fallback = Some(dir.to_path_buf());
        }
        current = dir.parent();
    }

    claude_fallback.ok_or_else(|| {
        TrackerError::NotFound(format!(
            "no project root (.git or .claude) found above {}",
            start.display()
        ))
    })
}

/// Convenience wrapper rooted at the current working directory.
pub fn discover_project_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir()
        .map_err(|e| TrackerError::NotFound(format!("cannot read current directory: {e}")))?;
    find_project_root(&cwd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn finds_git_root_from_nested_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        std::fs::create_dir_all(root.join(".git")).unwrap();
        let nested = root.join("src").join("lib");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&nested).unwrap(), root);
    }

    #[test]
    fn falls_back_to_claude_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        std::fs::create_dir_all(root.join(".claude")).unwrap();
        let nested = root.join("plugins");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&nested).unwrap(), root);
    }

    #[test]
    fn git_takes_precedence_over_claude() {
        let tmp = TempDir::new().unwrap();
        let claude_root = tmp.path().join("outer");
        std::fs::create_dir_all(claude_root.join(".claude")).unwrap();
        let git_root = claude_root.join("inner");
        std::fs::create_dir_all(git_root.join(".git")).unwrap();

        assert_eq!(find_project_root(&git_root).unwrap(), git_root);
    }

    #[test]
    fn errors_when_no_root_found() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert!(find_project_root(&nested).is_err());
    }
}
