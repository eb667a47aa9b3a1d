//! Session Store (§3.1, §4.B): crash-consistent load/save of the session
//! document, grounded on the atomic temp-file-plus-rename pattern used by
//! the teacher's `cook::session::tracker::SessionTracker::save_state`.

use crate::document::SessionDocument;
use crate::error::{Result, TrackerError};
use std::fs;
use std::path::{Path, PathBuf};

/// Loads and saves a [`SessionDocument`] at a fixed, pre-validated path.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the document, failing with `TrackerError::Corrupted` if the file
    /// exists but does not parse as valid JSON matching the schema.
    pub fn load(&self) -> Result<SessionDocument> {
        let raw = fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw).map_err(|e| TrackerError::Corrupted {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Atomically persist `doc` to `self.path`: write to a uniquely-named
    /// temp file in the same directory, then rename onto the target. POSIX
    /// rename is all-or-nothing, so a crash mid-write never leaves a
    /// partially-written session document (I5).
    pub fn save(&self, doc: &SessionDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let parent = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let temp_path = parent.join(format!(".agent_tracker_{}.tmp", uuid::Uuid::new_v4()));

        let json = serde_json::to_string_pretty(doc)?;

        let write_result = fs::write(&temp_path, json.as_bytes()).and_then(|_| {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))?;
            }
            fs::rename(&temp_path, &self.path)
        });

        if let Err(e) = write_result {
            let _ = fs::remove_file(&temp_path);
            return Err(TrackerError::StoreWrite(e.to_string()));
        }

        Ok(())
    }

    /// Load the existing document, or initialize a fresh one via `init` if
    /// no file exists yet at `self.path`.
    pub fn load_or_init(&self, init: impl FnOnce() -> SessionDocument) -> Result<SessionDocument> {
        if self.exists() {
            self.load()
        } else {
            Ok(init())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn round_trips_a_document() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::new(tmp.path().join("session.json"));
        let doc = SessionDocument::new("20260731-120000", Utc::now());
        store.save(&doc).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.session_id, doc.session_id);
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn no_orphaned_temp_files_remain() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::new(tmp.path().join("session.json"));
        let doc = SessionDocument::new("s", Utc::now());
        store.save(&doc).unwrap();

        let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn load_fails_on_corrupted_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        fs::write(&path, b"{not json").unwrap();
        let store = SessionStore::new(path);
        assert!(matches!(store.load(), Err(TrackerError::Corrupted { .. })));
    }

    #[test]
    fn load_or_init_initializes_when_missing() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::new(tmp.path().join("session.json"));
        let doc = store
            .load_or_init(|| SessionDocument::new("fresh", Utc::now()))
            .unwrap();
        assert_eq!(doc.session_id, "fresh");
    }
}
