//! Session history persistence.
//!
//! Sessions are immutable once written. Records are stored one JSON file per
//! session, keyed by creation time, with large media payloads stripped.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use broll_models::Session;

use crate::error::{EngineError, EngineResult};

/// Filesystem-backed store of past analysis sessions.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    /// Open (creating if needed) a history directory.
    pub fn open(dir: impl Into<PathBuf>) -> EngineResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a session, media stripped. Returns the record path.
    pub fn save(&self, session: &Session) -> EngineResult<PathBuf> {
        let record = session.stripped();
        let path = self.dir.join(format!(
            "{}-{}.json",
            record.created_at.timestamp_millis(),
            record.id
        ));
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| EngineError::history(format!("failed to encode session: {e}")))?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// All stored sessions, newest first. Corrupt records are skipped.
    pub fn list(&self) -> EngineResult<Vec<Session>> {
        let mut sessions = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(EngineError::from)
                .and_then(|text| {
                    serde_json::from_str::<Session>(&text)
                        .map_err(|e| EngineError::history(e.to_string()))
                }) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable history record");
                }
            }
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    /// Load one session by id.
    pub fn load(&self, id: &str) -> EngineResult<Option<Session>> {
        Ok(self.list()?.into_iter().find(|s| s.id == id))
    }
}
