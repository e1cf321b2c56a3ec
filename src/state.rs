//! Small persisted client state (`state.json` in the data directory).
//!
//! Read once at start-up and written back explicitly; nothing global.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub has_seen_welcome: bool,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    state: PersistedState,
}

impl StateStore {
    /// Load state from `path`; a missing or unreadable file yields fresh state.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = std::fs::read_to_string(&path)
            .ok()
            .and_then(|content| match serde_json::from_str(&content) {
                Ok(state) => Some(state),
                Err(e) => {
                    tracing::warn!("ignoring invalid {}: {e}", path.display());
                    None
                }
            })
            .unwrap_or_default();
        Self { path, state }
    }

    #[must_use]
    pub fn has_seen_welcome(&self) -> bool {
        self.state.has_seen_welcome
    }

    /// Record that the welcome message was shown and persist immediately.
    pub fn mark_welcome_seen(&mut self) -> Result<()> {
        self.state.has_seen_welcome = true;
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string(&self.state)?)?;
        Ok(())
    }
}
