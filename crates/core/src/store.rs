use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::{
    error::Result,
    types::{AnswerMode, Tab, VideoAnalysis},
};

const STATE_FILE: &str = "video_analysis_state.json";

/// Everything needed to reopen the same session after a relaunch: the
/// analysis artifact plus the view state worth restoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub result: VideoAnalysis,
    pub active_tab: Tab,
    pub mode: AnswerMode,
}

/// Single-slot persistence for the current session's snapshot.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store under the platform cache directory.
    pub fn in_default_location() -> Self {
        let root = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("vidosik");
        Self {
            path: root.join(STATE_FILE),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, &json).await?;
        Ok(())
    }

    /// Load the saved snapshot. A missing or unreadable file means there is
    /// nothing to restore, not an error.
    pub async fn load(&self) -> Option<SessionSnapshot> {
        let json = fs::read_to_string(&self.path).await.ok()?;
        match serde_json::from_str(&json) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding corrupt session state");
                None
            }
        }
    }

    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
