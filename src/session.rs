//! UI state restored between `scout browse` runs.
//!
//! Loaded once when the browser starts and saved once when it exits. The
//! pure formatting and filtering code never reads it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub selected_search: Option<i64>,
    pub email_filter: Option<String>,
}

impl SessionState {
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "scout")
            .map(|dirs| dirs.data_dir().join("session.json"))
    }

    /// A missing or unreadable file yields a fresh session.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %path.display(), "discarding unreadable session state: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "saved session state");
        Ok(())
    }
}
