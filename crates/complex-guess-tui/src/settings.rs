use crate::leaderboard::{read_json, write_json_atomic};
use crate::theme::ThemeName;
use complex_guess_core::StoreResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";

/// User preferences persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub theme: ThemeName,
    /// Name recorded on the leaderboard
    #[serde(default)]
    pub player_name: Option<String>,
}

impl Settings {
    fn path(dir: &Path) -> PathBuf {
        dir.join(SETTINGS_FILE)
    }

    /// Load settings; a missing or unreadable file yields defaults
    pub fn load(dir: &Path) -> Self {
        read_json(&Self::path(dir))
    }

    pub fn save(&self, dir: &Path) -> StoreResult<()> {
        write_json_atomic(&Self::path(dir), self)
    }
}
