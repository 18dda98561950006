use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub font_path: Option<PathBuf>,
    pub last_open_dir: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
}

impl UserSettings {
    fn file_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("com", "snapfix", "snapfix")?;
        let config_dir = dirs.config_dir();
        std::fs::create_dir_all(config_dir).ok()?;
        Some(config_dir.join("settings.json"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::file_path().context("cannot resolve settings path")?;
        Self::load_from(&path)
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            log::debug!("using default settings: {err:#}");
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::file_path().context("cannot resolve settings path")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("cannot write {}", path.display()))?;
        Ok(())
    }

    /// Remembers the directory of a file the user just opened.
    pub fn remember_open_dir(&mut self, file: &Path) {
        if let Some(parent) = file.parent() {
            self.last_open_dir = Some(parent.to_path_buf());
            if let Err(err) = self.save() {
                log::warn!("cannot persist settings: {err:#}");
            }
        }
    }
}
