//! Persistent app settings, stored as TOML in the platform config dir.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Library root the file pane scans. `None` until the user picks one.
    pub root_dir: Option<PathBuf>,
    /// Playback volume, 0..100.
    pub volume: u8,
    pub undo_depth: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_dir: None,
            volume: 100,
            undo_depth: crate::editor::DEFAULT_MAX_DEPTH,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("epoch123").join("config.toml"))
}

impl AppConfig {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        Self::load_from(&path).unwrap_or_else(|e| {
            log::warn!("config load failed ({e}), using defaults");
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        let mut cfg: AppConfig =
            toml::from_str(&text).with_context(|| format!("parse config: {}", path.display()))?;
        cfg.volume = cfg.volume.min(100);
        Ok(cfg)
    }

    pub fn save(&self) -> Result<()> {
        let path = config_path().context("no config directory on this platform")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create config dir: {}", parent.display()))?;
        }
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text).with_context(|| format!("write config: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_missing() {
        let cfg = AppConfig::load_from(Path::new("/nonexistent/epoch123/config.toml")).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.volume, 100);
    }

    #[test]
    fn volume_is_clamped_on_load() {
        let dir = std::env::temp_dir().join(format!("epoch123_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "volume = 250\nundo_depth = 10\n").unwrap();
        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.volume, 100);
        assert_eq!(cfg.undo_depth, 10);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
