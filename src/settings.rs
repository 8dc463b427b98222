//! Planner settings
//!
//! Persisted as a JSON file next to the saved plans. Every field can be
//! overridden from the command line.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::planner::{PlannerConfig, RefineConfig};
use crate::sim::Variant;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings i/o: {0}")]
    Io(#[from] io::Error),
    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Planner settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Physics variant to plan with
    pub variant: Variant,

    // === Planner ===
    /// Random shots per step
    pub samples: u32,
    /// Shot magnitude
    pub speed: f32,
    /// Run local search after sampling
    pub refine: bool,
    pub refine_increment: f32,
    pub refine_passes: u32,

    // === Randomness ===
    /// Seed of the direction stream
    pub seed: u64,
    /// Rack shuffle seed (`None` keeps the canonical rack)
    pub rack_seed: Option<u64>,

    // === Output ===
    /// Where plans are written (incremental names)
    pub output: PathBuf,

    // === Other modes ===
    /// Attempt budget of the single-win search
    pub find_win_attempts: u32,
    /// Parallel workers for benchmark and multi-seed planning (0 = all cores)
    pub workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            variant: Variant::Fast,

            samples: DEFAULT_SAMPLES,
            speed: SHOT_SPEED,
            refine: true,
            refine_increment: REFINE_INCREMENT,
            refine_passes: REFINE_PASSES,

            seed: 0,
            rack_seed: None,

            output: PathBuf::from("saved/greedy_rollout/results.bin"),

            find_win_attempts: FIND_WIN_MAX_ATTEMPTS,
            workers: 0,
        }
    }
}

impl Settings {
    /// Planner configuration described by these settings
    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            samples: self.samples,
            speed: self.speed,
            refine: self.refine.then_some(RefineConfig {
                increment: self.refine_increment,
                passes: self.refine_passes,
            }),
        }
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("Using default settings");
            return Self::default();
        }

        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_planner_defaults() {
        assert_eq!(Settings::default().planner_config(), PlannerConfig::default());
    }

    #[test]
    fn test_refine_off_drops_local_search() {
        let settings = Settings {
            refine: false,
            ..Settings::default()
        };
        assert_eq!(settings.planner_config().refine, None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("settings.json");
        let settings = Settings {
            variant: Variant::Reference,
            samples: 250,
            rack_seed: Some(9),
            workers: 3,
            ..Settings::default()
        };

        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "samples": 42 }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.samples, 42);
        assert_eq!(settings.variant, Variant::Fast);
        assert_eq!(settings.speed, SHOT_SPEED);
    }

    #[test]
    fn test_bad_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(Settings::load(&path), Err(SettingsError::Json(_))));
        assert_eq!(Settings::load_or_default(&path), Settings::default());
        assert_eq!(Settings::load_or_default(&dir.path().join("missing.json")), Settings::default());
    }
}
