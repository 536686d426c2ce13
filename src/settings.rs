//! Settings store
//!
//! A JSON file with kebab-case keys. Every key is optional; missing keys
//! take the documented defaults, and a
//! missing file is not an error. The daemon reads the file once at startup.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::duration::DisplayFormat;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How a panel client should render the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelStyle {
    #[default]
    Both,
    Icon,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    pub enable_notification: bool,
    pub enable_sound: bool,
    /// 0-100
    pub volume: u32,
    pub default_sound: String,
    pub repeat_enabled: bool,
    pub repeat_count: u32,
    pub repeat_interval_seconds: u32,
    pub display_format: DisplayFormat,
    pub panel_style: PanelStyle,
    /// One-click start durations, in seconds.
    pub presets: Vec<u64>,
    /// 0 left-start, 1 center, 2 right-end, 3 left-end, 4 right-start.
    pub position_in_panel: u32,
    /// Locale override for panel clients; stored and exposed, not acted on.
    pub override_locale: String,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_notification: true,
            enable_sound: true,
            volume: 80,
            default_sound: "bell.oga".to_string(),
            repeat_enabled: false,
            repeat_count: 0,
            repeat_interval_seconds: 10,
            display_format: DisplayFormat::Auto,
            panel_style: PanelStyle::Both,
            presets: vec![5 * 60, 10 * 60, 25 * 60],
            position_in_panel: 4,
            override_locale: String::new(),
            debug: false,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load settings, falling back to defaults on any error. The error is
    /// returned alongside so the caller can log it once tracing is up.
    pub fn load_or_default(path: &Path) -> (Self, Option<SettingsError>) {
        match Self::load(path) {
            Ok(settings) => (settings, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Load settings, writing the defaults out on first run so there is a
    /// file to edit. Any error is returned alongside the defaults.
    pub fn load_or_init(path: &Path) -> (Self, Option<SettingsError>) {
        if !path.exists() {
            let settings = Self::default();
            let err = settings.save(path).err();
            return (settings, err);
        }
        Self::load_or_default(path)
    }

    /// Write the current settings out as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("could not create settings directory: {e}");
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let s = Settings::default();
        assert!(s.enable_notification);
        assert!(s.enable_sound);
        assert_eq!(s.volume, 80);
        assert_eq!(s.default_sound, "bell.oga");
        assert!(!s.repeat_enabled);
        assert_eq!(s.repeat_count, 0);
        assert_eq!(s.repeat_interval_seconds, 10);
        assert_eq!(s.display_format, DisplayFormat::Auto);
        assert_eq!(s.panel_style, PanelStyle::Both);
        assert!(!s.debug);
    }

    #[test]
    fn parses_kebab_case_keys_with_partial_content() {
        let json = r#"{
            "repeat-enabled": true,
            "repeat-count": 2,
            "repeat-interval-seconds": 1,
            "display-format": "hide-hours-if-zero",
            "panel-style": "icon",
            "presets": [60, 300]
        }"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert!(s.repeat_enabled);
        assert_eq!(s.repeat_count, 2);
        assert_eq!(s.repeat_interval_seconds, 1);
        assert_eq!(s.display_format, DisplayFormat::HideHoursIfZero);
        assert_eq!(s.panel_style, PanelStyle::Icon);
        assert_eq!(s.presets, vec![60, 300]);
        // untouched keys keep their defaults
        assert!(s.enable_notification);
        assert_eq!(s.volume, 80);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let s = Settings::load(&path).unwrap();
        assert_eq!(s.volume, 80);
    }

    #[test]
    fn malformed_file_is_a_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));

        let (s, err) = Settings::load_or_default(&path);
        assert!(err.is_some());
        assert_eq!(s.volume, 80);
    }

    #[test]
    fn first_run_writes_the_defaults_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let (s, err) = Settings::load_or_init(&path);
        assert!(err.is_none());
        assert_eq!(s.volume, 80);
        assert!(path.exists());

        // an edited file is picked up on the next run
        let mut edited = Settings::load(&path).unwrap();
        edited.volume = 30;
        edited.save(&path).unwrap();
        let (s, err) = Settings::load_or_init(&path);
        assert!(err.is_none());
        assert_eq!(s.volume, 30);
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut s = Settings::default();
        s.repeat_enabled = true;
        s.display_format = DisplayFormat::MmSs;
        s.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert!(loaded.repeat_enabled);
        assert_eq!(loaded.display_format, DisplayFormat::MmSs);
    }
}
