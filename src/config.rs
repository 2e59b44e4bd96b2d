use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, RwLock};
use thiserror::Error;

use crate::i18n::Language;

// ── Paths ─────────────────────────────────────────────────────────────────────

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("futureos")
}

pub fn default_config_file() -> PathBuf {
    config_dir().join("config.json")
}

pub fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("futureos")
        .join("futureos.log")
}

// ── Startup configuration ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Auto,
}

pub const THEMES: [Theme; 3] = [Theme::Dark, Theme::Light, Theme::Auto];

impl Theme {
    /// Label shown in the settings app.
    pub fn label(self) -> &'static str {
        match self {
            Theme::Dark => "Scuro",
            Theme::Light => "Chiaro",
            Theme::Auto => "Automatico",
        }
    }
}

/// Read-only startup options. Nothing the user does in a session is written back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub skip_language_setup: bool,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: None,
            skip_language_setup: false,
            theme: Theme::Dark,
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Config {
    /// Load `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(default_log_file)
    }

    /// Language fixed ahead of time, which makes the first-run picker unnecessary.
    pub fn preset_language(&self) -> Option<Language> {
        match (self.language, self.skip_language_setup) {
            (Some(lang), _) => Some(lang),
            (None, true) => Some(Language::default()),
            (None, false) => None,
        }
    }
}

// ── Session settings ──────────────────────────────────────────────────────────

/// Process-wide display settings read by the style helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    pub theme: Theme,
}

static SESSION_SETTINGS: OnceLock<RwLock<Settings>> = OnceLock::new();

fn settings_lock() -> &'static RwLock<Settings> {
    SESSION_SETTINGS.get_or_init(|| RwLock::new(Settings::default()))
}

pub fn get_settings() -> Settings {
    settings_lock()
        .read()
        .map(|g| *g)
        .unwrap_or_default()
}

pub fn update_settings<F: FnOnce(&mut Settings)>(f: F) {
    if let Ok(mut guard) = settings_lock().write() {
        f(&mut guard);
    }
}

// ── Palette ───────────────────────────────────────────────────────────────────

pub fn accent_color(theme: Theme) -> Color {
    match theme {
        Theme::Dark => Color::Cyan,
        Theme::Light => Color::Blue,
        Theme::Auto => Color::Green,
    }
}

pub fn current_accent_color() -> Color {
    accent_color(get_settings().theme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.preset_language(), None);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"language": "es", "theme": "light"}}"#).unwrap();
        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.language, Some(Language::Es));
        assert_eq!(cfg.theme, Theme::Light);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.preset_language(), Some(Language::Es));
    }

    #[test]
    fn skip_setup_without_language_uses_default() {
        let cfg = Config {
            skip_language_setup: true,
            ..Config::default()
        };
        assert_eq!(cfg.preset_language(), Some(Language::It));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn unknown_language_code_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"language": "fr"}}"#).unwrap();
        assert!(Config::load(file.path()).is_err());
    }
}
