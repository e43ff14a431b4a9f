use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::utils::get_data_dir;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

// User settings, persisted as JSON next to the log file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub language: String,                // Language the Game Master should narrate in.
    pub api_key: Option<String>,         // Gemini API key entered by the user.
    pub model: String,                   // Active model for chat sessions.
    pub debug_mode: bool,                // Log at debug level.
    pub templates_dir: Option<PathBuf>, // Directory overriding the built-in templates.
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            language: "English".to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            debug_mode: false,
            templates_dir: None,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    fn default_path() -> io::Result<PathBuf> {
        get_data_dir()
            .map(|dir| dir.join("settings.json"))
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))
    }

    // Load settings from the default file path.
    pub fn load() -> io::Result<Self> {
        Self::load_from_file(Self::default_path()?)
    }

    // Save current settings to the default file path.
    pub fn save(&self) -> io::Result<()> {
        self.save_to_file(Self::default_path()?)
    }

    /// Settings from the default file, or defaults. A missing file is not an
    /// error; an unreadable or malformed one is handed back next to the
    /// defaults so the caller can report it before anything overwrites it.
    pub fn load_or_default() -> (Self, Option<io::Error>) {
        match Self::default_path() {
            Ok(path) => Self::load_or_default_from(path),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    pub fn load_or_default_from(path: impl AsRef<Path>) -> (Self, Option<io::Error>) {
        match Self::load_from_file(path) {
            Ok(settings) => (settings, None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (Self::default(), None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let data = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&data)?;
        Ok(settings)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        let data = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?; // Create the directory if it doesn't exist.
        }
        let mut file = fs::File::create(path)?;
        file.write_all(data.as_bytes())?;
        Ok(())
    }
}

static CURRENT: Lazy<RwLock<Settings>> = Lazy::new(|| {
    let (settings, error) = Settings::load_or_default();
    if let Some(e) = error {
        log::warn!("Could not read settings, using defaults: {e}");
    }
    RwLock::new(settings)
});

/// Snapshot of the process-wide settings.
pub fn current() -> Settings {
    match CURRENT.read() {
        Ok(settings) => settings.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Swaps the process-wide settings. Callers changing the API key should
/// also call [`crate::ai::invalidate`].
pub fn replace(settings: Settings) {
    match CURRENT.write() {
        Ok(mut guard) => *guard = settings,
        Err(poisoned) => *poisoned.into_inner() = settings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            api_key: Some("key-123".into()),
            model: "gemini-2.5-pro".into(),
            ..Settings::default()
        };

        settings.save_to_file(&path).expect("save");
        let loaded = Settings::load_from_file(&path).expect("load");

        assert_eq!(loaded, settings);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"api_key": "abc"}"#).expect("write");

        let loaded = Settings::load_from_file(&path).expect("load");

        assert_eq!(loaded.api_key.as_deref(), Some("abc"));
        assert_eq!(loaded.model, DEFAULT_MODEL);
        assert_eq!(loaded.language, "English");
    }

    #[test]
    fn missing_file_quietly_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");

        let (settings, error) = Settings::load_or_default_from(dir.path().join("settings.json"));

        assert_eq!(settings, Settings::default());
        assert!(error.is_none());
    }

    #[test]
    fn malformed_file_is_reported_alongside_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"api_key": 42}"#).expect("write");

        let (settings, error) = Settings::load_or_default_from(&path);

        assert_eq!(settings, Settings::default());
        assert_eq!(error.map(|e| e.kind()), Some(io::ErrorKind::InvalidData));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").expect("write");

        assert!(Settings::load_from_file(&path).is_err());
    }
}
