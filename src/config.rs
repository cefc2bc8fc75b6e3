use crate::charts::TopArtistCount;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "streamdash";
const PREFERENCES_FILE: &str = "preferences.json";
const LOG_FILE: &str = "streamdash.log";
const DEFAULT_EXAMPLE_PATH: &str = "data.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_top_artists")]
    pub top_artists: usize,
    #[serde(default)]
    pub first_year: Option<i32>,
    #[serde(default = "default_example_path")]
    pub example_path: PathBuf,
    #[serde(default)]
    pub last_inputs: Vec<PathBuf>,
    #[serde(default)]
    pub theme: Theme,
}

fn default_top_artists() -> usize {
    TopArtistCount::DEFAULT
}

fn default_example_path() -> PathBuf {
    PathBuf::from(DEFAULT_EXAMPLE_PATH)
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            top_artists: default_top_artists(),
            first_year: None,
            example_path: default_example_path(),
            last_inputs: Vec::new(),
            theme: Theme::default(),
        }
    }
}

impl Preferences {
    pub fn top_artist_count(&self) -> TopArtistCount {
        TopArtistCount::clamped(self.top_artists)
    }
}

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("STREAMDASH_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn preferences_path() -> Result<PathBuf> {
    Ok(config_root()?.join(PREFERENCES_FILE))
}

pub fn log_path() -> Result<PathBuf> {
    Ok(config_root()?.join(LOG_FILE))
}

pub fn ensure_config_dir() -> Result<PathBuf> {
    let root = config_root()?;
    fs::create_dir_all(&root).with_context(|| format!("failed to create {}", root.display()))?;
    Ok(root)
}

pub fn load_preferences() -> Result<Preferences> {
    load_preferences_from(&preferences_path()?)
}

pub fn save_preferences(preferences: &Preferences) -> Result<()> {
    ensure_config_dir()?;
    save_preferences_to(&preferences_path()?, preferences)
}

fn load_preferences_from(path: &Path) -> Result<Preferences> {
    if !path.exists() {
        return Ok(Preferences::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read preferences file {}", path.display()))?;
    let mut preferences: Preferences = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse preferences file {}", path.display()))?;
    preferences.top_artists = preferences.top_artist_count().get();
    Ok(preferences)
}

fn save_preferences_to(path: &Path, preferences: &Preferences) -> Result<()> {
    let json = serde_json::to_string_pretty(preferences)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn normalize_path(path: &Path) -> PathBuf {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    strip_windows_verbatim_prefix(&canonical)
}

pub fn strip_windows_verbatim_prefix(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();

    if let Some(trimmed) = raw.strip_prefix(r"\\?\UNC\") {
        return PathBuf::from(format!(r"\\{trimmed}"));
    }

    if let Some(trimmed) = raw.strip_prefix(r"\\?\") {
        return PathBuf::from(trimmed);
    }

    path.to_path_buf()
}
