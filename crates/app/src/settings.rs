//! Settings loading for the console.
//!
//! Settings live in `settings.json` under the platform config directory. A
//! missing or broken file is never fatal: the console starts on defaults and
//! logs why.

use shared::console::GeoLocation;
use shared::settings::{self, ConsoleSettings};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn config_path() -> Option<PathBuf> {
    let proj = directories::ProjectDirs::from("com.local", "Arise", "AriseConsole")?;
    let _ = fs::create_dir_all(proj.config_dir());
    Some(proj.config_dir().join("settings.json"))
}

/// Read settings from `path`. Returns the settings and whether defaults were
/// used because no usable file was found.
pub fn load_settings_from(path: &Path) -> (ConsoleSettings, bool) {
    if !path.exists() {
        return (ConsoleSettings::default(), true);
    }
    let parsed = fs::read(path)
        .map_err(shared::ConsoleError::from)
        .and_then(|bytes| {
            serde_json::from_slice::<ConsoleSettings>(&bytes).map_err(shared::ConsoleError::from)
        })
        .and_then(|s| s.validate().map(|_| s));
    match parsed {
        Ok(s) => {
            info!(path = %path.display(), "settings loaded");
            (s, false)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unusable settings file");
            (ConsoleSettings::default(), true)
        }
    }
}

/// Load settings from the config directory and apply `ARISE_*` overrides.
pub fn load_settings_or_default() -> ConsoleSettings {
    let (mut settings, _fresh) = match config_path() {
        Some(path) => load_settings_from(&path),
        None => (ConsoleSettings::default(), true),
    };
    if let Err(e) = settings.apply_overrides(|key| std::env::var(key).ok()) {
        warn!(error = %e, "ignoring environment override");
    }
    settings
}

/// Best-effort observer position, read once at startup. Environment wins
/// over the settings file; any failure just means no location.
pub fn resolve_location<F>(settings: &ConsoleSettings, lookup: F) -> Option<GeoLocation>
where
    F: Fn(&str) -> Option<String>,
{
    match settings::location_from(lookup) {
        Ok(Some(loc)) => Some(loc),
        Ok(None) => settings.location,
        Err(e) => {
            warn!(error = %e, "spatial core: geolocation anchored to static observer");
            settings.location
        }
    }
}
