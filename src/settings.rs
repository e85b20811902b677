// ⚙️ Settings - user preferences stored as JSON

use anyhow::{bail, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Environment variable overriding the settings file location
pub const CONFIG_ENV: &str = "CARD_WALLET_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "card-wallet.json";

/// Keys accepted by [`Settings::set`], matching the JSON field names
pub const KEYS: [&str; 5] = [
    "darkMode",
    "biometricEnabled",
    "notificationsEnabled",
    "autoLock",
    "offlineMode",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub dark_mode: bool,
    pub biometric_enabled: bool,
    pub notifications_enabled: bool,
    pub auto_lock: bool,
    pub offline_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            dark_mode: true,
            biometric_enabled: true,
            notifications_enabled: true,
            auto_lock: true,
            offline_mode: true,
        }
    }
}

impl Settings {
    /// `$CARD_WALLET_CONFIG` if set, else `./card-wallet.json`
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Settings> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No settings at {:?}, using defaults", path);
                return Ok(Settings::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Error reading settings file {:?}", path))
            }
        };
        serde_json::from_str(&content)
            .with_context(|| format!("Error de-serialising settings file {:?}", path))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Error ensuring path {:?} exists", parent))?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Error writing settings file {:?}", path))
    }

    /// Flip one preference by its JSON key
    pub fn set(&mut self, key: &str, enabled: bool) -> Result<()> {
        let slot = match key {
            "darkMode" => &mut self.dark_mode,
            "biometricEnabled" => &mut self.biometric_enabled,
            "notificationsEnabled" => &mut self.notifications_enabled,
            "autoLock" => &mut self.auto_lock,
            "offlineMode" => &mut self.offline_mode,
            other => bail!("Unknown setting '{}' (expected one of: {})", other, KEYS.join(", ")),
        };
        *slot = enabled;
        debug!("Setting {} = {}", key, enabled);
        Ok(())
    }

    /// (label, enabled) pairs for display
    pub fn entries(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("Dark Mode", self.dark_mode),
            ("Biometric Unlock", self.biometric_enabled),
            ("Notifications", self.notifications_enabled),
            ("Auto-Lock", self.auto_lock),
            ("Offline Mode", self.offline_mode),
        ]
    }
}

/// Parse a toggle value: on/off, true/false, yes/no, 1/0
pub fn parse_toggle(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => bail!("Expected on or off, got '{}'", other),
    }
}
