use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::models::AdapterKind;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserSettings {
    pub auto_snap: bool,
    pub auto_snap_interval_minutes: u64,
    pub close_others_on_restore: bool,
    pub ai_suggestions: bool,
    pub auto_execute: bool,
    pub auto_execute_threshold: f64,
    pub max_contexts: usize,
    pub enabled_adapters: Vec<String>,
    pub launch_settle_ms: u64,
    pub adapter_settle_ms: u64,
    pub focus_blocked_apps: Vec<String>,
    pub daily_goal_minutes: u64,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            auto_snap: false,
            auto_snap_interval_minutes: 30,
            close_others_on_restore: false,
            ai_suggestions: true,
            auto_execute: false,
            auto_execute_threshold: 0.8,
            max_contexts: 50,
            enabled_adapters: vec!["editor".into(), "browser".into(), "terminal".into()],
            launch_settle_ms: 2000,
            adapter_settle_ms: 500,
            focus_blocked_apps: vec![
                "Slack".into(),
                "Discord".into(),
                "Telegram".into(),
                "WhatsApp".into(),
                "Twitter".into(),
                "Messages".into(),
            ],
            daily_goal_minutes: 360,
        }
    }
}

impl UserSettings {
    /// Unknown names are ignored.
    pub fn adapter_kinds(&self) -> Vec<AdapterKind> {
        self.enabled_adapters
            .iter()
            .filter_map(|name| AdapterKind::from_name(name))
            .filter(|kind| *kind != AdapterKind::Generic)
            .collect()
    }

    /// Settle delays, shortened when `CONTEXT_FLOW_DEBUG` is set.
    pub fn restore_timing(&self) -> RestoreTiming {
        let debug_mode = std::env::var("CONTEXT_FLOW_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if debug_mode {
            RestoreTiming {
                launch_settle: Duration::from_millis(self.launch_settle_ms.min(200)),
                adapter_settle: Duration::from_millis(self.adapter_settle_ms.min(50)),
            }
        } else {
            RestoreTiming {
                launch_settle: Duration::from_millis(self.launch_settle_ms),
                adapter_settle: Duration::from_millis(self.adapter_settle_ms),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreTiming {
    pub launch_settle: Duration,
    pub adapter_settle: Duration,
}

impl RestoreTiming {
    pub fn immediate() -> Self {
        Self {
            launch_settle: Duration::ZERO,
            adapter_settle: Duration::ZERO,
        }
    }
}

impl Default for RestoreTiming {
    fn default() -> Self {
        UserSettings::default().restore_timing()
    }
}

/// `~/.context-flow`, or the working directory when no home is known.
pub fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".context-flow"))
        .unwrap_or_else(|| PathBuf::from(".context-flow"))
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    /// Missing or unreadable settings fall back to defaults.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring corrupt settings at {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> UserSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: UserSettings) -> Result<UserSettings> {
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings.clone();
        Ok(settings)
    }

    /// Applies `change` to a copy and persists it.
    pub fn update_with<F>(&self, change: F) -> Result<UserSettings>
    where
        F: FnOnce(&mut UserSettings),
    {
        let mut next = self.get();
        change(&mut next);
        self.update(next)
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "{not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.get(), UserSettings::default());
    }

    #[test]
    fn updates_persist_and_partial_files_fill_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{"max_contexts": 5}"#).unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.get().max_contexts, 5);
        assert_eq!(store.get().launch_settle_ms, 2000);

        store.update_with(|s| s.auto_snap = true).unwrap();
        let reloaded = SettingsStore::new(path).unwrap();
        assert!(reloaded.get().auto_snap);
        assert_eq!(reloaded.get().max_contexts, 5);
    }

    #[test]
    fn unknown_adapter_names_are_ignored() {
        let settings = UserSettings {
            enabled_adapters: vec!["terminal".into(), "spreadsheet".into(), "generic".into()],
            ..UserSettings::default()
        };
        assert_eq!(settings.adapter_kinds(), vec![AdapterKind::Terminal]);
    }
}
