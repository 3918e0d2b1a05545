/*
 *  prefs.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Persisted user preferences
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::display::panel::PanelPosition;

pub const KEY_SELECTED_STYLE: &str = "selectedStyle";
pub const KEY_AUTO_ROTATE: &str = "autoRotateThemes";
pub const KEY_PANEL_POSITION: &str = "themePanelPosition";
pub const KEY_PANEL_MINIMIZED: &str = "themePanelMinimized";

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("preference I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("preference encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("preference store is read-only")]
    ReadOnly,
}

/// Small string key/value persistence, survives restarts.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError>;
}

/// Volatile store for tests and `--prefs none`.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that refuses every write, reads still work.
    pub fn read_only(values: &[(&str, &str)]) -> Self {
        let mut store = Self::with_values(values);
        store.read_only = true;
        store
    }

    pub fn with_values(values: &[(&str, &str)]) -> Self {
        Self {
            values: values.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            read_only: false,
        }
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        if self.read_only {
            return Err(PrefsError::ReadOnly);
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object on disk, rewritten whole on each change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// `~/.config/atomclock/prefs.json` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|d| d.join("atomclock").join("prefs.json"))
    }

    /// Opens the store, an unreadable or corrupt file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("Ignoring corrupt preferences {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        debug!("Loaded {} preferences from {}", values.len(), path.display());
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), PrefsError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&self.values)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        let previous = self.values.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist() {
            // keep memory in line with disk
            match previous {
                Some(v) => self.values.insert(key.to_string(), v),
                None => self.values.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

/// Typed view of the persisted keys, read once at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preferences {
    pub selected_style: Option<String>,
    pub auto_rotate: Option<bool>,
    pub panel_position: Option<PanelPosition>,
    pub panel_minimized: Option<bool>,
}

impl Preferences {
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let flag = |key: &str| match store.get(key).as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        };
        let panel_position = store.get(KEY_PANEL_POSITION).and_then(|raw| {
            serde_json::from_str::<PanelPosition>(&raw)
                .map_err(|e| warn!("Bad {} value {:?}: {}", KEY_PANEL_POSITION, raw, e))
                .ok()
        });
        Self {
            selected_style: store.get(KEY_SELECTED_STYLE).filter(|s| !s.is_empty()),
            auto_rotate: flag(KEY_AUTO_ROTATE),
            panel_position,
            panel_minimized: flag(KEY_PANEL_MINIMIZED),
        }
    }
}

pub fn flag_value(on: bool) -> &'static str {
    if on { "true" } else { "false" }
}
