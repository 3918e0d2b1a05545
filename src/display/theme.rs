/*
 *  display/theme.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Theme catalog
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

use log::warn;

use crate::display::error::DisplayError;

/// One selectable stylesheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub path: &'static str,
    pub name: &'static str,
}

pub const THEMES: [Theme; 12] = [
    Theme { path: "style.css", name: "Original" },
    Theme { path: "styles/dark.css", name: "Dark" },
    Theme { path: "styles/ocean.css", name: "Ocean" },
    Theme { path: "styles/sunset.css", name: "Sunset" },
    Theme { path: "styles/forest.css", name: "Forest" },
    Theme { path: "styles/cyberpunk.css", name: "Cyberpunk" },
    Theme { path: "styles/galaxy.css", name: "Galaxy" },
    Theme { path: "styles/aurora.css", name: "Aurora" },
    Theme { path: "styles/vintage.css", name: "Vintage" },
    Theme { path: "styles/minimal.css", name: "Minimal" },
    Theme { path: "styles/neon.css", name: "Neon" },
    Theme { path: "styles/candy.css", name: "Candy" },
];

/// Fixed, ordered theme list with exactly one current entry.
#[derive(Debug, Clone)]
pub struct ThemeCatalog {
    themes: &'static [Theme],
    current: usize,
}

impl Default for ThemeCatalog {
    fn default() -> Self {
        Self { themes: &THEMES, current: 0 }
    }
}

impl ThemeCatalog {
    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &Theme {
        &self.themes[self.current]
    }

    pub fn get(&self, index: usize) -> Option<&Theme> {
        self.themes.get(index)
    }

    /// Index for a theme path. A path that misses falls back to a
    /// case-insensitive display name match ("ocean"), so the picker, the
    /// console `theme` command and `--theme` all share one lookup. Anything
    /// else is `None`.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.themes.iter().position(|t| t.path == id)
            .or_else(|| self.themes.iter().position(|t| t.name.eq_ignore_ascii_case(id)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn set_current(&mut self, index: usize) -> Result<&Theme, DisplayError> {
        if index >= self.themes.len() {
            warn!("Theme index {} out of range", index);
            return Err(DisplayError::ThemeIndexOutOfRange(index));
        }
        self.current = index;
        Ok(&self.themes[index])
    }

    /// Index `direction` steps away from the current one, wrapping both ways.
    pub fn offset(&self, direction: i32) -> usize {
        let len = self.themes.len() as i64;
        (self.current as i64 + direction as i64).rem_euclid(len) as usize
    }

    pub fn name_for(&self, id: &str) -> Option<&'static str> {
        self.index_of(id).map(|i| self.themes[i].name)
    }
}
