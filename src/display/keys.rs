/*
 *  display/keys.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Keyboard shortcut dispatch
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

/// Where keyboard focus sits when a key arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    #[default]
    Document,
    /// text input or textarea, shortcuts stay out of the way
    TextInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: String,
    pub focus: FocusTarget,
}

impl KeyInput {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), focus: FocusTarget::Document }
    }

    pub fn in_text_input(key: impl Into<String>) -> Self {
        Self { key: key.into(), focus: FocusTarget::TextInput }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    CycleTheme,
    ToggleFullscreen,
    RefreshWeather,
    SelectTheme(usize),
}

/// Map a key to its action. Digits and `-`/`=` pick themes directly when
/// `numeric` is on.
pub fn dispatch(input: &KeyInput, numeric: bool) -> Option<Shortcut> {
    if input.focus == FocusTarget::TextInput {
        return None;
    }
    let key = input.key.as_str();
    match key.to_ascii_lowercase().as_str() {
        "t" => return Some(Shortcut::CycleTheme),
        "f" => return Some(Shortcut::ToggleFullscreen),
        "r" => return Some(Shortcut::RefreshWeather),
        _ => {}
    }
    if !numeric {
        return None;
    }
    match key {
        "0" => Some(Shortcut::SelectTheme(9)),
        "-" => Some(Shortcut::SelectTheme(10)),
        "=" => Some(Shortcut::SelectTheme(11)),
        d if d.len() == 1 => d.parse::<usize>().ok()
            .filter(|n| (1..=9).contains(n))
            .map(|n| Shortcut::SelectTheme(n - 1)),
        _ => None,
    }
}
