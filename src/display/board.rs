/*
 *  display/board.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  In-memory render surface
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

use std::collections::{BTreeMap, BTreeSet};

use crate::display::slots::Slot;
use crate::display::traits::RenderSurface;

/// In-memory render surface
///
/// Holds the text of each slot it was built with and nothing else. Used by
/// tests, by `--once`, and as the backing store of the console surface.
#[derive(Debug, Clone, Default)]
pub struct SlotBoard {
    present: BTreeSet<Slot>,
    text: BTreeMap<Slot, String>,
    /// Number of writes that changed a value
    pub writes: usize,
    /// Number of flush calls
    pub flushes: usize,
}

impl SlotBoard {
    /// Board with every known slot.
    pub fn full() -> Self {
        Self::with_slots(Slot::REQUIRED.iter().chain(Slot::OPTIONAL.iter()).copied())
    }

    /// Board with exactly the required slots.
    pub fn required_only() -> Self {
        Self::with_slots(Slot::REQUIRED)
    }

    pub fn with_slots(slots: impl IntoIterator<Item = Slot>) -> Self {
        Self { present: slots.into_iter().collect(), ..Default::default() }
    }

    /// Same board minus one slot.
    pub fn without(mut self, slot: Slot) -> Self {
        self.present.remove(&slot);
        self.text.remove(&slot);
        self
    }

    /// Text of a slot, empty when absent or never written.
    pub fn text(&self, slot: Slot) -> &str {
        self.text.get(&slot).map(String::as_str).unwrap_or("")
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.present.iter().copied()
    }
}

impl RenderSurface for SlotBoard {
    fn has_slot(&self, slot: Slot) -> bool {
        self.present.contains(&slot)
    }

    fn read(&self, slot: Slot) -> Option<String> {
        if !self.has_slot(slot) {
            return None;
        }
        Some(self.text(slot).to_string())
    }

    fn write(&mut self, slot: Slot, text: &str) -> bool {
        if !self.has_slot(slot) {
            return false;
        }
        if self.text.get(&slot).map(String::as_str) != Some(text) {
            self.text.insert(slot, text.to_string());
            self.writes += 1;
        }
        true
    }

    fn flush(&mut self) -> Result<(), crate::display::DisplayError> {
        self.flushes += 1;
        Ok(())
    }
}
