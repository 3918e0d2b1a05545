/*
 *  display/traits.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Render surface, host shell and wall clock abstractions
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

use chrono::{DateTime, Utc};

use crate::display::error::{DisplayError, ShellError};
use crate::display::slots::Slot;

/// Named text targets the controller renders into
///
/// The surface is the only thing the controller knows about the page. A slot
/// that does not exist is simply absent: writes to it are dropped and reads
/// return `None`.
pub trait RenderSurface {
    /// Whether the target exists on this surface
    fn has_slot(&self, slot: Slot) -> bool;

    /// Current text of a target
    fn read(&self, slot: Slot) -> Option<String>;

    /// Replace the text of a target, returns false if it does not exist
    fn write(&mut self, slot: Slot, text: &str) -> bool;

    /// Push pending changes to the physical output
    ///
    /// In-memory surfaces have nothing to push.
    fn flush(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }
}

/// Optional host integration for fullscreen
pub trait HostShell {
    fn supports_fullscreen(&self) -> bool;
    fn is_fullscreen(&self) -> bool;
    fn request_fullscreen(&mut self) -> Result<(), ShellError>;
    fn exit_fullscreen(&mut self) -> Result<(), ShellError>;
}

/// Source of the current instant, swapped for a fixed one in tests
pub trait WallClock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant; tests move it with `set`.
#[derive(Debug, Clone)]
pub struct FixedWallClock {
    at: std::rc::Rc<std::cell::Cell<DateTime<Utc>>>,
}

impl FixedWallClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at: std::rc::Rc::new(std::cell::Cell::new(at)) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.at.set(at);
    }
}

impl WallClock for FixedWallClock {
    fn now(&self) -> DateTime<Utc> {
        self.at.get()
    }
}
