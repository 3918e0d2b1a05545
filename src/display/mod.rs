/*
 *  display/mod.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - render targets, themes, panel and the controller
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod slots;

// Render surfaces
pub mod board;
pub mod console;

// Presentation state
pub mod clock;
pub mod theme;
pub mod rotation;
pub mod panel;
pub mod viewport;

// Input
pub mod keys;
pub mod events;

// Display controller
pub mod controller;

// Re-exports for convenience
pub use traits::{HostShell, RenderSurface, SystemWallClock, WallClock};
pub use error::{DisplayError, ShellError};
pub use slots::Slot;
pub use board::SlotBoard;
pub use console::{ConsoleSurface, TerminalShell};
pub use theme::{Theme, ThemeCatalog};
pub use controller::{ControllerOptions, DisplayController, Phase, ThemeOrigin};
pub use events::{parse_console_line, Event};
