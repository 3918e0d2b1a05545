/*
 *  display/console.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Terminal render surface and fullscreen shell
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

use log::debug;
use std::io::{self, IsTerminal, Write};

use crate::display::board::SlotBoard;
use crate::display::error::{DisplayError, ShellError};
use crate::display::slots::Slot;
use crate::display::theme::ThemeCatalog;
use crate::display::traits::{HostShell, RenderSurface};

const CLEAR_HOME: &str = "\x1b[H\x1b[2J";
const ALT_SCREEN_ON: &str = "\x1b[?1049h\x1b[?25l";
const ALT_SCREEN_OFF: &str = "\x1b[?25h\x1b[?1049l";

/// Terminal rendition of the page: the slot board redrawn as a text frame
/// whenever something changed.
pub struct ConsoleSurface {
    board: SlotBoard,
    out: Box<dyn Write>,
    dirty: bool,
    ansi: bool,
}

impl ConsoleSurface {
    pub fn stdout() -> Self {
        let ansi = io::stdout().is_terminal();
        Self::new(SlotBoard::full(), Box::new(io::stdout()), ansi)
    }

    pub fn new(board: SlotBoard, out: Box<dyn Write>, ansi: bool) -> Self {
        Self { board, out, dirty: true, ansi }
    }

    pub fn board(&self) -> &SlotBoard {
        &self.board
    }

    fn line(&self, parts: &[(Slot, &str)]) -> String {
        parts.iter()
            .filter(|(slot, _)| self.board.has_slot(*slot) && !self.board.text(*slot).is_empty())
            .map(|(slot, label)| format!("{}{}", label, self.board.text(*slot)))
            .collect::<Vec<_>>()
            .join("  ·  ")
    }

    /// The frame as plain lines.
    pub fn frame(&self) -> Vec<String> {
        let b = &self.board;
        let mut lines = vec![
            self.line(&[(Slot::DayName, ""), (Slot::TimePeriod, "")]),
            format!("    {}", b.text(Slot::TimeDisplay)),
            self.line(&[(Slot::DateDisplay, "")]),
            self.line(&[(Slot::TimezoneDisplay, ""), (Slot::CityDisplay, "")]),
            String::new(),
            format!("{} {}  {}", b.text(Slot::WeatherIcon), b.text(Slot::Temperature), b.text(Slot::WeatherDescription)),
            self.line(&[(Slot::Location, "")]),
            self.line(&[
                (Slot::FeelsLike, "Feels like "),
                (Slot::Humidity, "Humidity "),
                (Slot::WindSpeed, "Wind "),
            ]),
            self.line(&[
                (Slot::Pressure, "Pressure "),
                (Slot::UvIndex, "UV "),
                (Slot::Visibility, "Visibility "),
            ]),
            self.line(&[(Slot::WeatherUpdateTime, "")]),
            String::new(),
        ];
        if !b.text(Slot::ThemePanel).is_empty() || b.has_slot(Slot::StyleDropdown) {
            let minimized = b.text(Slot::ThemePanel).starts_with("minimized");
            let panel = if minimized {
                format!("[{}]", b.text(Slot::MinimizeButton))
            } else {
                let style = b.text(Slot::StyleDropdown);
                format!("[{}] {}  {}  {}",
                    b.text(Slot::MinimizeButton),
                    ThemeCatalog::default().name_for(style).unwrap_or(style),
                    b.text(Slot::AutoRotateStatus),
                    b.text(Slot::ViewClass))
            };
            lines.push(panel);
        }
        let note = b.text(Slot::Notification);
        if !note.is_empty() {
            lines.push(format!("> {}", note));
        }
        lines
    }
}

impl RenderSurface for ConsoleSurface {
    fn has_slot(&self, slot: Slot) -> bool {
        self.board.has_slot(slot)
    }

    fn read(&self, slot: Slot) -> Option<String> {
        self.board.read(slot)
    }

    fn write(&mut self, slot: Slot, text: &str) -> bool {
        let before = self.board.writes;
        let ok = self.board.write(slot, text);
        self.dirty |= self.board.writes != before;
        ok
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        if !self.dirty {
            return Ok(());
        }
        let mut frame = String::new();
        if self.ansi {
            frame.push_str(CLEAR_HOME);
        }
        for line in self.frame() {
            frame.push_str(&line);
            frame.push('\n');
        }
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()?;
        self.board.flushes += 1;
        self.dirty = false;
        Ok(())
    }
}

/// Fullscreen for a terminal means the alternate screen buffer.
pub struct TerminalShell {
    out: Box<dyn Write>,
    supported: bool,
    active: bool,
}

impl TerminalShell {
    pub fn stdout() -> Self {
        let supported = io::stdout().is_terminal();
        Self::new(Box::new(io::stdout()), supported)
    }

    pub fn new(out: Box<dyn Write>, supported: bool) -> Self {
        Self { out, supported, active: false }
    }
}

impl HostShell for TerminalShell {
    fn supports_fullscreen(&self) -> bool {
        self.supported
    }

    fn is_fullscreen(&self) -> bool {
        self.active
    }

    fn request_fullscreen(&mut self) -> Result<(), ShellError> {
        if !self.supported {
            return Err(ShellError::Unsupported);
        }
        self.out.write_all(ALT_SCREEN_ON.as_bytes())?;
        self.out.flush()?;
        self.active = true;
        debug!("Entered alternate screen");
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), ShellError> {
        if !self.active {
            return Ok(());
        }
        self.out.write_all(ALT_SCREEN_OFF.as_bytes())?;
        self.out.flush()?;
        self.active = false;
        debug!("Left alternate screen");
        Ok(())
    }
}

impl Drop for TerminalShell {
    fn drop(&mut self) {
        let _ = self.exit_fullscreen();
    }
}
