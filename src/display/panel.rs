/*
 *  display/panel.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Draggable, minimizable theme panel
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

use serde::{Deserialize, Serialize};

use crate::display::viewport::Viewport;

/// Top-left corner of the settings panel, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PanelPosition {
    pub x: i32,
    pub y: i32,
}

/// What the pointer landed on when a drag began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Panel,
    /// select, input, button or link inside the panel
    Control,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Drag {
    grab_dx: i32,
    grab_dy: i32,
}

/// Draggable, minimizable settings panel kept inside the viewport.
#[derive(Debug, Clone)]
pub struct ThemePanel {
    position: PanelPosition,
    width: u32,
    height: u32,
    minimized: bool,
    drag: Option<Drag>,
}

impl ThemePanel {
    pub fn new(width: u32, height: u32) -> Self {
        Self { position: PanelPosition::default(), width, height, minimized: false, drag: None }
    }

    pub fn position(&self) -> PanelPosition {
        self.position
    }

    pub fn set_position(&mut self, position: PanelPosition) {
        self.position = position;
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn set_minimized(&mut self, minimized: bool) {
        self.minimized = minimized;
    }

    pub fn toggle_minimize(&mut self) -> bool {
        self.minimized = !self.minimized;
        self.minimized
    }

    /// Glyph for the minimize button in the current state.
    pub fn minimize_glyph(&self) -> &'static str {
        if self.minimized { "+" } else { "−" }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Returns false, and ignores the pointer, when it landed on a control.
    pub fn begin_drag(&mut self, x: i32, y: i32, target: PointerTarget) -> bool {
        if target == PointerTarget::Control {
            return false;
        }
        self.drag = Some(Drag {
            grab_dx: x.saturating_sub(self.position.x),
            grab_dy: y.saturating_sub(self.position.y),
        });
        true
    }

    pub fn drag_to(&mut self, x: i32, y: i32, viewport: Viewport) -> Option<PanelPosition> {
        let drag = self.drag?;
        self.position = PanelPosition { x: x.saturating_sub(drag.grab_dx), y: y.saturating_sub(drag.grab_dy) };
        self.clamp(viewport);
        Some(self.position)
    }

    /// Ends a drag and hands back the final position to persist.
    pub fn end_drag(&mut self) -> Option<PanelPosition> {
        self.drag.take().map(|_| self.position)
    }

    /// Pull the panel back inside `[0, viewport - panel]`. True if it moved.
    pub fn clamp(&mut self, viewport: Viewport) -> bool {
        let max_x = (viewport.width as i64 - self.width as i64).max(0) as i32;
        let max_y = (viewport.height as i64 - self.height as i64).max(0) as i32;
        let clamped = PanelPosition {
            x: self.position.x.min(max_x).max(0),
            y: self.position.y.min(max_y).max(0),
        };
        let moved = clamped != self.position;
        self.position = clamped;
        moved
    }
}
