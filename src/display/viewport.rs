/*
 *  display/viewport.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Viewport size classes
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

use std::fmt;

use crate::constants::{MOBILE_MAX_WIDTH, TABLET_MAX_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280, height: 800 }
    }
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn class(&self) -> ViewClass {
        ViewClass::classify(self.width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewClass {
    Mobile,
    Tablet,
    Desktop,
}

impl ViewClass {
    /// Breakpoints are inclusive: 768 is mobile, 1024 is tablet.
    pub fn classify(width: u32) -> Self {
        if width <= MOBILE_MAX_WIDTH {
            ViewClass::Mobile
        } else if width <= TABLET_MAX_WIDTH {
            ViewClass::Tablet
        } else {
            ViewClass::Desktop
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            ViewClass::Mobile => "mobile-view",
            ViewClass::Tablet => "tablet-view",
            ViewClass::Desktop => "desktop-view",
        }
    }
}

impl fmt::Display for ViewClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoints_are_inclusive() {
        assert_eq!(ViewClass::classify(320), ViewClass::Mobile);
        assert_eq!(ViewClass::classify(768), ViewClass::Mobile);
        assert_eq!(ViewClass::classify(769), ViewClass::Tablet);
        assert_eq!(ViewClass::classify(1024), ViewClass::Tablet);
        assert_eq!(ViewClass::classify(1025), ViewClass::Desktop);
        assert_eq!(Viewport::new(1920, 1080).class().marker(), "desktop-view");
    }
}
