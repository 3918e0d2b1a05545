/*
 *  display/events.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Input events and the console command parser
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

use crate::display::keys::KeyInput;
use crate::display::panel::PointerTarget;
use crate::display::viewport::Viewport;

/// Inputs the controller reacts to, whatever the host that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyInput),
    PointerDown { x: i32, y: i32, target: PointerTarget },
    PointerMove { x: i32, y: i32 },
    PointerUp,
    Resize(Viewport),
    OrientationChange(Viewport),
    Visibility { hidden: bool },
    Network { online: bool, slow: bool },
    /// Theme picker selection
    SelectTheme(String),
    /// Auto-rotate checkbox
    SetAutoRotate(bool),
    ToggleMinimize,
    FullscreenButton,
    WeatherClick,
}

fn dims(w: &str, h: &str) -> Option<Viewport> {
    Some(Viewport::new(w.parse().ok()?, h.parse().ok()?))
}

/// Console command language used by the binary's stdin reader.
///
/// Single characters are key presses; longer lines are commands such as
/// `theme styles/ocean.css`, `rotate on`, `resize 800 600` or
/// `drag 10 10 300 200`. Unrecognised lines yield nothing.
pub fn parse_console_line(line: &str) -> Vec<Event> {
    let line = line.trim();
    if line.chars().count() == 1 {
        return vec![Event::Key(KeyInput::new(line))];
    }
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else { return Vec::new() };
    let args: Vec<&str> = words.collect();
    let num = |i: usize| args.get(i).and_then(|v| v.parse::<i32>().ok());

    match (cmd.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("theme", [id]) => vec![Event::SelectTheme(id.to_string())],
        ("rotate", ["on"]) => vec![Event::SetAutoRotate(true)],
        ("rotate", ["off"]) => vec![Event::SetAutoRotate(false)],
        ("min" | "minimize", []) => vec![Event::ToggleMinimize],
        ("fullscreen", []) => vec![Event::FullscreenButton],
        ("weather", []) => vec![Event::WeatherClick],
        ("hide", []) => vec![Event::Visibility { hidden: true }],
        ("show", []) => vec![Event::Visibility { hidden: false }],
        ("online", []) => vec![Event::Network { online: true, slow: false }],
        ("slow", []) => vec![Event::Network { online: true, slow: true }],
        ("offline", []) => vec![Event::Network { online: false, slow: false }],
        ("resize", [w, h]) => dims(w, h).map(Event::Resize).into_iter().collect(),
        ("orient", [w, h]) => dims(w, h).map(Event::OrientationChange).into_iter().collect(),
        ("drag", [_, _, _, _]) => match (num(0), num(1), num(2), num(3)) {
            (Some(x0), Some(y0), Some(x1), Some(y1)) => vec![
                Event::PointerDown { x: x0, y: y0, target: PointerTarget::Panel },
                Event::PointerMove { x: x1, y: y1 },
                Event::PointerUp,
            ],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_and_commands() {
        assert_eq!(parse_console_line("t\n"), vec![Event::Key(KeyInput::new("t"))]);
        assert_eq!(parse_console_line("theme styles/neon.css"), vec![Event::SelectTheme("styles/neon.css".into())]);
        assert_eq!(parse_console_line("rotate off"), vec![Event::SetAutoRotate(false)]);
        assert_eq!(parse_console_line("resize 800 600"), vec![Event::Resize(Viewport::new(800, 600))]);
        assert_eq!(parse_console_line("slow"), vec![Event::Network { online: true, slow: true }]);
    }

    #[test]
    fn drag_expands_to_pointer_sequence() {
        let events = parse_console_line("drag 10 10 300 200");
        assert_eq!(events.len(), 3);
        assert_eq!(events[1], Event::PointerMove { x: 300, y: 200 });
        assert_eq!(events[2], Event::PointerUp);
    }

    #[test]
    fn garbage_is_ignored() {
        assert!(parse_console_line("").is_empty());
        assert!(parse_console_line("resize wide tall").is_empty());
        assert!(parse_console_line("drag 1 2 3").is_empty());
        assert!(parse_console_line("launch missiles").is_empty());
    }
}
