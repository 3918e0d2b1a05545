/*
 *  display/error.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display error types
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

use std::error::Error;
use std::fmt;

/// Errors raised by the display controller
#[derive(Debug)]
pub enum DisplayError {
    /// Required render targets are absent, the view cannot run
    MissingTargets(Vec<&'static str>),

    /// Theme identifier is not in the catalog
    UnknownTheme(String),

    /// Numeric theme shortcut past the end of the catalog
    ThemeIndexOutOfRange(usize),

    /// Operation needs a running controller
    NotRunning,

    /// Render surface could not be flushed
    Io(std::io::Error),

    /// Generic error with message
    Other(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::MissingTargets(ids) =>
                write!(f, "Missing required render targets: {}", ids.join(", ")),
            DisplayError::UnknownTheme(id) =>
                write!(f, "Unknown theme: {}", id),
            DisplayError::ThemeIndexOutOfRange(idx) =>
                write!(f, "Theme index {} out of range", idx),
            DisplayError::NotRunning =>
                write!(f, "Display controller is not running"),
            DisplayError::Io(err) =>
                write!(f, "Render surface I/O error: {}", err),
            DisplayError::Other(msg) =>
                write!(f, "{}", msg),
        }
    }
}

impl Error for DisplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DisplayError {
    fn from(err: std::io::Error) -> Self {
        DisplayError::Io(err)
    }
}

/// Host shell failures, reported to the user and never fatal
#[derive(Debug)]
pub enum ShellError {
    /// The host cannot go fullscreen at all
    Unsupported,

    /// The host refused the request
    Denied(String),

    /// Writing the control sequence failed
    Io(std::io::Error),
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::Unsupported => write!(f, "Fullscreen not supported"),
            ShellError::Denied(msg) => write!(f, "Fullscreen request denied: {}", msg),
            ShellError::Io(err) => write!(f, "Fullscreen I/O error: {}", err),
        }
    }
}

impl Error for ShellError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ShellError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ShellError {
    fn from(err: std::io::Error) -> Self {
        ShellError::Io(err)
    }
}
