/*
 *  lib.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Library root, the binary and the integration tests build on this
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

pub mod config;
pub mod constants;
pub mod func_timer;
pub mod pacer;
pub mod hardening;
pub mod sanitize;
pub mod prefs;

// weather acquisition
pub mod weather;
pub mod weather_glyph;
pub mod location;
pub mod geoloc;
pub mod providers;
pub mod pipeline;

pub mod display;
pub mod runtime;
