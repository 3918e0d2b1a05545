/*
 *  weather_glyph.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Weather codes to descriptions and glyphs
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

use crate::constants::FALLBACK_ICON;

/// WMO weather interpretation code (Open-Meteo) to a short description.
pub fn describe_wmo(code: i64) -> &'static str {
    match code {
        0 => "Clear Sky",
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing Drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing Rain",
        71 | 73 | 75 => "Snow",
        77 => "Snow Grains",
        80 | 81 | 82 => "Rain Showers",
        85 | 86 => "Snow Showers",
        95 | 96 | 99 => "Thunderstorm",
        _ => "Unknown",
    }
}

/// WMO weather interpretation code to a display glyph.
pub fn glyph_wmo(code: i64) -> &'static str {
    match code {
        0 | 1 => "☀️",
        2 => "⛅",
        3 => "☁️",
        45 | 48 => "🌫️",
        51 | 53 | 55 | 56 | 57 => "🌧️",
        61 | 63 | 65 | 66 | 67 => "🌧️",
        71 | 73 | 75 | 77 | 85 | 86 => "❄️",
        80 | 81 | 82 => "🌧️",
        95 | 96 | 99 => "⛈️",
        _ => FALLBACK_ICON,
    }
}

/// OpenWeatherMap `weather[0].main` group to a display glyph.
pub fn glyph_owm(group: &str) -> &'static str {
    match group {
        "Clear" => "☀️",
        "Clouds" => "☁️",
        "Rain" => "🌧️",
        "Drizzle" => "🌦️",
        "Thunderstorm" => "⛈️",
        "Snow" => "❄️",
        "Mist" | "Fog" | "Haze" => "🌫️",
        _ => FALLBACK_ICON,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wmo_codes_share_groups() {
        assert_eq!(describe_wmo(0), "Clear Sky");
        assert_eq!(describe_wmo(48), "Fog");
        assert_eq!(describe_wmo(86), "Snow Showers");
        assert_eq!(glyph_wmo(96), "⛈️");
        assert_eq!(glyph_wmo(75), "❄️");
    }

    #[test]
    fn unmapped_codes_fall_back() {
        assert_eq!(describe_wmo(4), "Unknown");
        assert_eq!(glyph_wmo(-1), FALLBACK_ICON);
        assert_eq!(glyph_owm("Tornado"), FALLBACK_ICON);
        assert_eq!(glyph_owm("Haze"), "🌫️");
    }
}
