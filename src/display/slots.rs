/*
 *  display/slots.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Render target identifiers
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

/// Every render target the controller knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    DayName,
    TimePeriod,
    TimeDisplay,
    DateDisplay,
    TimezoneDisplay,
    CityDisplay,
    WeatherIcon,
    Temperature,
    WeatherDescription,
    Location,
    FeelsLike,
    Humidity,
    WindSpeed,
    Visibility,
    WeatherUpdateTime,
    // optional from here on
    Pressure,
    UvIndex,
    MainStyle,
    StyleDropdown,
    AutoRotate,
    AutoRotateStatus,
    FullscreenToggle,
    ThemePanel,
    MinimizeButton,
    Notification,
    ViewClass,
    FullscreenState,
}

impl Slot {
    /// Targets that must exist for the view to start.
    pub const REQUIRED: [Slot; 15] = [
        Slot::DayName,
        Slot::TimePeriod,
        Slot::TimeDisplay,
        Slot::DateDisplay,
        Slot::TimezoneDisplay,
        Slot::CityDisplay,
        Slot::WeatherIcon,
        Slot::Temperature,
        Slot::WeatherDescription,
        Slot::Location,
        Slot::FeelsLike,
        Slot::Humidity,
        Slot::WindSpeed,
        Slot::Visibility,
        Slot::WeatherUpdateTime,
    ];

    pub const OPTIONAL: [Slot; 12] = [
        Slot::Pressure,
        Slot::UvIndex,
        Slot::MainStyle,
        Slot::StyleDropdown,
        Slot::AutoRotate,
        Slot::AutoRotateStatus,
        Slot::FullscreenToggle,
        Slot::ThemePanel,
        Slot::MinimizeButton,
        Slot::Notification,
        Slot::ViewClass,
        Slot::FullscreenState,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Slot::DayName => "day-name",
            Slot::TimePeriod => "time-period",
            Slot::TimeDisplay => "time-display",
            Slot::DateDisplay => "date-display",
            Slot::TimezoneDisplay => "timezone-display",
            Slot::CityDisplay => "city-display",
            Slot::WeatherIcon => "weather-icon",
            Slot::Temperature => "temperature",
            Slot::WeatherDescription => "weather-description",
            Slot::Location => "location",
            Slot::FeelsLike => "feels-like",
            Slot::Humidity => "humidity",
            Slot::WindSpeed => "wind-speed",
            Slot::Visibility => "visibility",
            Slot::WeatherUpdateTime => "weather-update-time",
            Slot::Pressure => "pressure",
            Slot::UvIndex => "uv-index",
            Slot::MainStyle => "main-style",
            Slot::StyleDropdown => "style-dropdown",
            Slot::AutoRotate => "auto-rotate",
            Slot::AutoRotateStatus => "auto-rotate-status",
            Slot::FullscreenToggle => "fullscreen-toggle",
            Slot::ThemePanel => "theme-panel",
            Slot::MinimizeButton => "minimize-btn",
            Slot::Notification => "notification",
            Slot::ViewClass => "view-class",
            Slot::FullscreenState => "fullscreen-state",
        }
    }

    pub fn from_id(id: &str) -> Option<Slot> {
        Slot::REQUIRED.iter().chain(Slot::OPTIONAL.iter()).copied().find(|s| s.id() == id)
    }

    pub fn is_required(self) -> bool {
        Slot::REQUIRED.contains(&self)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
