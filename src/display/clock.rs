/*
 *  display/clock.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Clock text in the reference timezone
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

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::constants::{DEFAULT_CITY, DEFAULT_TIMEZONE_LABEL};
use crate::weather::WeatherRecord;

/// Reference zone the kiosk shows, independent of the host's zone.
#[derive(Debug, Clone)]
pub struct ClockSettings {
    pub tz: Tz,
    pub label: String,
    pub city: String,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::New_York,
            label: DEFAULT_TIMEZONE_LABEL.to_string(),
            city: DEFAULT_CITY.to_string(),
        }
    }
}

/// Morning before noon, Afternoon before 17:00, Evening before 21:00.
pub fn time_period(hour: u32) -> &'static str {
    match hour {
        0..=11 => "Morning",
        12..=16 => "Afternoon",
        17..=20 => "Evening",
        _ => "Night",
    }
}

/// Everything the clock slots show for one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    pub time: String,
    pub date: String,
    pub weekday: String,
    pub period: &'static str,
    pub timezone: String,
    pub city: String,
}

impl DisplayState {
    /// Formats `now` in the reference zone. The city of a real weather
    /// record wins over the configured one.
    pub fn compute(now: DateTime<Utc>, settings: &ClockSettings, weather: Option<&WeatherRecord>) -> Self {
        let local = now.with_timezone(&settings.tz);
        let city = weather
            .filter(|w| !w.placeholder && !w.city().is_empty())
            .map(|w| w.city().to_string())
            .unwrap_or_else(|| settings.city.clone());
        Self {
            time: local.format("%I:%M:%S %p").to_string(),
            date: local.format("%B %-d, %Y").to_string(),
            weekday: local.format("%A").to_string(),
            period: time_period(local.hour()),
            timezone: settings.label.clone(),
            city,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_york_morning() {
        // 2024-01-15 09:30:00 EST
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap();
        let state = DisplayState::compute(now, &ClockSettings::default(), None);
        assert_eq!(state.time, "09:30:00 AM");
        assert_eq!(state.date, "January 15, 2024");
        assert_eq!(state.weekday, "Monday");
        assert_eq!(state.period, "Morning");
        assert_eq!(state.timezone, "Eastern Time (Atlanta, GA)");
        assert_eq!(state.city, "Atlanta, Georgia");
    }

    #[test]
    fn reference_zone_not_host_zone() {
        // 03:05 UTC is still the previous evening in New York (EDT)
        let now = Utc.with_ymd_and_hms(2024, 7, 4, 3, 5, 9).unwrap();
        let state = DisplayState::compute(now, &ClockSettings::default(), None);
        assert_eq!(state.time, "11:05:09 PM");
        assert_eq!(state.date, "July 3, 2024");
        assert_eq!(state.weekday, "Wednesday");
        assert_eq!(state.period, "Night");
    }

    #[test]
    fn period_boundaries() {
        assert_eq!(time_period(0), "Morning");
        assert_eq!(time_period(11), "Morning");
        assert_eq!(time_period(12), "Afternoon");
        assert_eq!(time_period(16), "Afternoon");
        assert_eq!(time_period(17), "Evening");
        assert_eq!(time_period(20), "Evening");
        assert_eq!(time_period(21), "Night");
        assert_eq!(time_period(23), "Night");
    }

    #[test]
    fn weather_city_replaces_default_unless_placeholder() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap();
        let mut rec = crate::weather::tests::sample(70);
        rec.location = "Decatur, GA".to_string();
        let state = DisplayState::compute(now, &ClockSettings::default(), Some(&rec));
        assert_eq!(state.city, "Decatur");

        let placeholder = WeatherRecord::placeholder(now);
        let state = DisplayState::compute(now, &ClockSettings::default(), Some(&placeholder));
        assert_eq!(state.city, "Atlanta, Georgia");
    }
}
