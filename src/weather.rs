/*
 *  weather.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Normalized weather record and validation
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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use std::fmt::{self, Display};

use crate::constants::{
    FALLBACK_DESCRIPTION, FALLBACK_ICON, FALLBACK_LOCATION, TEMP_MAX_F, TEMP_MIN_F, UNKNOWN_TEXT,
};

// Custom error type for weather API operations.
#[derive(Debug)]
pub enum WeatherApiError {
    HttpRequestError(reqwest::Error),
    DeserializationError(JsonError),
    ApiError(String),
    ApiKeyError(String),
    InvalidInput(String),
    Timeout(String),
    ValidationFailed(String),
    AllCandidatesFailed(usize),
}

impl Display for WeatherApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherApiError::HttpRequestError(e) => write!(f, "HTTP request error: {}", e),
            WeatherApiError::DeserializationError(e) => write!(f, "JSON deserialization error: {}", e),
            WeatherApiError::ApiError(msg) => write!(f, "Weather API error: {}", msg),
            WeatherApiError::ApiKeyError(msg) => write!(f, "Weather API key required: {}", msg),
            WeatherApiError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            WeatherApiError::Timeout(msg) => write!(f, "Timed out: {}", msg),
            WeatherApiError::ValidationFailed(msg) => write!(f, "Implausible weather data: {}", msg),
            WeatherApiError::AllCandidatesFailed(n) => write!(f, "All {} weather candidates failed", n),
        }
    }
}

impl std::error::Error for WeatherApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WeatherApiError::HttpRequestError(e) => Some(e),
            WeatherApiError::DeserializationError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for WeatherApiError {
    fn from(err: reqwest::Error) -> Self {
        WeatherApiError::HttpRequestError(err)
    }
}

impl From<JsonError> for WeatherApiError {
    fn from(err: JsonError) -> Self {
        WeatherApiError::DeserializationError(err)
    }
}

/// A single observed value, or the explicit "provider did not say" marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Reading<T> {
    Known(T),
    #[default]
    Unknown,
}

impl<T> Reading<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Reading::Known(v) => Some(v),
            Reading::Unknown => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        match self {
            Reading::Known(v) => Reading::Known(f(v)),
            Reading::Unknown => Reading::Unknown,
        }
    }

    /// Format a known value with `f`, or the unknown marker.
    pub fn render(&self, f: impl FnOnce(&T) -> String) -> String {
        match self {
            Reading::Known(v) => f(v),
            Reading::Unknown => UNKNOWN_TEXT.to_string(),
        }
    }
}

impl<T> From<Option<T>> for Reading<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Reading::Known(v),
            None => Reading::Unknown,
        }
    }
}

impl<T: Display> Display for Reading<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Known(v) => write!(f, "{}", v),
            Reading::Unknown => f.write_str(UNKNOWN_TEXT),
        }
    }
}

/// Normalized, UI-ready current conditions. Units: °F, mph, inHg, miles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub temperature: Reading<i32>,
    pub feels_like: Reading<i32>,
    pub description: String,
    pub icon: String,
    pub location: String,
    pub humidity: Reading<i32>,
    pub wind_speed: Reading<i32>,
    pub pressure: Reading<f64>,
    pub uv_index: Reading<f64>,
    pub visibility: Reading<f64>,
    pub observed_at: DateTime<Utc>,
    /// Provider that produced the record, empty for the placeholder.
    pub source: String,
    /// True for the static stand-in used when every attempt failed.
    pub placeholder: bool,
}

impl WeatherRecord {
    /// The clearly-labeled stand-in shown when no provider delivered.
    pub fn placeholder(observed_at: DateTime<Utc>) -> Self {
        Self {
            temperature: Reading::Unknown,
            feels_like: Reading::Unknown,
            description: FALLBACK_DESCRIPTION.to_string(),
            icon: FALLBACK_ICON.to_string(),
            location: FALLBACK_LOCATION.to_string(),
            humidity: Reading::Unknown,
            wind_speed: Reading::Unknown,
            pressure: Reading::Unknown,
            uv_index: Reading::Unknown,
            visibility: Reading::Unknown,
            observed_at,
            source: String::new(),
            placeholder: true,
        }
    }

    /// City part of the location, "Atlanta" from "Atlanta, GA".
    pub fn city(&self) -> &str {
        self.location.split(',').next().unwrap_or("").trim()
    }
}

/// Structural and range check. Records failing this are treated exactly
/// like a failed request.
pub fn validate(record: &WeatherRecord) -> Result<(), WeatherApiError> {
    match record.temperature {
        Reading::Known(t) if t > TEMP_MIN_F && t < TEMP_MAX_F => {}
        Reading::Known(t) => {
            return Err(WeatherApiError::ValidationFailed(format!(
                "temperature {}°F outside ({}, {})",
                t, TEMP_MIN_F, TEMP_MAX_F
            )));
        }
        Reading::Unknown => {
            return Err(WeatherApiError::ValidationFailed("temperature missing".to_string()));
        }
    }
    if record.description.trim().is_empty() {
        return Err(WeatherApiError::ValidationFailed("empty description".to_string()));
    }
    if record.location.trim().is_empty() {
        return Err(WeatherApiError::ValidationFailed("empty location".to_string()));
    }
    Ok(())
}
