/*
 *  providers.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Weather providers - Open-Meteo and OpenWeatherMap normalization
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

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use log::debug;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::time::Duration;

use crate::constants::{INHG_PER_HPA, METERS_PER_MILE, USER_AGENT};
use crate::location::Location;
use crate::weather::{Reading, WeatherApiError, WeatherRecord};
use crate::weather_glyph::{describe_wmo, glyph_owm, glyph_wmo};

/// One weather data source, tried in a fixed order by the pipeline.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, location: &Location) -> Result<WeatherRecord, WeatherApiError>;
}

pub fn build_client(timeout: Duration) -> Result<Client, WeatherApiError> {
    let mut headers = header::HeaderMap::new();
    headers.insert("User-Agent", header::HeaderValue::from_static(USER_AGENT));
    headers.insert("Accept", header::HeaderValue::from_static("application/json"));
    headers.insert("Accept-Encoding", header::HeaderValue::from_static("gzip"));
    headers.insert("Connection", header::HeaderValue::from_static("close"));

    let client = Client::builder()
        .connect_timeout(Duration::from_millis(3000).min(timeout))
        .default_headers(headers)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Gzip if it decodes as gzip, plain text otherwise.
pub fn decode_body(raw: &[u8]) -> String {
    let mut decoder = GzDecoder::new(raw);
    let mut decoded = String::new();
    match decoder.read_to_string(&mut decoded) {
        Ok(_) => decoded,
        Err(_) => String::from_utf8_lossy(raw).to_string(),
    }
}

async fn get_text<T: Serialize + ?Sized>(client: &Client, url: &str, params: &T) -> Result<String, WeatherApiError> {
    let response = client.get(url).query(params).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(WeatherApiError::ApiError(format!("HTTP {}", status)));
    }
    let raw = response.bytes().await?;
    Ok(decode_body(&raw))
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

// Open-Meteo

#[derive(Debug, Deserialize)]
struct OpenMeteoPayload {
    current_weather: Option<OpenMeteoCurrent>,
    #[serde(default)]
    hourly: OpenMeteoHourly,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoCurrent {
    temperature: Option<f64>,
    windspeed: Option<f64>,
    weathercode: Option<i64>,
    time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenMeteoHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    apparent_temperature: Vec<Option<f64>>,
    #[serde(default)]
    relativehumidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    pressure_msl: Vec<Option<f64>>,
    #[serde(default)]
    uv_index: Vec<Option<f64>>,
    #[serde(default)]
    visibility: Vec<Option<f64>>,
}

fn series_at(series: &[Option<f64>], idx: Option<usize>) -> Reading<f64> {
    idx.and_then(|i| series.get(i).copied().flatten()).into()
}

/// `"2024-01-15T10:15"` -> `"2024-01-15T10:00"`.
fn hour_of(time: &str) -> Option<String> {
    let (hour, _minutes) = time.rsplit_once(':')?;
    Some(format!("{}:00", hour))
}

/// Map an Open-Meteo forecast body onto a `WeatherRecord`. Hourly fields are
/// read at the entry matching `current_weather.time`, or the hour it falls
/// in; anything not found there is `Unknown`.
pub fn normalize_open_meteo(body: &str, location: &Location, observed_at: DateTime<Utc>) -> Result<WeatherRecord, WeatherApiError> {
    let payload: OpenMeteoPayload = serde_json::from_str(body)?;
    let current = payload.current_weather
        .ok_or_else(|| WeatherApiError::ApiError("response has no current_weather".to_string()))?;
    let hourly = &payload.hourly;

    let idx = current.time.as_deref().and_then(|t| {
        hourly.time.iter().position(|h| h == t).or_else(|| {
            let hour = hour_of(t)?;
            hourly.time.iter().position(|h| *h == hour)
        })
    });
    if idx.is_none() {
        debug!("No hourly entry matches {:?}", current.time);
    }

    let code = current.weathercode.unwrap_or(-1);
    Ok(WeatherRecord {
        temperature: Reading::from(current.temperature).map(|t| t.round() as i32),
        feels_like: series_at(&hourly.apparent_temperature, idx).map(|t| t.round() as i32),
        description: describe_wmo(code).to_string(),
        icon: glyph_wmo(code).to_string(),
        location: location.name.clone(),
        humidity: series_at(&hourly.relativehumidity_2m, idx).map(|h| h.round() as i32),
        wind_speed: Reading::from(current.windspeed).map(|w| w.round() as i32),
        pressure: series_at(&hourly.pressure_msl, idx).map(|p| round_to(p * INHG_PER_HPA, 2)),
        uv_index: series_at(&hourly.uv_index, idx).map(|u| round_to(u, 1)),
        visibility: series_at(&hourly.visibility, idx).map(|m| round_to(m / METERS_PER_MILE, 1)),
        observed_at,
        source: "open-meteo".to_string(),
        placeholder: false,
    })
}

pub struct OpenMeteo {
    client: Client,
    base_url: String,
}

impl OpenMeteo {
    pub fn new(client: Client) -> Self {
        Self { client, base_url: "https://api.open-meteo.com/v1/forecast".to_string() }
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteo {
    fn name(&self) -> &str {
        "open-meteo"
    }

    async fn fetch(&self, location: &Location) -> Result<WeatherRecord, WeatherApiError> {
        let params = [
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("current_weather", "true".to_string()),
            ("hourly", "apparent_temperature,relativehumidity_2m,windspeed_10m,pressure_msl,uv_index,visibility,weathercode".to_string()),
            ("temperature_unit", "fahrenheit".to_string()),
            ("windspeed_unit", "mph".to_string()),
            ("precipitation_unit", "inch".to_string()),
            ("timezone", "auto".to_string()),
        ];
        let body = get_text(&self.client, &self.base_url, &params).await?;
        normalize_open_meteo(&body, location, Utc::now())
    }
}

// OpenWeatherMap

#[derive(Debug, Deserialize)]
struct OwmPayload {
    main: OwmMain,
    #[serde(default)]
    wind: Option<OwmWind>,
    visibility: Option<f64>,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    main: String,
    description: String,
}

/// Map an OpenWeatherMap current-weather body (imperial units) onto a `WeatherRecord`.
pub fn normalize_openweathermap(body: &str, location: &Location, observed_at: DateTime<Utc>) -> Result<WeatherRecord, WeatherApiError> {
    let payload: OwmPayload = serde_json::from_str(body)?;
    let condition = payload.weather.first();
    let place = if payload.name.trim().is_empty() { location.name.clone() } else { payload.name };

    Ok(WeatherRecord {
        temperature: Reading::from(payload.main.temp).map(|t| t.round() as i32),
        feels_like: Reading::from(payload.main.feels_like).map(|t| t.round() as i32),
        description: condition.map(|c| c.description.clone()).unwrap_or_default(),
        icon: glyph_owm(condition.map(|c| c.main.as_str()).unwrap_or("")).to_string(),
        location: place,
        humidity: Reading::from(payload.main.humidity).map(|h| h.round() as i32),
        wind_speed: Reading::from(payload.wind.and_then(|w| w.speed)).map(|w| w.round() as i32),
        pressure: Reading::from(payload.main.pressure).map(|p| round_to(p * INHG_PER_HPA, 2)),
        uv_index: Reading::Unknown,
        visibility: Reading::from(payload.visibility).map(|m| round_to(m / METERS_PER_MILE, 1)),
        observed_at,
        source: "openweathermap".to_string(),
        placeholder: false,
    })
}

pub struct OpenWeatherMap {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherMap {
    pub fn new(client: Client, api_key: &str) -> Result<Self, WeatherApiError> {
        let api_key = api_key.trim();
        if api_key.is_empty() || api_key == "YOUR_API_KEY" {
            return Err(WeatherApiError::ApiKeyError("no OpenWeatherMap key configured".to_string()));
        }
        Ok(Self {
            client,
            base_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMap {
    fn name(&self) -> &str {
        "openweathermap"
    }

    async fn fetch(&self, location: &Location) -> Result<WeatherRecord, WeatherApiError> {
        let params = [
            ("lat", location.latitude.to_string()),
            ("lon", location.longitude.to_string()),
            ("units", "imperial".to_string()),
            ("appid", self.api_key.clone()),
        ];
        let body = get_text(&self.client, &self.base_url, &params).await?;
        normalize_openweathermap(&body, location, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationSource;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    fn atlanta() -> Location {
        Location::new(33.8026, -84.3984, "Atlanta, GA", LocationSource::Default)
    }

    const OPEN_METEO: &str = r#"{
        "current_weather": {"temperature": 71.6, "windspeed": 4.6, "weathercode": 2, "time": "2024-01-15T10:00"},
        "hourly": {
            "time": ["2024-01-15T09:00", "2024-01-15T10:00"],
            "apparent_temperature": [68.0, 69.4],
            "relativehumidity_2m": [70, 64],
            "pressure_msl": [1015.0, 1016.3],
            "uv_index": [1.0, 2.36],
            "visibility": [16000.0, 24140.0]
        }
    }"#;

    #[test]
    fn open_meteo_reads_matching_hour() {
        let rec = normalize_open_meteo(OPEN_METEO, &atlanta(), Utc::now()).unwrap();
        assert_eq!(rec.temperature, Reading::Known(72));
        assert_eq!(rec.feels_like, Reading::Known(69));
        assert_eq!(rec.humidity, Reading::Known(64));
        assert_eq!(rec.wind_speed, Reading::Known(5));
        assert_eq!(rec.pressure, Reading::Known(30.01));
        assert_eq!(rec.uv_index, Reading::Known(2.4));
        assert_eq!(rec.visibility, Reading::Known(15.0));
        assert_eq!(rec.description, "Partly Cloudy");
        assert_eq!(rec.icon, "⛅");
        assert_eq!(rec.location, "Atlanta, GA");
        assert!(!rec.placeholder);
    }

    #[test]
    fn open_meteo_quarter_hour_reads_its_hour() {
        let body = OPEN_METEO.replace(r#""time": "2024-01-15T10:00"}"#, r#""time": "2024-01-15T10:45"}"#);
        let rec = normalize_open_meteo(&body, &atlanta(), Utc::now()).unwrap();
        assert_eq!(rec.feels_like, Reading::Known(69));
        assert_eq!(rec.humidity, Reading::Known(64));
        assert_eq!(rec.visibility, Reading::Known(15.0));
        assert_eq!(hour_of("2024-01-15T09:15").as_deref(), Some("2024-01-15T09:00"));
        assert_eq!(hour_of("t0"), None);
    }

    #[test]
    fn open_meteo_unmatched_hour_is_unknown() {
        let body = r#"{
            "current_weather": {"temperature": 0.0, "windspeed": 0.0, "weathercode": 0, "time": "2024-01-15T11:00"},
            "hourly": {"time": ["2024-01-15T10:00"], "apparent_temperature": [1.0]}
        }"#;
        let rec = normalize_open_meteo(body, &atlanta(), Utc::now()).unwrap();
        // zero is a real reading, not a missing one
        assert_eq!(rec.temperature, Reading::Known(0));
        assert_eq!(rec.feels_like, Reading::Unknown);
        assert_eq!(rec.humidity, Reading::Unknown);
        assert_eq!(rec.visibility, Reading::Unknown);
    }

    #[test]
    fn open_meteo_nulls_are_unknown() {
        let body = r#"{
            "current_weather": {"temperature": 50.2, "windspeed": null, "weathercode": 3, "time": "t0"},
            "hourly": {"time": ["t0"], "apparent_temperature": [null], "uv_index": [null]}
        }"#;
        let rec = normalize_open_meteo(body, &atlanta(), Utc::now()).unwrap();
        assert_eq!(rec.wind_speed, Reading::Unknown);
        assert_eq!(rec.feels_like, Reading::Unknown);
        assert_eq!(rec.uv_index, Reading::Unknown);
    }

    #[test]
    fn open_meteo_malformed_payload_is_an_error() {
        assert!(matches!(
            normalize_open_meteo("<html>busy</html>", &atlanta(), Utc::now()),
            Err(WeatherApiError::DeserializationError(_))
        ));
        assert!(matches!(
            normalize_open_meteo(r#"{"hourly": {}}"#, &atlanta(), Utc::now()),
            Err(WeatherApiError::ApiError(_))
        ));
    }

    #[test]
    fn openweathermap_maps_imperial_payload() {
        let body = r#"{
            "weather": [{"main": "Rain", "description": "light rain"}],
            "main": {"temp": 55.4, "feels_like": 53.9, "humidity": 88, "pressure": 1009},
            "visibility": 8047,
            "wind": {"speed": 12.3},
            "name": "Decatur"
        }"#;
        let rec = normalize_openweathermap(body, &atlanta(), Utc::now()).unwrap();
        assert_eq!(rec.temperature, Reading::Known(55));
        assert_eq!(rec.feels_like, Reading::Known(54));
        assert_eq!(rec.description, "light rain");
        assert_eq!(rec.icon, "🌧️");
        assert_eq!(rec.location, "Decatur");
        assert_eq!(rec.visibility, Reading::Known(5.0));
        assert_eq!(rec.pressure, Reading::Known(29.8));
        assert_eq!(rec.uv_index, Reading::Unknown);
    }

    #[test]
    fn openweathermap_requires_a_real_key() {
        let client = Client::new();
        assert!(OpenWeatherMap::new(client.clone(), "").is_err());
        assert!(OpenWeatherMap::new(client.clone(), "YOUR_API_KEY").is_err());
        assert!(OpenWeatherMap::new(client, "abc123").is_ok());
    }

    #[test]
    fn body_decodes_gzip_or_plain() {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"{\"ok\":true}").unwrap();
        let gz = enc.finish().unwrap();
        assert_eq!(decode_body(&gz), "{\"ok\":true}");
        assert_eq!(decode_body(b"{\"ok\":true}"), "{\"ok\":true}");
    }
}
