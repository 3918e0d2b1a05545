/*
 *  location.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Location resolution with geolocation and fallback
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
use log::{info, warn};
use mini_moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{GEOLOCATION_MAX_AGE, GEOLOCATION_TIMEOUT};

/// Location information with coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Display name, "Atlanta, GA"
    pub name: String,
    #[serde(default)]
    pub source: LocationSource,
}

/// Source of location data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    #[default]
    Default,
    UserConfig,
    Geolocated,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, name: impl Into<String>, source: LocationSource) -> Self {
        Self { latitude, longitude, name: name.into(), source }
    }

    /// Same place, different provenance.
    pub fn with_source(mut self, source: LocationSource) -> Self {
        self.source = source;
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.4}, {:.4}) [{}]",
            self.name, self.latitude, self.longitude,
            match self.source {
                LocationSource::Default => "default",
                LocationSource::UserConfig => "config",
                LocationSource::Geolocated => "geolocated",
            })
    }
}

#[derive(Debug)]
pub enum LocationError {
    Unavailable,
    Denied(String),
    LookupFailed(String),
    InvalidCoordinates,
    Timeout,
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationError::Unavailable => write!(f, "Geolocation not supported"),
            LocationError::Denied(e) => write!(f, "Geolocation denied: {}", e),
            LocationError::LookupFailed(e) => write!(f, "Geolocation lookup failed: {}", e),
            LocationError::InvalidCoordinates => write!(f, "Invalid coordinates"),
            LocationError::Timeout => write!(f, "Geolocation timeout"),
        }
    }
}

impl std::error::Error for LocationError {}

/// Host-provided one-shot position query.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<Location, LocationError>;
}

/// Latitude/longitude in range, finite, and not the 0,0 "no fix" value.
pub fn valid_coordinates(lat: f64, lng: f64) -> bool {
    lat.is_finite() && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
        && !(lat == 0.0 && lng == 0.0)
}

/// Resolves where to ask for weather: geolocation if available and quick,
/// otherwise the configured default.
pub struct LocationResolver {
    default: Location,
    geolocator: Option<Arc<dyn Geolocator>>,
    timeout: Duration,
    recent: Cache<&'static str, Location>,
}

impl LocationResolver {
    pub fn new(default: Location, geolocator: Option<Arc<dyn Geolocator>>) -> Self {
        Self {
            default,
            geolocator,
            timeout: GEOLOCATION_TIMEOUT,
            recent: Cache::builder()
                .max_capacity(1)
                .time_to_live(GEOLOCATION_MAX_AGE)
                .build(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn default_location(&self) -> &Location {
        &self.default
    }

    /// Never fails and never waits longer than the geolocation timeout.
    pub async fn acquire(&self) -> Location {
        let Some(locator) = self.geolocator.as_ref() else {
            return self.default.clone();
        };

        if let Some(loc) = self.recent.get(&"fix") {
            return loc;
        }

        match tokio::time::timeout(self.timeout, locator.locate()).await {
            Ok(Ok(loc)) if valid_coordinates(loc.latitude, loc.longitude) => {
                info!("Geolocation successful: {}", loc);
                let loc = loc.with_source(LocationSource::Geolocated);
                self.recent.insert("fix", loc.clone());
                loc
            }
            Ok(Ok(loc)) => {
                warn!("Geolocation returned invalid coordinates: {}, {}", loc.latitude, loc.longitude);
                self.default.clone()
            }
            Ok(Err(e)) => {
                warn!("{}, using {}", e, self.default);
                self.default.clone()
            }
            Err(_) => {
                warn!("{}, using {}", LocationError::Timeout, self.default);
                self.default.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed(Result<(f64, f64), ()>, AtomicUsize);

    #[async_trait]
    impl Geolocator for Fixed {
        async fn locate(&self) -> Result<Location, LocationError> {
            self.1.fetch_add(1, Ordering::SeqCst);
            match self.0 {
                Ok((lat, lng)) => Ok(Location::new(lat, lng, "Here", LocationSource::Default)),
                Err(()) => Err(LocationError::Denied("user said no".to_string())),
            }
        }
    }

    struct Never;

    #[async_trait]
    impl Geolocator for Never {
        async fn locate(&self) -> Result<Location, LocationError> {
            std::future::pending().await
        }
    }

    fn home() -> Location {
        Location::new(33.8026, -84.3984, "Atlanta, GA", LocationSource::Default)
    }

    #[tokio::test]
    async fn no_geolocator_uses_default() {
        let resolver = LocationResolver::new(home(), None);
        assert_eq!(resolver.acquire().await, home());
    }

    #[tokio::test]
    async fn geolocated_fix_is_tagged_and_reused() {
        let geo = Arc::new(Fixed(Ok((40.7128, -74.0060)), AtomicUsize::new(0)));
        let resolver = LocationResolver::new(home(), Some(geo.clone()));
        let loc = resolver.acquire().await;
        assert_eq!(loc.source, LocationSource::Geolocated);
        assert_eq!(loc.latitude, 40.7128);
        let _ = resolver.acquire().await;
        assert_eq!(geo.1.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn denial_and_bad_coordinates_fall_back() {
        let denied = LocationResolver::new(home(), Some(Arc::new(Fixed(Err(()), AtomicUsize::new(0)))));
        assert_eq!(denied.acquire().await, home());

        let bogus = LocationResolver::new(home(), Some(Arc::new(Fixed(Ok((100.0, -74.0)), AtomicUsize::new(0)))));
        assert_eq!(bogus.acquire().await, home());

        let null_island = LocationResolver::new(home(), Some(Arc::new(Fixed(Ok((0.0, 0.0)), AtomicUsize::new(0)))));
        assert_eq!(null_island.acquire().await, home());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_geolocation_times_out_to_default() {
        let resolver = LocationResolver::new(home(), Some(Arc::new(Never)));
        let started = tokio::time::Instant::now();
        assert_eq!(resolver.acquire().await, home());
        let waited = started.elapsed();
        assert!(waited >= GEOLOCATION_TIMEOUT && waited < GEOLOCATION_TIMEOUT + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn custom_timeout_bounds_the_wait() {
        let resolver = LocationResolver::new(home(), Some(Arc::new(Never))).with_timeout(Duration::from_secs(2));
        let started = tokio::time::Instant::now();
        assert_eq!(resolver.acquire().await, home());
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(2) && waited < Duration::from_secs(3));
    }

    #[test]
    fn coordinate_ranges() {
        assert!(valid_coordinates(40.7128, -74.0060));
        assert!(!valid_coordinates(91.0, 0.5));
        assert!(!valid_coordinates(10.0, 181.0));
        assert!(!valid_coordinates(f64::NAN, 1.0));
    }
}
