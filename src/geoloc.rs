/*
 *  geoloc.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  IP geolocation lookup
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
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;

use crate::constants::USER_AGENT;
use crate::location::{Geolocator, Location, LocationError, LocationSource};

#[derive(Debug, Deserialize)]
pub struct GeoLocation {
    pub city: String,
    pub region_code: String,
    #[allow(dead_code)]
    country_code: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<GeoLocation> for Location {
    fn from(geo: GeoLocation) -> Self {
        let name = if geo.region_code.is_empty() {
            geo.city
        } else {
            format!("{}, {}", geo.city, geo.region_code)
        };
        Location::new(geo.latitude, geo.longitude, name, LocationSource::Geolocated)
    }
}

/// IP-based position lookup, the kiosk host's stand-in for device GPS.
pub struct IpGeolocator {
    client: Client,
    url: String,
}

impl IpGeolocator {
    pub fn new(timeout: Duration) -> Result<Self, LocationError> {
        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(USER_AGENT));
        headers.insert("Accept", header::HeaderValue::from_static("application/json"));
        headers.insert("Connection", header::HeaderValue::from_static("close"));

        let client = Client::builder()
            .connect_timeout(Duration::from_millis(2000).min(timeout))
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| LocationError::LookupFailed(e.to_string()))?;

        Ok(Self { client, url: "https://ipapi.co/json/".to_string() })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Location, LocationError> {
        let geo = self.client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status()) // none 2xx raise
            .map_err(|e| LocationError::LookupFailed(e.to_string()))?
            .json::<GeoLocation>()
            .await
            .map_err(|e| LocationError::LookupFailed(e.to_string()))?;

        Ok(geo.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipapi_payload_maps_to_location() {
        let body = r#"{"city":"Decatur","region_code":"GA","country_code":"US","utc_offset":"-0500","latitude":33.77,"longitude":-84.29}"#;
        let geo: GeoLocation = serde_json::from_str(body).unwrap();
        let loc: Location = geo.into();
        assert_eq!(loc.name, "Decatur, GA");
        assert_eq!(loc.source, LocationSource::Geolocated);
        assert_eq!(loc.longitude, -84.29);
    }
}
