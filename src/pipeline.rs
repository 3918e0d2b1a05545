/*
 *  pipeline.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Weather acquisition - cache, fallback chain, retries and backoff
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

use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::constants::{BACKOFF_UNIT, DEFAULT_MAX_RETRIES, PROVIDER_CALL_GAP, PROVIDER_TIMEOUT, WEATHER_CACHE_TTL};
use crate::func_timer::FunctionTimer;
use crate::location::{Location, LocationResolver};
use crate::providers::WeatherProvider;
use crate::weather::{validate, WeatherApiError, WeatherRecord};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub cache_ttl: Duration,
    /// Retries after the first failed pass over all candidates.
    pub max_retries: u32,
    pub backoff_unit: Duration,
    /// Minimum gap between provider calls, none when unset.
    pub rate_limit: Option<Duration>,
    pub request_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            cache_ttl: WEATHER_CACHE_TTL,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_unit: BACKOFF_UNIT,
            rate_limit: Some(PROVIDER_CALL_GAP),
            request_timeout: PROVIDER_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Acquisition {
    Attempting(u32),
    Backoff { next: u32, delay: Duration },
    Fallback,
}

/// Location -> candidates -> validated record, with cache, backoff and a
/// placeholder at the end of the road.
pub struct WeatherPipeline {
    providers: Vec<Arc<dyn WeatherProvider>>,
    resolver: LocationResolver,
    fallback_locations: Vec<Location>,
    options: PipelineOptions,
    cache: Mutex<Option<(WeatherRecord, Instant)>>,
    last_call: Mutex<Option<Instant>>,
}

impl WeatherPipeline {
    pub fn new(providers: Vec<Arc<dyn WeatherProvider>>, resolver: LocationResolver, options: PipelineOptions) -> Self {
        Self {
            providers,
            resolver,
            fallback_locations: Vec::new(),
            options,
            cache: Mutex::new(None),
            last_call: Mutex::new(None),
        }
    }

    pub fn with_fallback_locations(mut self, locations: Vec<Location>) -> Self {
        self.fallback_locations = locations;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Delay before retry number `attempt + 1`: unit * 2^(attempt + 1).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.options.backoff_unit.saturating_mul(2u32.saturating_pow(attempt + 1))
    }

    async fn cached(&self) -> Option<WeatherRecord> {
        let guard = self.cache.lock().await;
        match guard.as_ref() {
            Some((rec, at)) if at.elapsed() < self.options.cache_ttl => Some(rec.clone()),
            _ => None,
        }
    }

    /// Drop the cached record so the next refresh goes to the network.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    /// Always yields something to show: fresh cache, a fetched record, or
    /// the placeholder once retries are spent.
    pub async fn refresh(&self) -> WeatherRecord {
        if let Some(rec) = self.cached().await {
            debug!("Weather cache still fresh, skipping fetch");
            return rec;
        }

        let location = self.resolver.acquire().await;
        let mut state = Acquisition::Attempting(0);
        loop {
            state = match state {
                Acquisition::Attempting(attempt) => match self.fetch_weather(&location).await {
                    Ok(rec) => {
                        info!("Weather updated from {}: {}°F {}", rec.source, rec.temperature, rec.description);
                        *self.cache.lock().await = Some((rec.clone(), Instant::now()));
                        return rec;
                    }
                    Err(e) if attempt < self.options.max_retries => {
                        let delay = self.backoff_delay(attempt);
                        warn!("{}, retry {}/{} in {:?}", e, attempt + 1, self.options.max_retries, delay);
                        Acquisition::Backoff { next: attempt + 1, delay }
                    }
                    Err(e) => {
                        error!("{}, giving up after {} attempts", e, attempt + 1);
                        Acquisition::Fallback
                    }
                },
                Acquisition::Backoff { next, delay } => {
                    tokio::time::sleep(delay).await;
                    Acquisition::Attempting(next)
                }
                Acquisition::Fallback => return WeatherRecord::placeholder(Utc::now()),
            };
        }
    }

    fn candidates<'a>(&'a self, location: &'a Location) -> Vec<(&'a Arc<dyn WeatherProvider>, &'a Location)> {
        let mut list: Vec<_> = self.providers.iter().map(|p| (p, location)).collect();
        if let Some(primary) = self.providers.first() {
            list.extend(self.fallback_locations.iter().map(|l| (primary, l)));
        }
        list
    }

    async fn pace(&self) {
        let Some(gap) = self.options.rate_limit else { return };
        let mut last = self.last_call.lock().await;
        if let Some(at) = *last {
            let since = at.elapsed();
            if since < gap {
                tokio::time::sleep(gap - since).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// One pass over the candidates; the first valid record wins.
    pub async fn fetch_weather(&self, location: &Location) -> Result<WeatherRecord, WeatherApiError> {
        let candidates = self.candidates(location);
        if candidates.is_empty() {
            return Err(WeatherApiError::InvalidInput("no weather providers configured".to_string()));
        }

        for (provider, place) in &candidates {
            self.pace().await;
            let _timer = FunctionTimer::new(format!("{} @ {}", provider.name(), place.name));
            let outcome = match tokio::time::timeout(self.options.request_timeout, provider.fetch(place)).await {
                Ok(result) => result,
                Err(_) => Err(WeatherApiError::Timeout(format!("{} after {:?}", provider.name(), self.options.request_timeout))),
            };
            match outcome.and_then(|rec| validate(&rec).map(|_| rec)) {
                Ok(rec) => return Ok(rec),
                Err(e) => warn!("{} for {} failed: {}", provider.name(), place.name, e),
            }
        }
        Err(WeatherApiError::AllCandidatesFailed(candidates.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationSource;
    use crate::weather::tests::sample;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    /// Replays scripted outcomes and records when and where it was called.
    struct Scripted {
        name: &'static str,
        script: StdMutex<VecDeque<Result<i32, ()>>>,
        calls: StdMutex<Vec<(Instant, String)>>,
        hang: bool,
    }

    impl Scripted {
        fn new(name: &'static str, script: Vec<Result<i32, ()>>) -> Arc<Self> {
            Arc::new(Self { name, script: StdMutex::new(script.into()), calls: StdMutex::new(Vec::new()), hang: false })
        }

        fn hanging(name: &'static str) -> Arc<Self> {
            Arc::new(Self { name, script: StdMutex::new(VecDeque::new()), calls: StdMutex::new(Vec::new()), hang: true })
        }

        fn calls(&self) -> Vec<(Instant, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self, location: &Location) -> Result<WeatherRecord, WeatherApiError> {
            self.calls.lock().unwrap().push((Instant::now(), location.name.clone()));
            if self.hang {
                std::future::pending::<()>().await;
            }
            let next = self.script.lock().unwrap().pop_front().unwrap_or(Err(()));
            match next {
                Ok(temp) => {
                    let mut rec = sample(temp);
                    rec.location = location.name.clone();
                    rec.source = self.name.to_string();
                    Ok(rec)
                }
                Err(()) => Err(WeatherApiError::ApiError("HTTP 503 Service Unavailable".to_string())),
            }
        }
    }

    fn home() -> Location {
        Location::new(33.8026, -84.3984, "Atlanta, GA", LocationSource::Default)
    }

    fn pipeline(providers: Vec<Arc<dyn WeatherProvider>>, options: PipelineOptions) -> WeatherPipeline {
        WeatherPipeline::new(providers, LocationResolver::new(home(), None), options)
    }

    fn about(actual: Duration, expected: Duration) -> bool {
        actual >= expected && actual < expected + Duration::from_millis(50)
    }

    fn no_pacing() -> PipelineOptions {
        PipelineOptions { rate_limit: None, ..PipelineOptions::default() }
    }

    #[tokio::test(start_paused = true)]
    async fn implausible_record_moves_to_next_candidate() {
        let first = Scripted::new("first", vec![Ok(-150)]);
        let second = Scripted::new("second", vec![Ok(70)]);
        let p = pipeline(vec![first.clone(), second.clone()], no_pacing());
        let rec = p.refresh().await;
        assert_eq!(rec.source, "second");
        assert!(!rec.placeholder);
        assert_eq!(first.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_locations_use_primary_provider() {
        let primary = Scripted::new("primary", vec![Err(()), Ok(60)]);
        let other = Scripted::new("other", vec![Err(())]);
        let p = pipeline(vec![primary.clone(), other.clone()], no_pacing())
            .with_fallback_locations(vec![Location::new(40.7128, -74.0060, "New York, NY", LocationSource::UserConfig)]);
        let rec = p.fetch_weather(&home()).await.unwrap();
        assert_eq!(rec.location, "New York, NY");
        let places: Vec<String> = primary.calls().into_iter().map(|(_, l)| l).collect();
        assert_eq!(places, vec!["Atlanta, GA", "New York, NY"]);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_yield_placeholder_after_backoff() {
        let dead = Scripted::new("dead", vec![]);
        let p = pipeline(vec![dead.clone()], no_pacing());
        let started = Instant::now();
        let rec = p.refresh().await;
        assert!(rec.placeholder);
        assert_eq!(rec.description, "Weather unavailable");
        assert_eq!(rec.location, "Location unknown");
        assert_eq!(format!("{}°F", rec.temperature), "--°F");

        let calls = dead.calls();
        assert_eq!(calls.len(), 3);
        assert!(about(calls[1].0 - calls[0].0, Duration::from_secs(2)));
        assert!(about(calls[2].0 - calls[1].0, Duration::from_secs(4)));
        assert!(about(started.elapsed(), Duration::from_secs(6)));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_provider_times_out() {
        let slow = Scripted::hanging("slow");
        let quick = Scripted::new("quick", vec![Ok(55)]);
        let p = pipeline(vec![slow, quick], no_pacing());
        let started = Instant::now();
        let rec = p.fetch_weather(&home()).await.unwrap();
        assert_eq!(rec.source, "quick");
        assert!(about(started.elapsed(), PROVIDER_TIMEOUT));
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_cache_short_circuits_until_expiry() {
        let src = Scripted::new("src", vec![Ok(70), Ok(71)]);
        let p = pipeline(vec![src.clone()], no_pacing());
        assert_eq!(p.refresh().await.temperature.known(), Some(&70));

        tokio::time::advance(Duration::from_secs(9 * 60)).await;
        assert_eq!(p.refresh().await.temperature.known(), Some(&70));
        assert_eq!(src.calls().len(), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(p.refresh().await.temperature.known(), Some(&71));
        assert_eq!(src.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_network() {
        let src = Scripted::new("src", vec![Ok(70), Ok(75)]);
        let p = pipeline(vec![src.clone()], no_pacing());
        p.refresh().await;
        p.invalidate().await;
        assert_eq!(p.refresh().await.temperature.known(), Some(&75));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_spaces_provider_calls() {
        let a = Scripted::new("a", vec![Err(())]);
        let b = Scripted::new("b", vec![Err(())]);
        let c = Scripted::new("c", vec![Ok(68)]);
        let p = pipeline(vec![a.clone(), b.clone(), c.clone()], PipelineOptions::default());
        p.fetch_weather(&home()).await.unwrap();
        let t = [a.calls()[0].0, b.calls()[0].0, c.calls()[0].0];
        assert!(t[1] - t[0] >= PROVIDER_CALL_GAP);
        assert!(t[2] - t[1] >= PROVIDER_CALL_GAP);
    }

    #[tokio::test]
    async fn no_providers_is_an_input_error() {
        let p = pipeline(vec![], no_pacing());
        assert!(matches!(p.fetch_weather(&home()).await, Err(WeatherApiError::InvalidInput(_))));
    }

    #[test]
    fn backoff_doubles() {
        let p = pipeline(vec![], no_pacing());
        assert_eq!(p.backoff_delay(0), Duration::from_secs(2));
        assert_eq!(p.backoff_delay(1), Duration::from_secs(4));
        assert_eq!(p.backoff_delay(2), Duration::from_secs(8));
    }
}
