//! Timers, limits and defaults shared across the clock, display and weather modules.

use std::time::Duration;

/// Clock refresh cadence.
pub const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Theme rotation period.
pub const ROTATE_PERIOD: Duration = Duration::from_secs(30);

/// Weather refresh cadence, normal and slow connections.
pub const WEATHER_REFRESH: Duration = Duration::from_secs(10 * 60);
pub const WEATHER_REFRESH_SLOW: Duration = Duration::from_secs(15 * 60);

/// A weather record younger than this short-circuits a refresh.
pub const WEATHER_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Bounded wait for a geolocation fix.
pub const GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(10);
/// Reuse a geolocation fix for this long (maximumAge).
pub const GEOLOCATION_MAX_AGE: Duration = Duration::from_secs(5 * 60);

/// Per-candidate provider request timeout.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);
/// Minimum gap between provider calls when rate limiting is on.
pub const PROVIDER_CALL_GAP: Duration = Duration::from_millis(100);

/// First backoff step, doubled per attempt: 2s, 4s, 8s...
pub const BACKOFF_UNIT: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Resize handling debounce, and the settle delay after an orientation change.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(250);
pub const ORIENTATION_SETTLE: Duration = Duration::from_millis(100);

/// How long a notification stays on screen.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Plausible temperature window in °F (exclusive).
pub const TEMP_MIN_F: i32 = -100;
pub const TEMP_MAX_F: i32 = 150;

/// Viewport breakpoints (inclusive upper bounds).
pub const MOBILE_MAX_WIDTH: u32 = 768;
pub const TABLET_MAX_WIDTH: u32 = 1024;

pub const METERS_PER_MILE: f64 = 1609.344;
pub const INHG_PER_HPA: f64 = 0.029_529_983_071_445;

/// Text shown for any reading the provider did not supply.
pub const UNKNOWN_TEXT: &str = "--";

pub const FALLBACK_DESCRIPTION: &str = "Weather unavailable";
pub const FALLBACK_LOCATION: &str = "Location unknown";
pub const FALLBACK_ICON: &str = "🌤️";

/// Reference place when geolocation is off or fails (Atlanta, GA 30318).
pub const DEFAULT_LATITUDE: f64 = 33.8026;
pub const DEFAULT_LONGITUDE: f64 = -84.3984;
pub const DEFAULT_LOCATION_NAME: &str = "Atlanta, GA";
pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_TIMEZONE_LABEL: &str = "Eastern Time (Atlanta, GA)";
pub const DEFAULT_CITY: &str = "Atlanta, Georgia";

pub const USER_AGENT: &str = concat!("AtomClock ", env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));
