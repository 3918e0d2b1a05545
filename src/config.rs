use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::constants::{
    DEFAULT_CITY, DEFAULT_LATITUDE, DEFAULT_LOCATION_NAME, DEFAULT_LONGITUDE, DEFAULT_TIMEZONE,
    DEFAULT_TIMEZONE_LABEL, WEATHER_CACHE_TTL, WEATHER_REFRESH, WEATHER_REFRESH_SLOW,
};
use crate::display::clock::ClockSettings;
use crate::display::controller::ControllerOptions;
use crate::display::theme::ThemeCatalog;
use crate::display::viewport::Viewport;
use crate::hardening::Hardening;
use crate::location::{valid_coordinates, Location, LocationSource};
use crate::pipeline::PipelineOptions;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration. Every field is optional and layered over
/// built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub clock: Option<ClockConfig>,
    pub location: Option<LocationConfig>,
    pub weather: Option<WeatherConfig>,
    pub themes: Option<ThemeConfig>,
    pub hardening: Option<HardeningConfig>,
    pub viewport: Option<ViewportConfig>,
    /// Preference file, "none" keeps preferences in memory only
    pub prefs_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClockConfig {
    pub timezone: Option<String>,       // IANA name, "America/New_York"
    pub timezone_label: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub name: Option<String>,
    pub geolocate: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedPlace {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherConfig {
    pub openweathermap_key: Option<String>,
    pub refresh_minutes: Option<u64>,
    pub slow_refresh_minutes: Option<u64>,
    pub cache_minutes: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub fallback_locations: Option<Vec<NamedPlace>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ThemeConfig {
    pub default: Option<String>,
    pub auto_rotate: Option<bool>,
    pub rotate_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HardeningConfig {
    pub sanitize_output: Option<bool>,
    pub rate_limit_provider_calls: Option<bool>,
    pub max_retries: Option<u32>,
    pub numeric_theme_keys: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ViewportConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub panel_width: Option<u32>,
    pub panel_height: Option<u32>,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "atomclock", version, about = "AtomClock kiosk clock and weather display")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, short = 'c', value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Enable debug log level
    #[arg(long, short = 'v', alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,
    #[arg(long)]
    pub location_name: Option<String>,
    /// Skip IP geolocation, use the configured location
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_geolocate: bool,
    #[arg(long)]
    pub timezone: Option<String>,
    /// Theme path or name to start with when none was saved
    #[arg(long)]
    pub theme: Option<String>,
    /// Start with theme auto-rotation on when not saved otherwise
    #[arg(long, action = ArgAction::SetTrue)]
    pub rotate: bool,
    /// OpenWeatherMap API key, tried after Open-Meteo
    #[arg(long)]
    pub owm_key: Option<String>,
    /// Preference file, "none" for memory only
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub prefs: Option<PathBuf>,
    /// Fetch weather once, print it as JSON and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub once: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<(Config, Cli), ConfigError> {
    let cli = Cli::parse();
    let cfg = load_with(&cli)?;
    Ok((cfg, cli))
}

pub fn load_with(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Pretty YAML of the effective config.
pub fn dump_config(cfg: &Config) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/atomclock/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/atomclock/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/atomclock.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["atomclock.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()  { dst.log_level = src.log_level; }
    if src.prefs_path.is_some() { dst.prefs_path = src.prefs_path; }
    merge_group(&mut dst.clock, src.clock, |d, s| {
        if s.timezone.is_some()       { d.timezone = s.timezone; }
        if s.timezone_label.is_some() { d.timezone_label = s.timezone_label; }
        if s.city.is_some()           { d.city = s.city; }
    });
    merge_group(&mut dst.location, src.location, |d, s| {
        if s.latitude.is_some()  { d.latitude = s.latitude; }
        if s.longitude.is_some() { d.longitude = s.longitude; }
        if s.name.is_some()      { d.name = s.name; }
        if s.geolocate.is_some() { d.geolocate = s.geolocate; }
    });
    merge_group(&mut dst.weather, src.weather, |d, s| {
        if s.openweathermap_key.is_some()   { d.openweathermap_key = s.openweathermap_key; }
        if s.refresh_minutes.is_some()      { d.refresh_minutes = s.refresh_minutes; }
        if s.slow_refresh_minutes.is_some() { d.slow_refresh_minutes = s.slow_refresh_minutes; }
        if s.cache_minutes.is_some()        { d.cache_minutes = s.cache_minutes; }
        if s.timeout_secs.is_some()         { d.timeout_secs = s.timeout_secs; }
        if s.fallback_locations.is_some()   { d.fallback_locations = s.fallback_locations; }
    });
    merge_group(&mut dst.themes, src.themes, |d, s| {
        if s.default.is_some()     { d.default = s.default; }
        if s.auto_rotate.is_some() { d.auto_rotate = s.auto_rotate; }
        if s.rotate_secs.is_some() { d.rotate_secs = s.rotate_secs; }
    });
    merge_group(&mut dst.hardening, src.hardening, |d, s| {
        if s.sanitize_output.is_some()           { d.sanitize_output = s.sanitize_output; }
        if s.rate_limit_provider_calls.is_some() { d.rate_limit_provider_calls = s.rate_limit_provider_calls; }
        if s.max_retries.is_some()               { d.max_retries = s.max_retries; }
        if s.numeric_theme_keys.is_some()        { d.numeric_theme_keys = s.numeric_theme_keys; }
    });
    merge_group(&mut dst.viewport, src.viewport, |d, s| {
        if s.width.is_some()        { d.width = s.width; }
        if s.height.is_some()       { d.height = s.height; }
        if s.panel_width.is_some()  { d.panel_width = s.panel_width; }
        if s.panel_height.is_some() { d.panel_height = s.panel_height; }
    });
}

fn merge_group<T>(dst: &mut Option<T>, src: Option<T>, field_merge: impl FnOnce(&mut T, T)) {
    match (dst.as_mut(), src) {
        (None, Some(s)) => *dst = Some(s),
        (Some(d), Some(s)) => field_merge(d, s),
        _ => {}
    }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }
    if cli.debug               { cfg.log_level = Some("debug".to_string()); }
    if cli.prefs.is_some()     { cfg.prefs_path = cli.prefs.clone(); }

    if cli.lat.is_some() || cli.lon.is_some() || cli.location_name.is_some() || cli.no_geolocate {
        let loc = cfg.location.get_or_insert_with(LocationConfig::default);
        if cli.lat.is_some()           { loc.latitude = cli.lat; }
        if cli.lon.is_some()           { loc.longitude = cli.lon; }
        if cli.location_name.is_some() { loc.name = cli.location_name.clone(); }
        if cli.no_geolocate            { loc.geolocate = Some(false); }
    }
    if let Some(tz) = cli.timezone.as_ref() {
        cfg.clock.get_or_insert_with(ClockConfig::default).timezone = Some(tz.clone());
    }
    if cli.theme.is_some() || cli.rotate {
        let themes = cfg.themes.get_or_insert_with(ThemeConfig::default);
        if cli.theme.is_some() { themes.default = cli.theme.clone(); }
        if cli.rotate          { themes.auto_rotate = Some(true); }
    }
    if let Some(key) = cli.owm_key.as_ref() {
        cfg.weather.get_or_insert_with(WeatherConfig::default).openweathermap_key = Some(key.clone());
    }
}

// period ceilings
const MAX_MINUTES: u64 = 24 * 60;
const MAX_TIMEOUT_SECS: u64 = 300;
const MAX_ROTATE_SECS: u64 = 24 * 60 * 60;

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(loc) = cfg.location.as_ref() {
        let lat = loc.latitude.unwrap_or(DEFAULT_LATITUDE);
        let lon = loc.longitude.unwrap_or(DEFAULT_LONGITUDE);
        if !valid_coordinates(lat, lon) {
            return Err(ConfigError::Validation(format!("location {}, {} is not a valid coordinate", lat, lon)));
        }
    }
    if let Some(clock) = cfg.clock.as_ref() {
        if let Some(tz) = clock.timezone.as_ref() {
            if tz.parse::<chrono_tz::Tz>().is_err() {
                return Err(ConfigError::Validation(format!("unknown timezone {:?}", tz)));
            }
        }
    }
    if let Some(weather) = cfg.weather.as_ref() {
        for (what, v, max) in [
            ("weather refresh_minutes", weather.refresh_minutes, MAX_MINUTES),
            ("weather slow_refresh_minutes", weather.slow_refresh_minutes, MAX_MINUTES),
            ("weather timeout_secs", weather.timeout_secs, MAX_TIMEOUT_SECS),
        ] {
            if v.is_some_and(|v| v == 0 || v > max) {
                return Err(ConfigError::Validation(format!("{} must be 1..={}", what, max)));
            }
        }
        if weather.cache_minutes.is_some_and(|v| v > MAX_MINUTES) {
            return Err(ConfigError::Validation(format!("weather cache_minutes must be 0..={}", MAX_MINUTES)));
        }
        for place in weather.fallback_locations.iter().flatten() {
            if !valid_coordinates(place.latitude, place.longitude) {
                return Err(ConfigError::Validation(format!("fallback location {} has invalid coordinates", place.name)));
            }
        }
    }
    if let Some(themes) = cfg.themes.as_ref() {
        if themes.rotate_secs.is_some_and(|v| v == 0 || v > MAX_ROTATE_SECS) {
            return Err(ConfigError::Validation(format!("themes rotate_secs must be 1..={}", MAX_ROTATE_SECS)));
        }
        if let Some(id) = themes.default.as_ref() {
            if !ThemeCatalog::default().contains(id) {
                return Err(ConfigError::Validation(format!("unknown theme {:?}", id)));
            }
        }
    }
    if let Some(hardening) = cfg.hardening.as_ref() {
        if hardening.max_retries.is_some_and(|n| n > 10) {
            return Err(ConfigError::Validation("hardening max_retries must be 0..=10".into()));
        }
    }
    if let Some(vp) = cfg.viewport.as_ref() {
        if vp.width == Some(0) || vp.height == Some(0) {
            return Err(ConfigError::Validation("viewport width/height must be > 0".into()));
        }
    }
    Ok(())
}

fn minutes(m: Option<u64>, default: Duration) -> Duration {
    m.map(|m| Duration::from_secs(m.saturating_mul(60))).unwrap_or(default)
}

impl Config {
    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn geolocate(&self) -> bool {
        self.location.as_ref().and_then(|l| l.geolocate).unwrap_or(true)
    }

    pub fn default_location(&self) -> Location {
        let loc = self.location.clone().unwrap_or_default();
        let source = if loc.latitude.is_some() || loc.longitude.is_some() {
            LocationSource::UserConfig
        } else {
            LocationSource::Default
        };
        Location::new(
            loc.latitude.unwrap_or(DEFAULT_LATITUDE),
            loc.longitude.unwrap_or(DEFAULT_LONGITUDE),
            loc.name.unwrap_or_else(|| DEFAULT_LOCATION_NAME.to_string()),
            source,
        )
    }

    /// Secondary places tried with the primary provider, New York and
    /// London unless configured.
    pub fn fallback_locations(&self) -> Vec<Location> {
        match self.weather.as_ref().and_then(|w| w.fallback_locations.as_ref()) {
            Some(places) => places.iter()
                .map(|p| Location::new(p.latitude, p.longitude, p.name.clone(), LocationSource::UserConfig))
                .collect(),
            None => vec![
                Location::new(40.7128, -74.0060, "New York, NY", LocationSource::Default),
                Location::new(51.5074, -0.1278, "London, UK", LocationSource::Default),
            ],
        }
    }

    pub fn openweathermap_key(&self) -> Option<&str> {
        self.weather.as_ref().and_then(|w| w.openweathermap_key.as_deref())
    }

    pub fn hardening(&self) -> Hardening {
        let base = Hardening::default();
        let Some(h) = self.hardening.as_ref() else { return base };
        Hardening {
            sanitize_output: h.sanitize_output.unwrap_or(base.sanitize_output),
            rate_limit_provider_calls: h.rate_limit_provider_calls.unwrap_or(base.rate_limit_provider_calls),
            max_retries: h.max_retries.unwrap_or(base.max_retries),
            numeric_theme_keys: h.numeric_theme_keys.unwrap_or(base.numeric_theme_keys),
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        let weather = self.weather.clone().unwrap_or_default();
        let base = PipelineOptions {
            cache_ttl: minutes(weather.cache_minutes, WEATHER_CACHE_TTL),
            request_timeout: weather.timeout_secs.map(Duration::from_secs).unwrap_or(PipelineOptions::default().request_timeout),
            ..PipelineOptions::default()
        };
        self.hardening().pipeline_options(base)
    }

    pub fn clock_settings(&self) -> ClockSettings {
        let clock = self.clock.clone().unwrap_or_default();
        // validated on load
        let tz = clock.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE).parse().unwrap_or(chrono_tz::America::New_York);
        ClockSettings {
            tz,
            label: clock.timezone_label.unwrap_or_else(|| DEFAULT_TIMEZONE_LABEL.to_string()),
            city: clock.city.unwrap_or_else(|| DEFAULT_CITY.to_string()),
        }
    }

    pub fn controller_options(&self) -> ControllerOptions {
        let base = ControllerOptions::default();
        let weather = self.weather.clone().unwrap_or_default();
        let themes = self.themes.clone().unwrap_or_default();
        let vp = self.viewport.clone().unwrap_or_default();
        ControllerOptions {
            clock: self.clock_settings(),
            rotate_period: themes.rotate_secs.map(Duration::from_secs).unwrap_or(base.rotate_period),
            weather_refresh: minutes(weather.refresh_minutes, WEATHER_REFRESH),
            weather_refresh_slow: minutes(weather.slow_refresh_minutes, WEATHER_REFRESH_SLOW),
            viewport: Viewport::new(vp.width.unwrap_or(base.viewport.width), vp.height.unwrap_or(base.viewport.height)),
            panel_width: vp.panel_width.unwrap_or(base.panel_width),
            panel_height: vp.panel_height.unwrap_or(base.panel_height),
            hardening: self.hardening(),
            default_theme: themes.default,
            auto_rotate: themes.auto_rotate.unwrap_or(false),
        }
    }

    /// `None` when preferences should stay in memory.
    pub fn prefs_file(&self) -> Option<PathBuf> {
        match self.prefs_path.as_ref() {
            Some(p) if p.as_os_str() == "none" => None,
            Some(p) => Some(p.clone()),
            None => crate::prefs::FileStore::default_path(),
        }
    }
}
