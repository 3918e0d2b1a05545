/*
 *  display/controller.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display controller - clock, themes, panel and weather view
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
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::time::Instant;

use crate::constants::{
    CLOCK_TICK, NOTIFICATION_TTL, ORIENTATION_SETTLE, RESIZE_DEBOUNCE, ROTATE_PERIOD, UNKNOWN_TEXT,
    WEATHER_REFRESH, WEATHER_REFRESH_SLOW,
};
use crate::display::clock::{ClockSettings, DisplayState};
use crate::display::error::DisplayError;
use crate::display::events::Event;
use crate::display::keys::{dispatch, KeyInput, Shortcut};
use crate::display::panel::{PanelPosition, PointerTarget, ThemePanel};
use crate::display::rotation::Rotation;
use crate::display::slots::Slot;
use crate::display::theme::ThemeCatalog;
use crate::display::traits::{HostShell, RenderSurface, SystemWallClock, WallClock};
use crate::display::viewport::{ViewClass, Viewport};
use crate::hardening::Hardening;
use crate::pacer::Cadence;
use crate::prefs::{
    flag_value, PreferenceStore, Preferences, KEY_AUTO_ROTATE, KEY_PANEL_MINIMIZED, KEY_PANEL_POSITION,
    KEY_SELECTED_STYLE,
};
use crate::sanitize::sanitize;
use crate::weather::WeatherRecord;

/// Tunables for the display controller
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Reference timezone, its label and the default city
    pub clock: ClockSettings,

    /// Auto-rotation period
    pub rotate_period: Duration,

    /// Weather refresh cadence on a normal and on a slow connection
    pub weather_refresh: Duration,
    pub weather_refresh_slow: Duration,

    /// Initial viewport, replaced by resize events
    pub viewport: Viewport,

    /// Settings panel footprint used for clamping
    pub panel_width: u32,
    pub panel_height: u32,

    pub hardening: Hardening,

    /// Theme used when nothing was persisted
    pub default_theme: Option<String>,

    /// Auto-rotate state used when nothing was persisted
    pub auto_rotate: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            clock: ClockSettings::default(),
            rotate_period: ROTATE_PERIOD,
            weather_refresh: WEATHER_REFRESH,
            weather_refresh_slow: WEATHER_REFRESH_SLOW,
            viewport: Viewport::default(),
            panel_width: 260,
            panel_height: 180,
            hardening: Hardening::default(),
            default_theme: None,
            auto_rotate: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Running,
    /// Required targets were missing, only the fallback view was drawn
    Failed,
}

/// Who asked for a theme change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeOrigin {
    /// The theme picker
    Picker,
    /// A keyboard shortcut
    Shortcut,
    /// The rotation timer
    Rotation,
}

/// Owns the view: clock, theme, rotation, panel and the weather on screen
///
/// Every operation is synchronous and runs to completion, so a theme change
/// (index, slots, persisted value) is never observed half done. Time comes
/// in as a monotonic `now` for deadlines and from the wall clock for what
/// is displayed.
pub struct DisplayController<S: RenderSurface, P: PreferenceStore> {
    surface: S,
    store: P,
    shell: Option<Box<dyn HostShell>>,
    wall: Box<dyn WallClock>,
    options: ControllerOptions,

    phase: Phase,
    catalog: ThemeCatalog,
    rotation: Rotation,
    auto_rotate: bool,
    panel: ThemePanel,
    viewport: Viewport,
    pending_viewport: Option<Viewport>,
    view_class: Option<ViewClass>,
    hidden: bool,
    online: bool,
    slow_connection: bool,

    next_tick: Option<Instant>,
    weather_cadence: Option<Cadence>,
    layout_due: Option<Instant>,
    notification: Option<(String, Instant)>,

    weather: Option<WeatherRecord>,
    refresh_requested: bool,
}

impl<S: RenderSurface, P: PreferenceStore> DisplayController<S, P> {
    pub fn new(surface: S, store: P, options: ControllerOptions) -> Self {
        let rotation = Rotation::new(options.rotate_period);
        let panel = ThemePanel::new(options.panel_width, options.panel_height);
        let viewport = options.viewport;
        Self {
            surface,
            store,
            shell: None,
            wall: Box::new(SystemWallClock),
            options,
            phase: Phase::Uninitialized,
            catalog: ThemeCatalog::default(),
            rotation,
            auto_rotate: false,
            panel,
            viewport,
            pending_viewport: None,
            view_class: None,
            hidden: false,
            online: true,
            slow_connection: false,
            next_tick: None,
            weather_cadence: None,
            layout_due: None,
            notification: None,
            weather: None,
            refresh_requested: false,
        }
    }

    pub fn with_shell(mut self, shell: Box<dyn HostShell>) -> Self {
        self.shell = Some(shell);
        self
    }

    pub fn with_wall_clock(mut self, wall: Box<dyn WallClock>) -> Self {
        self.wall = wall;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn catalog(&self) -> &ThemeCatalog {
        &self.catalog
    }

    pub fn is_rotating(&self) -> bool {
        self.rotation.is_active()
    }

    pub fn panel(&self) -> &ThemePanel {
        &self.panel
    }

    pub fn view_class(&self) -> Option<ViewClass> {
        self.view_class
    }

    pub fn weather(&self) -> Option<&WeatherRecord> {
        self.weather.as_ref()
    }

    /// Message currently on screen, if it has not expired.
    pub fn notification(&self) -> Option<&str> {
        self.notification.as_ref().map(|(m, _)| m.as_str())
    }

    fn refresh_interval(&self) -> Duration {
        if self.slow_connection {
            self.options.weather_refresh_slow
        } else {
            self.options.weather_refresh
        }
    }

    fn put(&mut self, slot: Slot, text: &str) {
        if self.options.hardening.sanitize_output {
            let clean = sanitize(text);
            self.surface.write(slot, &clean);
        } else {
            self.surface.write(slot, text);
        }
    }

    fn persist(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!("Could not save {}: {}", key, e);
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.surface.flush() {
            warn!("Render flush failed: {}", e);
        }
    }

    fn notify(&mut self, message: impl Into<String>, now: Instant) {
        let message = message.into();
        info!("{}", message);
        self.put(Slot::Notification, &message);
        self.notification = Some((message, now + NOTIFICATION_TTL));
    }

    /// Check the page, restore preferences, arm timers and ask for weather.
    pub fn initialize(&mut self, now: Instant) -> Result<(), DisplayError> {
        let missing: Vec<&'static str> = Slot::REQUIRED
            .iter()
            .filter(|slot| !self.surface.has_slot(**slot))
            .map(|slot| slot.id())
            .collect();
        if !missing.is_empty() {
            error!("Cannot start, missing render targets: {}", missing.join(", "));
            let placeholder = WeatherRecord::placeholder(self.wall.now());
            self.render_weather(&placeholder);
            self.flush();
            self.phase = Phase::Failed;
            return Err(DisplayError::MissingTargets(missing));
        }
        if self.phase == Phase::Running {
            return Ok(());
        }

        let prefs = Preferences::load(&self.store);

        let theme_index = prefs.selected_style.as_deref()
            .and_then(|id| {
                let idx = self.catalog.index_of(id);
                if idx.is_none() {
                    warn!("Ignoring saved theme {:?}, not in catalog", id);
                }
                idx
            })
            .or_else(|| self.options.default_theme.as_deref().and_then(|id| self.catalog.index_of(id)))
            .unwrap_or(0);
        self.apply_theme(theme_index, false);

        if let Some(pos) = prefs.panel_position {
            self.panel.set_position(pos);
            if self.panel.clamp(self.viewport) {
                self.persist_panel_position();
            }
        }
        self.panel.set_minimized(prefs.panel_minimized.unwrap_or(false));
        self.render_panel();
        self.apply_view_class();
        self.render_fullscreen_state();

        self.phase = Phase::Running;

        let auto = prefs.auto_rotate.unwrap_or(self.options.auto_rotate);
        self.set_toggle(auto);
        if auto {
            self.start_rotation(now);
        } else {
            self.render_rotation_status();
        }

        self.tick();
        self.arm_clock(now);

        self.render_loading();
        self.request_refresh();
        self.weather_cadence = Some(Cadence::new(self.refresh_interval(), now));

        self.flush();
        info!("Display controller running with theme {}", self.catalog.current().name);
        Ok(())
    }

    fn arm_clock(&mut self, now: Instant) {
        // land on the next wall-clock second boundary
        let into_second = Duration::from_millis(self.wall.now().timestamp_subsec_millis().min(999) as u64);
        let wait = CLOCK_TICK.saturating_sub(into_second);
        self.next_tick = Some(now + if wait.is_zero() { CLOCK_TICK } else { wait });
    }

    /// Re-render the six clock slots. Skipped while the view is hidden.
    pub fn tick(&mut self) {
        if self.phase != Phase::Running || self.hidden {
            return;
        }
        let state = DisplayState::compute(self.wall.now(), &self.options.clock, self.weather.as_ref());
        self.put(Slot::TimeDisplay, &state.time);
        self.put(Slot::DateDisplay, &state.date);
        self.put(Slot::DayName, &state.weekday);
        self.put(Slot::TimePeriod, state.period);
        self.put(Slot::TimezoneDisplay, &state.timezone);
        self.put(Slot::CityDisplay, &state.city);
    }

    /// Earliest pending deadline, `None` when nothing is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.phase != Phase::Running {
            return None;
        }
        [
            self.next_tick,
            self.rotation.next_deadline(),
            self.weather_cadence.as_ref().map(Cadence::next_deadline),
            self.layout_due,
            self.notification.as_ref().map(|(_, at)| *at),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Run everything whose deadline has passed.
    pub fn on_timers(&mut self, now: Instant) {
        if self.phase != Phase::Running {
            return;
        }

        if self.next_tick.is_some_and(|at| at <= now) {
            self.tick();
            self.arm_clock(now);
        }

        let fired = self.rotation.poll(now);
        for _ in 0..fired {
            if !self.rotation_still_wanted() {
                info!("Auto-rotation disabled or targets missing, stopping rotation");
                self.stop_rotation(now);
                break;
            }
            let next = self.catalog.offset(1);
            if let Err(e) = self.select_index(next, ThemeOrigin::Rotation, now) {
                warn!("Rotation step failed: {}", e);
            }
        }

        if self.weather_cadence.as_mut().is_some_and(|c| c.due(now)) {
            if self.hidden || !self.online {
                debug!("Skipping scheduled weather refresh (hidden: {}, online: {})", self.hidden, self.online);
            } else {
                self.request_refresh();
            }
        }

        if self.layout_due.is_some_and(|at| at <= now) {
            self.layout_due = None;
            if let Some(vp) = self.pending_viewport.take() {
                self.apply_viewport(vp);
            }
        }

        if self.notification.as_ref().is_some_and(|(_, at)| *at <= now) {
            self.notification = None;
            self.put(Slot::Notification, "");
        }

        self.flush();
    }

    // themes

    fn apply_theme(&mut self, index: usize, persist: bool) {
        let Some(theme) = self.catalog.get(index).copied() else { return };
        if self.catalog.set_current(index).is_err() {
            return;
        }
        self.put(Slot::MainStyle, theme.path);
        self.put(Slot::StyleDropdown, theme.path);
        if persist {
            self.persist(KEY_SELECTED_STYLE, theme.path);
        }
        debug!("Style changed to {}", theme.path);
    }

    /// Select a catalog entry by path, or by display name as `ThemeCatalog::index_of` allows.
    pub fn select_theme(&mut self, id: &str, origin: ThemeOrigin, now: Instant) -> Result<(), DisplayError> {
        let Some(index) = self.catalog.index_of(id) else {
            warn!("Rejected unknown theme {:?}", id);
            return Err(DisplayError::UnknownTheme(id.to_string()));
        };
        self.select_index(index, origin, now)
    }

    /// Numeric shortcut target, `0..12`.
    pub fn select_theme_by_number(&mut self, index: usize, now: Instant) -> Result<(), DisplayError> {
        if index >= self.catalog.len() {
            warn!("No theme at index {}", index);
            return Err(DisplayError::ThemeIndexOutOfRange(index));
        }
        self.select_index(index, ThemeOrigin::Shortcut, now)
    }

    pub fn cycle_theme(&mut self, direction: i32, origin: ThemeOrigin, now: Instant) -> Result<(), DisplayError> {
        let index = self.catalog.offset(direction);
        self.select_index(index, origin, now)
    }

    fn select_index(&mut self, index: usize, origin: ThemeOrigin, now: Instant) -> Result<(), DisplayError> {
        if self.phase != Phase::Running {
            return Err(DisplayError::NotRunning);
        }
        let theme = *self.catalog.get(index).ok_or(DisplayError::ThemeIndexOutOfRange(index))?;
        self.apply_theme(index, true);

        if origin == ThemeOrigin::Rotation {
            info!("Auto-rotated to theme {} (index {})", theme.name, index);
            self.flush();
            return Ok(());
        }

        let stopped = self.rotation.is_active();
        if stopped {
            self.rotation.stop();
            self.set_toggle(false);
            self.persist(KEY_AUTO_ROTATE, flag_value(false));
            self.render_rotation_status();
            info!("Auto-rotation stopped due to manual theme selection");
        }
        let message = match (origin, stopped) {
            (ThemeOrigin::Picker, true) => format!("Switched to {} theme (auto-rotation stopped)", theme.name),
            (ThemeOrigin::Picker, false) => format!("Switched to {} theme", theme.name),
            (_, true) => format!("Theme: {} (auto-rotation stopped)", theme.name),
            (_, false) => format!("Theme: {}", theme.name),
        };
        self.notify(message, now);
        self.flush();
        Ok(())
    }

    // rotation

    fn set_toggle(&mut self, on: bool) {
        self.auto_rotate = on;
        self.put(Slot::AutoRotate, if on { "on" } else { "off" });
    }

    fn rotation_still_wanted(&self) -> bool {
        let toggle = self.surface.read(Slot::AutoRotate)
            .map(|v| v == "on")
            .unwrap_or(self.auto_rotate);
        toggle && self.surface.has_slot(Slot::MainStyle) && self.surface.has_slot(Slot::StyleDropdown)
    }

    fn render_rotation_status(&mut self) {
        let status = if self.rotation.is_active() { "auto-rotate on" } else { "auto-rotate off" };
        self.put(Slot::AutoRotateStatus, status);
    }

    /// Idempotent: clears any pending rotation, re-syncs the index from what
    /// is displayed, then arms one period from `now`.
    pub fn start_rotation(&mut self, now: Instant) {
        self.rotation.stop();
        let shown = self.surface.read(Slot::StyleDropdown)
            .or_else(|| self.surface.read(Slot::MainStyle));
        let index = match shown.as_deref().and_then(|s| self.catalog.index_of(s)) {
            Some(i) => i,
            None => {
                debug!("Displayed theme {:?} not in catalog, rotating from index 0", shown);
                0
            }
        };
        if let Err(e) = self.catalog.set_current(index) {
            warn!("{}", e);
        }
        self.rotation.start(now);
        self.render_rotation_status();
        let secs = self.rotation.period().as_secs();
        self.notify(format!("Theme rotation started ({}s intervals)", secs), now);
        info!("Auto-rotation started with {}-second intervals from index {}", secs, index);
    }

    pub fn stop_rotation(&mut self, now: Instant) {
        if !self.rotation.is_active() {
            return;
        }
        self.rotation.stop();
        self.render_rotation_status();
        self.notify("Theme rotation stopped", now);
    }

    /// The auto-rotate checkbox.
    pub fn set_auto_rotate(&mut self, on: bool, now: Instant) {
        if self.phase != Phase::Running {
            return;
        }
        self.set_toggle(on);
        self.persist(KEY_AUTO_ROTATE, flag_value(on));
        if on {
            self.start_rotation(now);
        } else {
            self.stop_rotation(now);
        }
        self.flush();
    }

    // fullscreen

    fn render_fullscreen_state(&mut self) {
        let state = match self.shell.as_ref() {
            Some(shell) if shell.is_fullscreen() => "fullscreen",
            _ => "windowed",
        };
        self.put(Slot::FullscreenState, state);
    }

    /// Never fails; problems end up as a notification.
    pub fn toggle_fullscreen(&mut self, now: Instant) {
        let outcome = match self.shell.as_mut() {
            None => Err("Fullscreen not available".to_string()),
            Some(shell) if !shell.supports_fullscreen() => Err("Fullscreen not available".to_string()),
            Some(shell) if shell.is_fullscreen() => shell.exit_fullscreen().map_err(|e| {
                warn!("Error leaving fullscreen: {}", e);
                "Could not exit fullscreen".to_string()
            }),
            Some(shell) => shell.request_fullscreen().map_err(|e| {
                warn!("Error attempting to enable fullscreen: {}", e);
                "Could not enter fullscreen".to_string()
            }),
        };
        if let Err(message) = outcome {
            self.notify(message, now);
        }
        self.render_fullscreen_state();
        self.flush();
    }

    // settings panel

    fn render_panel(&mut self) {
        let pos = self.panel.position();
        let state = if self.panel.is_minimized() { "minimized" } else { "expanded" };
        self.put(Slot::ThemePanel, &format!("{} {},{}", state, pos.x, pos.y));
        self.put(Slot::MinimizeButton, self.panel.minimize_glyph());
    }

    fn persist_panel_position(&mut self) {
        match serde_json::to_string(&self.panel.position()) {
            Ok(json) => self.persist(KEY_PANEL_POSITION, &json),
            Err(e) => warn!("Could not encode panel position: {}", e),
        }
    }

    pub fn toggle_minimize(&mut self) {
        let minimized = self.panel.toggle_minimize();
        self.persist(KEY_PANEL_MINIMIZED, flag_value(minimized));
        self.render_panel();
        self.flush();
    }

    pub fn pointer_down(&mut self, x: i32, y: i32, target: PointerTarget) -> bool {
        self.panel.begin_drag(x, y, target)
    }

    pub fn pointer_move(&mut self, x: i32, y: i32) {
        if !self.panel.is_dragging() {
            return;
        }
        if self.panel.drag_to(x, y, self.viewport).is_some() {
            self.render_panel();
            self.flush();
        }
    }

    pub fn pointer_up(&mut self) -> Option<PanelPosition> {
        let pos = self.panel.end_drag()?;
        self.persist_panel_position();
        Some(pos)
    }

    // viewport

    fn apply_view_class(&mut self) {
        let class = self.viewport.class();
        if self.view_class != Some(class) {
            info!("Applied responsive adjustments for {}", class);
            self.view_class = Some(class);
        }
        self.put(Slot::ViewClass, class.marker());
    }

    fn apply_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if self.panel.clamp(viewport) {
            debug!("Panel pulled back inside {}x{}", viewport.width, viewport.height);
            self.persist_panel_position();
            self.render_panel();
        }
        self.apply_view_class();
    }

    /// Debounced: the layout settles 250 ms after the last resize.
    pub fn resize(&mut self, viewport: Viewport, now: Instant) {
        self.pending_viewport = Some(viewport);
        self.layout_due = Some(now + RESIZE_DEBOUNCE);
    }

    pub fn orientation_change(&mut self, viewport: Viewport, now: Instant) {
        self.pending_viewport = Some(viewport);
        self.layout_due = Some(now + ORIENTATION_SETTLE);
    }

    // lifecycle and connectivity

    pub fn set_hidden(&mut self, hidden: bool) {
        if self.hidden == hidden {
            return;
        }
        self.hidden = hidden;
        if !hidden && self.phase == Phase::Running {
            debug!("View visible again, refreshing");
            self.tick();
            self.request_refresh();
            self.flush();
        }
    }

    pub fn set_network(&mut self, online: bool, slow: bool, now: Instant) {
        let came_back = online && !self.online;
        self.online = online;
        if slow != self.slow_connection {
            self.slow_connection = slow;
            let interval = self.refresh_interval();
            if let Some(c) = self.weather_cadence.as_mut() {
                c.set_period(interval, now);
                c.rearm(now);
            }
            info!("Weather refresh every {:?} ({} connection)", self.refresh_interval(), if slow { "slow" } else { "normal" });
        }
        if came_back && self.phase == Phase::Running {
            info!("Back online, refreshing weather");
            self.request_refresh();
        }
    }

    // weather

    fn request_refresh(&mut self) {
        self.refresh_requested = true;
    }

    /// Manual refresh from the key or a click on the weather panel.
    pub fn refresh_weather(&mut self, now: Instant) {
        if self.phase != Phase::Running {
            return;
        }
        self.request_refresh();
        self.notify("Refreshing weather...", now);
        self.flush();
    }

    /// True once per requested refresh; the caller owns the fetch.
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }

    fn render_loading(&mut self) {
        if self.weather.as_ref().is_some_and(|w| !w.placeholder) {
            return;
        }
        self.put(Slot::WeatherIcon, "⏳");
        self.put(Slot::Temperature, "Loading...");
        self.put(Slot::WeatherDescription, "Updating weather...");
        for slot in [Slot::FeelsLike, Slot::Humidity, Slot::WindSpeed, Slot::Pressure, Slot::UvIndex, Slot::Visibility] {
            self.put(slot, UNKNOWN_TEXT);
        }
    }

    fn updated_label(&self, at: DateTime<Utc>) -> String {
        let local = at.with_timezone(&self.options.clock.tz);
        format!("Updated: {}", local.format("%-I:%M:%S %p"))
    }

    fn render_weather(&mut self, rec: &WeatherRecord) {
        self.put(Slot::WeatherIcon, &rec.icon);
        self.put(Slot::Temperature, &format!("{}°F", rec.temperature));
        self.put(Slot::WeatherDescription, &rec.description);
        self.put(Slot::Location, &rec.location);
        self.put(Slot::FeelsLike, &format!("{}°F", rec.feels_like));
        self.put(Slot::Humidity, &rec.humidity.render(|h| format!("{}%", h)));
        self.put(Slot::WindSpeed, &rec.wind_speed.render(|w| format!("{} mph", w)));
        self.put(Slot::Pressure, &rec.pressure.render(|p| format!("{:.2} in", p)));
        self.put(Slot::UvIndex, &rec.uv_index.render(|u| format!("{}", u)));
        self.put(Slot::Visibility, &rec.visibility.render(|v| format!("{:.1} mi", v)));
        let updated = self.updated_label(rec.observed_at);
        self.put(Slot::WeatherUpdateTime, &updated);
        if !rec.placeholder && !rec.city().is_empty() {
            self.put(Slot::CityDisplay, rec.city());
        }
    }

    /// Show a record from the pipeline. A record older than the real one
    /// on screen is a late answer to a superseded fetch and is dropped.
    pub fn deliver_weather(&mut self, record: WeatherRecord) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        if let Some(current) = self.weather.as_ref() {
            if !current.placeholder && record.observed_at < current.observed_at {
                debug!("Ignoring stale weather from {} observed {}", record.source, record.observed_at);
                return false;
            }
        }
        self.render_weather(&record);
        self.weather = Some(record);
        self.flush();
        true
    }

    // input

    pub fn handle_key(&mut self, input: &KeyInput, now: Instant) {
        if self.phase != Phase::Running {
            return;
        }
        match dispatch(input, self.options.hardening.numeric_theme_keys) {
            Some(Shortcut::CycleTheme) => {
                if let Err(e) = self.cycle_theme(1, ThemeOrigin::Shortcut, now) {
                    warn!("{}", e);
                }
            }
            Some(Shortcut::ToggleFullscreen) => self.toggle_fullscreen(now),
            Some(Shortcut::RefreshWeather) => self.refresh_weather(now),
            Some(Shortcut::SelectTheme(index)) => {
                if let Err(e) = self.select_theme_by_number(index, now) {
                    warn!("{}", e);
                }
            }
            None => debug!("Unbound key {:?}", input.key),
        }
    }

    pub fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(input) => self.handle_key(&input, now),
            Event::PointerDown { x, y, target } => {
                self.pointer_down(x, y, target);
            }
            Event::PointerMove { x, y } => self.pointer_move(x, y),
            Event::PointerUp => {
                self.pointer_up();
            }
            Event::Resize(vp) => self.resize(vp, now),
            Event::OrientationChange(vp) => self.orientation_change(vp, now),
            Event::Visibility { hidden } => self.set_hidden(hidden),
            Event::Network { online, slow } => self.set_network(online, slow, now),
            Event::SelectTheme(id) => {
                // rejection is already logged
                let _ = self.select_theme(&id, ThemeOrigin::Picker, now);
            }
            Event::SetAutoRotate(on) => self.set_auto_rotate(on, now),
            Event::ToggleMinimize => self.toggle_minimize(),
            Event::FullscreenButton => self.toggle_fullscreen(now),
            Event::WeatherClick => self.refresh_weather(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::board::SlotBoard;
    use crate::display::error::ShellError;
    use crate::display::traits::FixedWallClock;
    use crate::prefs::MemoryStore;
    use crate::weather::tests::sample;
    use chrono::TimeZone;

    type Ctl = DisplayController<SlotBoard, MemoryStore>;

    fn wall() -> FixedWallClock {
        FixedWallClock::new(Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap())
    }

    fn controller(board: SlotBoard, store: MemoryStore) -> Ctl {
        DisplayController::new(board, store, ControllerOptions::default()).with_wall_clock(Box::new(wall()))
    }

    fn running(store: MemoryStore) -> (Ctl, Instant) {
        let now = Instant::now();
        let mut ctl = controller(SlotBoard::full(), store);
        ctl.initialize(now).unwrap();
        (ctl, now)
    }

    struct FakeShell {
        supported: bool,
        refuse: bool,
        active: bool,
    }

    impl HostShell for FakeShell {
        fn supports_fullscreen(&self) -> bool {
            self.supported
        }
        fn is_fullscreen(&self) -> bool {
            self.active
        }
        fn request_fullscreen(&mut self) -> Result<(), ShellError> {
            if self.refuse {
                return Err(ShellError::Denied("not allowed".to_string()));
            }
            self.active = true;
            Ok(())
        }
        fn exit_fullscreen(&mut self) -> Result<(), ShellError> {
            self.active = false;
            Ok(())
        }
    }

    #[test]
    fn missing_target_fails_with_fallback_view() {
        let now = Instant::now();
        let board = SlotBoard::full().without(Slot::Humidity);
        let mut ctl = controller(board, MemoryStore::new());
        let err = ctl.initialize(now).unwrap_err();
        assert!(matches!(err, DisplayError::MissingTargets(ref ids) if ids == &vec!["humidity"]));
        assert_eq!(ctl.phase(), Phase::Failed);
        assert_eq!(ctl.next_deadline(), None);
        let board = ctl.surface();
        assert_eq!(board.text(Slot::WeatherDescription), "Weather unavailable");
        assert_eq!(board.text(Slot::Location), "Location unknown");
        assert_eq!(board.text(Slot::Temperature), "--°F");
        assert_eq!(board.text(Slot::TimeDisplay), "");
    }

    #[test]
    fn initialize_renders_clock_and_requests_weather() {
        let (mut ctl, now) = running(MemoryStore::new());
        let board = ctl.surface();
        assert_eq!(board.text(Slot::TimeDisplay), "09:30:00 AM");
        assert_eq!(board.text(Slot::DateDisplay), "January 15, 2024");
        assert_eq!(board.text(Slot::DayName), "Monday");
        assert_eq!(board.text(Slot::TimePeriod), "Morning");
        assert_eq!(board.text(Slot::Temperature), "Loading...");
        assert_eq!(board.text(Slot::ViewClass), "desktop-view");
        assert_eq!(board.text(Slot::MainStyle), "style.css");
        assert!(ctl.take_refresh_request());
        assert!(!ctl.take_refresh_request());
        assert_eq!(ctl.next_deadline(), Some(now + CLOCK_TICK));
    }

    #[test]
    fn restores_preferences() {
        let store = MemoryStore::with_values(&[
            (KEY_SELECTED_STYLE, "styles/forest.css"),
            (KEY_PANEL_POSITION, r#"{"x":5000,"y":40}"#),
            (KEY_PANEL_MINIMIZED, "true"),
            (KEY_AUTO_ROTATE, "true"),
        ]);
        let (ctl, now) = running(store);
        assert_eq!(ctl.catalog().current().name, "Forest");
        assert_eq!(ctl.surface().text(Slot::StyleDropdown), "styles/forest.css");
        assert!(ctl.panel().is_minimized());
        assert_eq!(ctl.surface().text(Slot::MinimizeButton), "+");
        // clamped to 1280 - 260 and saved back
        assert_eq!(ctl.panel().position(), PanelPosition { x: 1020, y: 40 });
        assert_eq!(ctl.store().get(KEY_PANEL_POSITION).as_deref(), Some(r#"{"x":1020,"y":40}"#));
        assert!(ctl.is_rotating());
        assert!(ctl.next_deadline().unwrap() <= now + ROTATE_PERIOD);
    }

    #[test]
    fn unknown_saved_theme_falls_back_to_first() {
        let (ctl, _) = running(MemoryStore::with_values(&[(KEY_SELECTED_STYLE, "http://evil/x.css")]));
        assert_eq!(ctl.catalog().current_index(), 0);
    }

    #[test]
    fn unknown_theme_is_a_no_op() {
        let (mut ctl, now) = running(MemoryStore::new());
        ctl.select_theme("styles/ocean.css", ThemeOrigin::Picker, now).unwrap();
        let writes = ctl.surface().writes;
        let err = ctl.select_theme("../../etc/passwd", ThemeOrigin::Picker, now).unwrap_err();
        assert!(matches!(err, DisplayError::UnknownTheme(_)));
        assert_eq!(ctl.catalog().current().name, "Ocean");
        assert_eq!(ctl.surface().writes, writes);
        assert_eq!(ctl.store().get(KEY_SELECTED_STYLE).as_deref(), Some("styles/ocean.css"));
    }

    #[test]
    fn manual_selection_stops_rotation_and_persists() {
        let (mut ctl, now) = running(MemoryStore::new());
        ctl.set_auto_rotate(true, now);
        assert!(ctl.is_rotating());
        assert_eq!(ctl.store().get(KEY_AUTO_ROTATE).as_deref(), Some("true"));

        ctl.select_theme("styles/neon.css", ThemeOrigin::Picker, now).unwrap();
        assert!(!ctl.is_rotating());
        assert_eq!(ctl.store().get(KEY_AUTO_ROTATE).as_deref(), Some("false"));
        assert_eq!(ctl.surface().text(Slot::AutoRotate), "off");
        assert_eq!(ctl.notification(), Some("Switched to Neon theme (auto-rotation stopped)"));
    }

    #[test]
    fn rotation_advances_once_per_period() {
        let (mut ctl, t0) = running(MemoryStore::new());
        ctl.select_theme("styles/candy.css", ThemeOrigin::Picker, t0).unwrap();
        ctl.set_auto_rotate(true, t0);
        ctl.on_timers(t0 + Duration::from_secs(90));
        // 11 + 3 wraps to 2
        assert_eq!(ctl.catalog().current_index(), 2);
        assert_eq!(ctl.store().get(KEY_SELECTED_STYLE).as_deref(), Some("styles/ocean.css"));
        assert!(ctl.is_rotating());
    }

    #[test]
    fn start_rotation_twice_keeps_one_timer() {
        let (mut ctl, t0) = running(MemoryStore::new());
        ctl.start_rotation(t0);
        ctl.start_rotation(t0 + Duration::from_secs(10));
        ctl.on_timers(t0 + Duration::from_secs(39));
        assert_eq!(ctl.catalog().current_index(), 0);
        ctl.on_timers(t0 + Duration::from_secs(40));
        assert_eq!(ctl.catalog().current_index(), 1);
    }

    #[test]
    fn start_rotation_resyncs_from_displayed_theme() {
        let (mut ctl, t0) = running(MemoryStore::new());
        ctl.surface_mut().write(Slot::StyleDropdown, "styles/aurora.css");
        ctl.start_rotation(t0);
        ctl.on_timers(t0 + ROTATE_PERIOD);
        assert_eq!(ctl.catalog().current().name, "Vintage");
    }

    #[test]
    fn rotation_self_stops_when_toggle_cleared_elsewhere() {
        let (mut ctl, t0) = running(MemoryStore::new());
        ctl.set_auto_rotate(true, t0);
        ctl.surface_mut().write(Slot::AutoRotate, "off");
        ctl.on_timers(t0 + ROTATE_PERIOD);
        assert!(!ctl.is_rotating());
        assert_eq!(ctl.catalog().current_index(), 0);
    }

    #[test]
    fn rotation_self_stops_without_style_targets() {
        let now = Instant::now();
        let board = SlotBoard::full().without(Slot::MainStyle);
        let mut ctl = controller(board, MemoryStore::new());
        ctl.initialize(now).unwrap();
        ctl.set_auto_rotate(true, now);
        ctl.on_timers(now + ROTATE_PERIOD);
        assert!(!ctl.is_rotating());
    }

    #[test]
    fn keys_cycle_and_jump() {
        let (mut ctl, now) = running(MemoryStore::new());
        ctl.handle_key(&KeyInput::new("t"), now);
        assert_eq!(ctl.catalog().current_index(), 1);
        assert_eq!(ctl.notification(), Some("Theme: Dark"));
        ctl.handle_key(&KeyInput::new("="), now);
        assert_eq!(ctl.catalog().current_index(), 11);
        ctl.handle_key(&KeyInput::new("0"), now);
        assert_eq!(ctl.catalog().current_index(), 9);
        ctl.handle_key(&KeyInput::in_text_input("t"), now);
        assert_eq!(ctl.catalog().current_index(), 9);
    }

    #[test]
    fn numeric_keys_need_hardening() {
        let now = Instant::now();
        let options = ControllerOptions { hardening: Hardening::relaxed(), ..ControllerOptions::default() };
        let mut ctl = DisplayController::new(SlotBoard::full(), MemoryStore::new(), options)
            .with_wall_clock(Box::new(wall()));
        ctl.initialize(now).unwrap();
        ctl.handle_key(&KeyInput::new("5"), now);
        assert_eq!(ctl.catalog().current_index(), 0);
    }

    #[test]
    fn refresh_key_requests_weather() {
        let (mut ctl, now) = running(MemoryStore::new());
        ctl.take_refresh_request();
        ctl.handle_key(&KeyInput::new("r"), now);
        assert!(ctl.take_refresh_request());
        assert_eq!(ctl.notification(), Some("Refreshing weather..."));
    }

    #[test]
    fn fullscreen_without_shell_only_notifies() {
        let (mut ctl, now) = running(MemoryStore::new());
        ctl.toggle_fullscreen(now);
        assert_eq!(ctl.notification(), Some("Fullscreen not available"));
        assert_eq!(ctl.phase(), Phase::Running);
    }

    #[test]
    fn fullscreen_refusal_notifies_and_success_toggles() {
        let now = Instant::now();
        let mut ctl = controller(SlotBoard::full(), MemoryStore::new())
            .with_shell(Box::new(FakeShell { supported: true, refuse: true, active: false }));
        ctl.initialize(now).unwrap();
        ctl.toggle_fullscreen(now);
        assert_eq!(ctl.notification(), Some("Could not enter fullscreen"));
        assert_eq!(ctl.surface().text(Slot::FullscreenState), "windowed");

        let mut ctl = controller(SlotBoard::full(), MemoryStore::new())
            .with_shell(Box::new(FakeShell { supported: true, refuse: false, active: false }));
        ctl.initialize(now).unwrap();
        ctl.handle_key(&KeyInput::new("f"), now);
        assert_eq!(ctl.surface().text(Slot::FullscreenState), "fullscreen");
        ctl.handle_key(&KeyInput::new("f"), now);
        assert_eq!(ctl.surface().text(Slot::FullscreenState), "windowed");
    }

    #[test]
    fn drag_persists_on_release_and_ignores_controls() {
        let (mut ctl, _) = running(MemoryStore::new());
        assert!(!ctl.pointer_down(10, 10, PointerTarget::Control));
        ctl.pointer_move(400, 400);
        assert_eq!(ctl.panel().position(), PanelPosition::default());

        assert!(ctl.pointer_down(10, 10, PointerTarget::Panel));
        ctl.pointer_move(110, 60);
        assert_eq!(ctl.store().get(KEY_PANEL_POSITION), None);
        assert_eq!(ctl.pointer_up(), Some(PanelPosition { x: 100, y: 50 }));
        assert_eq!(ctl.store().get(KEY_PANEL_POSITION).as_deref(), Some(r#"{"x":100,"y":50}"#));
        assert_eq!(ctl.surface().text(Slot::ThemePanel), "expanded 100,50");
    }

    #[test]
    fn console_drag_with_extreme_coordinates_is_clamped() {
        let (mut ctl, now) = running(MemoryStore::new());
        for event in crate::display::events::parse_console_line("drag -2147483648 0 10 10") {
            ctl.handle_event(event, now);
        }
        assert_eq!(ctl.panel().position(), PanelPosition { x: 1020, y: 10 });
        assert_eq!(ctl.store().get(KEY_PANEL_POSITION).as_deref(), Some(r#"{"x":1020,"y":10}"#));
        assert_eq!(ctl.phase(), Phase::Running);
    }

    #[test]
    fn resize_is_debounced_then_clamps_panel() {
        let (mut ctl, t0) = running(MemoryStore::new());
        ctl.pointer_down(0, 0, PointerTarget::Panel);
        ctl.pointer_move(900, 500);
        ctl.pointer_up();

        ctl.resize(Viewport::new(900, 700), t0);
        ctl.resize(Viewport::new(700, 500), t0 + Duration::from_millis(200));
        ctl.on_timers(t0 + Duration::from_millis(300));
        assert_eq!(ctl.view_class(), Some(ViewClass::Desktop));

        ctl.on_timers(t0 + Duration::from_millis(450));
        assert_eq!(ctl.view_class(), Some(ViewClass::Mobile));
        assert_eq!(ctl.surface().text(Slot::ViewClass), "mobile-view");
        assert_eq!(ctl.panel().position(), PanelPosition { x: 440, y: 320 });
        assert_eq!(ctl.store().get(KEY_PANEL_POSITION).as_deref(), Some(r#"{"x":440,"y":320}"#));
    }

    #[test]
    fn minimize_toggle_persists() {
        let (mut ctl, _) = running(MemoryStore::new());
        ctl.toggle_minimize();
        assert_eq!(ctl.store().get(KEY_PANEL_MINIMIZED).as_deref(), Some("true"));
        assert_eq!(ctl.surface().text(Slot::MinimizeButton), "+");
        ctl.toggle_minimize();
        assert_eq!(ctl.store().get(KEY_PANEL_MINIMIZED).as_deref(), Some("false"));
        assert_eq!(ctl.surface().text(Slot::MinimizeButton), "−");
    }

    #[test]
    fn failing_store_does_not_break_selection() {
        let (mut ctl, now) = running(MemoryStore::read_only(&[]));
        ctl.select_theme("styles/dark.css", ThemeOrigin::Picker, now).unwrap();
        assert_eq!(ctl.catalog().current().name, "Dark");
    }

    #[test]
    fn weather_renders_units_and_unknowns() {
        let (mut ctl, _) = running(MemoryStore::new());
        let mut rec = sample(72);
        rec.uv_index = crate::weather::Reading::Unknown;
        assert!(ctl.deliver_weather(rec));
        let board = ctl.surface();
        assert_eq!(board.text(Slot::Temperature), "72°F");
        assert_eq!(board.text(Slot::FeelsLike), "70°F");
        assert_eq!(board.text(Slot::Humidity), "65%");
        assert_eq!(board.text(Slot::WindSpeed), "5 mph");
        assert_eq!(board.text(Slot::Pressure), "30.01 in");
        assert_eq!(board.text(Slot::UvIndex), "--");
        assert_eq!(board.text(Slot::Visibility), "10.0 mi");
        assert_eq!(board.text(Slot::CityDisplay), "Atlanta");
        assert_eq!(board.text(Slot::WeatherUpdateTime), "Updated: 9:30:00 AM");
    }

    #[test]
    fn late_weather_is_ignored() {
        let (mut ctl, _) = running(MemoryStore::new());
        let fresh = sample(70);
        let mut stale = sample(50);
        stale.observed_at = fresh.observed_at - chrono::Duration::minutes(10);
        assert!(ctl.deliver_weather(fresh));
        assert!(!ctl.deliver_weather(stale));
        assert_eq!(ctl.surface().text(Slot::Temperature), "70°F");
    }

    #[test]
    fn sanitizes_provider_text() {
        let (mut ctl, _) = running(MemoryStore::new());
        let mut rec = sample(70);
        rec.description = "Fog<script>steal()</script>".to_string();
        ctl.deliver_weather(rec);
        assert_eq!(ctl.surface().text(Slot::WeatherDescription), "Fog");
    }

    #[test]
    fn notification_expires() {
        let (mut ctl, t0) = running(MemoryStore::new());
        ctl.select_theme("styles/sunset.css", ThemeOrigin::Picker, t0).unwrap();
        assert_eq!(ctl.surface().text(Slot::Notification), "Switched to Sunset theme");
        ctl.on_timers(t0 + NOTIFICATION_TTL);
        assert_eq!(ctl.notification(), None);
        assert_eq!(ctl.surface().text(Slot::Notification), "");
    }

    #[test]
    fn hidden_view_skips_clock_and_scheduled_weather() {
        let (mut ctl, t0) = running(MemoryStore::new());
        ctl.take_refresh_request();
        ctl.set_hidden(true);
        ctl.surface_mut().write(Slot::TimeDisplay, "stale");
        ctl.on_timers(t0 + WEATHER_REFRESH);
        assert_eq!(ctl.surface().text(Slot::TimeDisplay), "stale");
        assert!(!ctl.take_refresh_request());

        ctl.set_hidden(false);
        assert_eq!(ctl.surface().text(Slot::TimeDisplay), "09:30:00 AM");
        assert!(ctl.take_refresh_request());
    }

    #[test]
    fn connectivity_changes() {
        let (mut ctl, t0) = running(MemoryStore::new());
        ctl.take_refresh_request();
        ctl.set_network(false, false, t0);
        ctl.on_timers(t0 + WEATHER_REFRESH);
        assert!(!ctl.take_refresh_request());
        ctl.set_network(true, false, t0 + WEATHER_REFRESH);
        assert!(ctl.take_refresh_request());

        let t1 = t0 + WEATHER_REFRESH;
        ctl.set_network(true, true, t1);
        ctl.on_timers(t1 + WEATHER_REFRESH);
        assert!(!ctl.take_refresh_request());
        ctl.on_timers(t1 + WEATHER_REFRESH_SLOW);
        assert!(ctl.take_refresh_request());
    }
}
