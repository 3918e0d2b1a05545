/*
 *  main.rs
 *
 *  AtomClock - tick, tock, forecast
 *	(c) 2020-26 Stuart Hunter
 *
 *	Kiosk entry point: config, logging, weather pipeline and display loop
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use anyhow::Context;
use env_logger::Env;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;

#[cfg(unix)] // Only compile this block on Unix-like systems
use tokio::signal::unix::{signal, SignalKind}; // Import specific Unix signals

use atomclock::config::{self, Config};
use atomclock::constants::GEOLOCATION_TIMEOUT;
use atomclock::display::{
    parse_console_line, ConsoleSurface, DisplayController, Event, TerminalShell,
};
use atomclock::geoloc::IpGeolocator;
use atomclock::location::{Geolocator, LocationResolver};
use atomclock::pipeline::WeatherPipeline;
use atomclock::prefs::{FileStore, MemoryStore, PreferenceStore};
use atomclock::providers::{build_client, OpenMeteo, OpenWeatherMap, WeatherProvider};
use atomclock::runtime;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

#[cfg(unix)]
async fn signal_handler() -> Result<(), Box<dyn std::error::Error>> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
async fn signal_handler() -> Result<(), Box<dyn std::error::Error>> {
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received. Initiating graceful shutdown.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal_handler().await {
        error!("Signal handling unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}

fn build_pipeline(cfg: &Config) -> anyhow::Result<WeatherPipeline> {
    let options = cfg.pipeline_options();
    let client = build_client(options.request_timeout).context("building HTTP client")?;

    let mut providers: Vec<Arc<dyn WeatherProvider>> = vec![Arc::new(OpenMeteo::new(client.clone()))];
    if let Some(key) = cfg.openweathermap_key() {
        match OpenWeatherMap::new(client, key) {
            Ok(owm) => providers.push(Arc::new(owm)),
            Err(e) => warn!("OpenWeatherMap disabled: {}", e),
        }
    }

    let geolocator: Option<Arc<dyn Geolocator>> = if cfg.geolocate() {
        match IpGeolocator::new(GEOLOCATION_TIMEOUT) {
            Ok(g) => Some(Arc::new(g)),
            Err(e) => {
                warn!("Geolocation disabled: {}", e);
                None
            }
        }
    } else {
        None
    };
    let resolver = LocationResolver::new(cfg.default_location(), geolocator);

    info!(
        "Weather providers: {}",
        providers.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
    );
    Ok(WeatherPipeline::new(providers, resolver, options).with_fallback_locations(cfg.fallback_locations()))
}

/// Forward stdin lines to the display loop as events.
fn spawn_console_input(tx: mpsc::Sender<Event>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    for event in parse_console_line(&line) {
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Console input failed: {}", e);
                    break;
                }
            }
        }
    });
}

async fn run_display<P: PreferenceStore>(
    cfg: &Config,
    store: P,
    pipeline: Arc<WeatherPipeline>,
) -> anyhow::Result<()> {
    let mut controller = DisplayController::new(ConsoleSurface::stdout(), store, cfg.controller_options())
        .with_shell(Box::new(TerminalShell::stdout()));
    controller
        .initialize(Instant::now())
        .context("display initialization")?;

    let (tx, rx) = mpsc::channel::<Event>(32);
    spawn_console_input(tx);

    let controller = runtime::run(controller, pipeline, rx, shutdown_signal()).await;
    info!("Stopped with theme {}", controller.catalog().current().name);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let (cfg, cli) = config::load()?;

    if cli.dump_config {
        print!("{}", config::dump_config(&cfg)?);
        return Ok(());
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_filter()))
        .format_timestamp_secs()
        .init();

    info!("v.{} built {} ({})", env!("CARGO_PKG_VERSION"), BUILD_DATE, BUILD_PROFILE);

    let pipeline = Arc::new(build_pipeline(&cfg)?);

    if cli.once {
        let record = pipeline.refresh().await;
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    match cfg.prefs_file() {
        Some(path) => {
            info!("Preferences at {}", path.display());
            run_display(&cfg, FileStore::open(path), pipeline).await
        }
        None => {
            info!("Preferences kept in memory");
            run_display(&cfg, MemoryStore::new(), pipeline).await
        }
    }
}
