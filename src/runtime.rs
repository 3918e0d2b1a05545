/*
 *  runtime.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display event loop, timers, input and weather delivery
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

use log::{debug, info};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::display::controller::DisplayController;
use crate::display::events::Event;
use crate::display::traits::RenderSurface;
use crate::pipeline::WeatherPipeline;
use crate::prefs::PreferenceStore;
use crate::weather::WeatherRecord;

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn spawn_refresh(pipeline: &Arc<WeatherPipeline>, tx: &mpsc::Sender<WeatherRecord>) {
    let pipeline = Arc::clone(pipeline);
    let tx = tx.clone();
    tokio::spawn(async move {
        let record = pipeline.refresh().await;
        if tx.send(record).await.is_err() {
            debug!("Display loop gone, dropping weather result");
        }
    });
}

/// Drive an initialized controller until `shutdown` resolves.
///
/// The controller is only touched from this loop. Weather fetches run as
/// separate tasks and hand their records back over a channel, so a slow
/// provider never holds up the clock or input handling.
pub async fn run<S, P, F>(
    mut controller: DisplayController<S, P>,
    pipeline: Arc<WeatherPipeline>,
    mut events: mpsc::Receiver<Event>,
    shutdown: F,
) -> DisplayController<S, P>
where
    S: RenderSurface,
    P: PreferenceStore,
    F: Future<Output = ()>,
{
    let (weather_tx, mut weather_rx) = mpsc::channel::<WeatherRecord>(4);
    let mut inputs_open = true;
    tokio::pin!(shutdown);

    loop {
        if controller.take_refresh_request() {
            spawn_refresh(&pipeline, &weather_tx);
        }
        let deadline = controller.next_deadline();

        tokio::select! {
            _ = &mut shutdown => {
                info!("Display loop shutting down");
                break;
            }
            _ = sleep_until_opt(deadline) => {
                controller.on_timers(Instant::now());
            }
            event = events.recv(), if inputs_open => match event {
                Some(event) => controller.handle_event(event, Instant::now()),
                None => {
                    debug!("Input channel closed");
                    inputs_open = false;
                }
            },
            Some(record) = weather_rx.recv() => {
                controller.deliver_weather(record);
            }
        }
    }
    controller
}
