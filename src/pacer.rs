/*
 *  pacer.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Fixed period deadlines for the event loop
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

use std::time::Duration;
use tokio::time::Instant;

/// Fixed-period deadline, polled by the event loop.
///
/// A late poll fires once and re-arms one period from `now`; missed
/// periods are dropped, the way a wall clock only cares about the latest
/// second.
#[derive(Debug, Clone)]
pub struct Cadence {
    next_deadline: Instant,
    period: Duration,
}

impl Cadence {
    /// First deadline one period after `now`.
    pub fn new(period: Duration, now: Instant) -> Self {
        Self { next_deadline: now + period, period }
    }

    #[inline]
    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Change the period; the pending deadline is pulled in if the new period is shorter.
    pub fn set_period(&mut self, period: Duration, now: Instant) {
        self.period = period;
        let candidate = now + period;
        if candidate < self.next_deadline {
            self.next_deadline = candidate;
        }
    }

    /// Returns true if the deadline has passed; if true, it also schedules the next one.
    #[inline]
    pub fn due(&mut self, now: Instant) -> bool {
        if now >= self.next_deadline {
            self.next_deadline += self.period;
            if self.next_deadline <= now {
                self.next_deadline = now + self.period;
            }
            true
        } else {
            false
        }
    }

    /// Push the deadline a full period out from `now`.
    pub fn rearm(&mut self, now: Instant) {
        self.next_deadline = now + self.period;
    }
}
