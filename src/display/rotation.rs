/*
 *  display/rotation.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Theme auto-rotation schedule
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

use crate::constants::ROTATE_PERIOD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    Idle,
    Rotating { next_due: Instant },
}

/// Auto-rotation timer. At most one deadline is ever pending.
#[derive(Debug, Clone)]
pub struct Rotation {
    state: RotationState,
    period: Duration,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::new(ROTATE_PERIOD)
    }
}

impl Rotation {
    pub fn new(period: Duration) -> Self {
        Self { state: RotationState::Idle, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> RotationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, RotationState::Rotating { .. })
    }

    /// (Re)arm one full period from `now`, dropping any pending deadline.
    pub fn start(&mut self, now: Instant) {
        self.state = RotationState::Rotating { next_due: now + self.period };
    }

    pub fn stop(&mut self) {
        self.state = RotationState::Idle;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            RotationState::Rotating { next_due } => Some(next_due),
            RotationState::Idle => None,
        }
    }

    /// Number of periods that elapsed by `now`; the deadline moves past
    /// `now` in whole periods so nothing is skipped or doubled.
    pub fn poll(&mut self, now: Instant) -> u32 {
        let RotationState::Rotating { mut next_due } = self.state else {
            return 0;
        };
        let mut fired = 0;
        while next_due <= now {
            fired += 1;
            next_due += self.period;
        }
        self.state = RotationState::Rotating { next_due };
        fired
    }
}
