/*
 *  hardening.rs
 *
 *  AtomClock - tick, tock, forecast
 *  (c) 2020-26 Stuart Hunter
 *
 *  Hardening switches shared by display and weather
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

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_RETRIES, PROVIDER_CALL_GAP};
use crate::pipeline::PipelineOptions;

/// Defensive switches shared by the controller and the weather pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hardening {
    /// Strip markup and script payloads before writing to a render slot
    pub sanitize_output: bool,
    /// Keep provider calls at least 100 ms apart
    pub rate_limit_provider_calls: bool,
    pub max_retries: u32,
    /// Digits and `-`/`=` jump straight to a theme
    pub numeric_theme_keys: bool,
}

impl Default for Hardening {
    fn default() -> Self {
        Self {
            sanitize_output: true,
            rate_limit_provider_calls: true,
            max_retries: DEFAULT_MAX_RETRIES,
            numeric_theme_keys: true,
        }
    }
}

impl Hardening {
    /// Everything off, the behaviour of the plain build.
    pub fn relaxed() -> Self {
        Self {
            sanitize_output: false,
            rate_limit_provider_calls: false,
            max_retries: DEFAULT_MAX_RETRIES,
            numeric_theme_keys: false,
        }
    }

    pub fn pipeline_options(&self, base: PipelineOptions) -> PipelineOptions {
        PipelineOptions {
            max_retries: self.max_retries,
            rate_limit: self.rate_limit_provider_calls.then_some(PROVIDER_CALL_GAP),
            ..base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relaxed_drops_rate_limit() {
        let opts = Hardening::relaxed().pipeline_options(PipelineOptions::default());
        assert_eq!(opts.rate_limit, None);
        let opts = Hardening { max_retries: 4, ..Hardening::default() }.pipeline_options(PipelineOptions::default());
        assert_eq!(opts.rate_limit, Some(PROVIDER_CALL_GAP));
        assert_eq!(opts.max_retries, 4);
    }
}
