// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Noise-to-temperature mapping with a rate-of-rise limit.
//!
//! When a step would heat faster than `max_upward`, the scheduler emits the
//! capped value and carries the clamped excess ("postponed delta") into the
//! next step, so a large jump is spread over several layers instead of lost.
//! The `max_temp` ceiling always wins and discards any carried excess.

use crate::config::WoodGrainConfig;

/// Rate-limited temperature scheduler. One instance per rewrite pass.
#[derive(Debug, Clone)]
pub struct TemperatureScheduler {
    min_temp: f64,
    max_temp: f64,
    max_upward: f64,
    last_emitted: Option<f64>,
    postponed_delta: f64,
}

impl TemperatureScheduler {
    /// Scheduler for `[min_temp, max_temp]`; `max_upward <= 0` disables the cap.
    pub fn new(min_temp: f64, max_temp: f64, max_upward: f64) -> Self {
        Self {
            min_temp,
            max_temp,
            max_upward,
            last_emitted: None,
            postponed_delta: 0.0,
        }
    }

    /// Scheduler using the ranges in `config`.
    pub fn from_config(config: &WoodGrainConfig) -> Self {
        Self::new(config.min_temp, config.max_temp, config.max_upward)
    }

    /// Linear map of `noise` (in `[0, 1]`) onto the temperature range.
    pub fn noise_to_temp(&self, noise: f64) -> f64 {
        self.min_temp + noise * (self.max_temp - self.min_temp)
    }

    /// Next temperature for a transition whose normalized noise is `noise`.
    pub fn schedule(&mut self, noise: f64) -> f64 {
        let mut temp = self.noise_to_temp(noise) + self.postponed_delta;
        self.postponed_delta = 0.0;

        if let Some(last) = self.last_emitted {
            if self.max_upward > 0.0 && temp > last + self.max_upward {
                self.postponed_delta = temp - (last + self.max_upward);
                temp = last + self.max_upward;
            }
        }
        if temp > self.max_temp {
            self.postponed_delta = 0.0;
            temp = self.max_temp;
        }

        self.last_emitted = Some(temp);
        temp
    }

    /// Records a temperature chosen outside the noise curve (startup, start
    /// temperature hold) so the next scheduled step is limited relative to it.
    /// Carried excess is left untouched.
    pub fn hold(&mut self, temp: f64) -> f64 {
        self.last_emitted = Some(temp);
        temp
    }

    /// Excess waiting to be added to the next step.
    pub fn postponed_delta(&self) -> f64 {
        self.postponed_delta
    }
}
