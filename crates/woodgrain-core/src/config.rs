// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wood grain settings.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::noise::NoiseField;

/// Settings for one transform.
///
/// Field names serialize in camelCase (`minTemp`, `grainSize`, …), matching
/// the host plugin's setting keys. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WoodGrainConfig {
    /// Lowest print temperature (°C).
    pub min_temp: f64,
    /// Highest print temperature (°C).
    pub max_temp: f64,
    /// Average grain size (mm).
    pub grain_size: f64,
    /// Starting temperature held for the first `first_temp_hold` mm; 0 disables.
    pub first_temp: f64,
    /// Exponent applied to each sample; above 1 makes dark bands sparser.
    pub spikiness_power: f64,
    /// Largest instantaneous temperature rise (°C); 0 disables the cap.
    ///
    /// The cap holds on the scheduled values. Commands carry whole degrees, so
    /// with a fractional cap two emitted values may differ by up to one degree
    /// more (2.5 allows 190.4 -> 192.9, written as 190 then 193).
    pub max_upward: f64,
    /// Vertical shift of the noise curve (mm).
    pub z_offset: f64,
    /// Permutation seed; 0 means non-deterministic.
    pub random_seed: u64,
    /// Rises larger than this (mm) are treated as travel/homing, not layers.
    pub discontinuity_threshold: f64,
    /// Smallest height change (mm) that counts as a new layer.
    pub minimum_step: f64,
    /// Height (mm) up to which a nonzero `first_temp` is held.
    pub first_temp_hold: f64,
    /// Noise lattice period.
    pub tile_dim: usize,
}

impl Default for WoodGrainConfig {
    fn default() -> Self {
        Self {
            min_temp: 180.0,
            max_temp: 230.0,
            grain_size: 3.0,
            first_temp: 0.0,
            spikiness_power: 1.0,
            max_upward: 0.0,
            z_offset: 0.0,
            random_seed: 0,
            discontinuity_threshold: 2.0,
            minimum_step: 0.1,
            first_temp_hold: 0.5,
            tile_dim: NoiseField::DEFAULT_TILE_DIM,
        }
    }
}

impl WoodGrainConfig {
    /// Parses a JSON profile and validates it.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every range invariant the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("minTemp", self.min_temp),
            ("maxTemp", self.max_temp),
            ("grainSize", self.grain_size),
            ("firstTemp", self.first_temp),
            ("spikinessPower", self.spikiness_power),
            ("maxUpward", self.max_upward),
            ("zOffset", self.z_offset),
            ("discontinuityThreshold", self.discontinuity_threshold),
            ("minimumStep", self.minimum_step),
            ("firstTempHold", self.first_temp_hold),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }

        if self.max_temp == self.min_temp {
            return Err(ConfigError::DegenerateTemperatureRange(self.min_temp));
        }
        if self.max_temp < self.min_temp {
            return Err(ConfigError::InvertedTemperatureRange {
                min: self.min_temp,
                max: self.max_temp,
            });
        }

        for (field, value) in [
            ("grainSize", self.grain_size),
            ("spikinessPower", self.spikiness_power),
            ("discontinuityThreshold", self.discontinuity_threshold),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        for (field, value) in [
            ("firstTemp", self.first_temp),
            ("maxUpward", self.max_upward),
            ("minimumStep", self.minimum_step),
            ("firstTempHold", self.first_temp_hold),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.tile_dim < 2 {
            return Err(ConfigError::TileDimTooSmall(self.tile_dim));
        }
        Ok(())
    }

    /// Whether the start temperature override is enabled.
    pub fn has_first_temp(&self) -> bool {
        self.first_temp != 0.0
    }
}
