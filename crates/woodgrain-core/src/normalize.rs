// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Min–max rescaling of sampled noise across every discovered height.

use crate::error::NormalizeError;
use crate::height_map::{NoiseMap, NormalizedMap};

/// Rescales every sample to `(v - min) / (max - min)`.
///
/// A single sample maps to 0. Two or more samples sharing one value are a
/// [`NormalizeError::DegenerateRange`]: there is no curve to spread.
pub fn normalize(noise: &NoiseMap) -> Result<NormalizedMap, NormalizeError> {
    let map = noise.as_map();
    if map.is_empty() {
        return Err(NormalizeError::Empty);
    }
    if map.len() == 1 {
        return Ok(NormalizedMap(map.map_values(|_| 0.0)));
    }

    let (min, max) = map
        .values()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;
    if !(span.is_finite() && span > 0.0) {
        return Err(NormalizeError::DegenerateRange {
            heights: map.len(),
            min,
            max,
        });
    }

    Ok(NormalizedMap(map.map_values(|v| (v - min) / span)))
}
