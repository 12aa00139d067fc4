// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pass 1: discover the heights a toolpath visits and sample noise at each.

use tracing::{debug, instrument};

use crate::config::WoodGrainConfig;
use crate::dialect::{CommandDialect, LineKind};
use crate::error::Diagnostic;
use crate::height_map::{HeightMap, NoiseMap};
use crate::noise::NoiseField;

/// Multiplier applied to the fractal sample before wrapping into `[0, 1)`.
const BANDING: f64 = 3.0;
const OCTAVES: u32 = 2;
const PERSISTENCE: f64 = 0.7;

/// Stream position of the last height change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchPoint {
    /// Layer index.
    pub layer: usize,
    /// Line index inside the layer.
    pub line: usize,
    /// Height reached on that line.
    pub z: f64,
}

/// Everything pass 1 learns about the stream.
#[derive(Debug, Clone, Default)]
pub struct HeightSamples {
    /// Raw wood noise per discovered height; always contains height 0.
    pub noise: NoiseMap,
    /// Last absolute-mode height change; temperature injection stops after it.
    pub last_patch: Option<PatchPoint>,
    /// Recovered parse problems.
    pub diagnostics: Vec<Diagnostic>,
}

/// Wood noise at height `z`: banded fractal noise wrapped into `[0, 1)` and
/// shaped by `spikiness_power`.
pub fn wood_noise(field: &NoiseField, config: &WoodGrainConfig, z: f64) -> f64 {
    let coord = (z + config.z_offset) / (config.grain_size * 2.0);
    let noise = BANDING * field.fractal(OCTAVES, PERSISTENCE, 0.0, 0.0, coord, 1.0);
    let wrapped = noise - noise.floor();
    wrapped.powf(config.spikiness_power)
}

/// Scans layers for height changes while tracking the positioning mode.
pub struct HeightSampler<'a, D> {
    dialect: &'a D,
    field: &'a NoiseField,
    config: &'a WoodGrainConfig,
}

impl<'a, D: CommandDialect> HeightSampler<'a, D> {
    /// Sampler over `field` using `dialect` to read lines.
    pub fn new(dialect: &'a D, field: &'a NoiseField, config: &'a WoodGrainConfig) -> Self {
        Self {
            dialect,
            field,
            config,
        }
    }

    /// Runs pass 1 over `layers`.
    #[instrument(skip_all, fields(layers = layers.len()))]
    pub fn sample<S: AsRef<str>>(&self, layers: &[S]) -> HeightSamples {
        let mut noise = HeightMap::new();
        // Some slicers never write an explicit Z0 on the first layer.
        noise.get_or_insert_with(0.0, || wood_noise(self.field, self.config, 0.0));

        let mut diagnostics = Vec::new();
        let mut last_patch: Option<PatchPoint> = None;
        let mut absolute = true;
        let mut former_z = -1.0;
        let mut current_z: Option<f64> = None;

        for (layer_ix, layer) in layers.iter().enumerate() {
            for (line_ix, line) in layer.as_ref().lines().enumerate() {
                match self.dialect.line_kind(line) {
                    LineKind::AbsolutePositioning => {
                        absolute = true;
                        continue;
                    }
                    LineKind::RelativePositioning => {
                        absolute = false;
                        continue;
                    }
                    LineKind::Motion if absolute => {}
                    _ => continue,
                }
                let z = match self.dialect.extract_field(line, self.dialect.vertical_axis()) {
                    Ok(Some(z)) if z.is_finite() => z,
                    Ok(_) => continue,
                    Err(field) => {
                        diagnostics.push(Diagnostic::MalformedField {
                            layer: layer_ix,
                            line: line_ix,
                            field,
                        });
                        continue;
                    }
                };

                if current_z != Some(z) {
                    last_patch = Some(PatchPoint {
                        layer: layer_ix,
                        line: line_ix,
                        z,
                    });
                    current_z = Some(z);
                }

                if z > former_z + self.config.discontinuity_threshold {
                    debug!(z, former_z, "large rise, not sampled");
                    former_z = z;
                } else if (z - former_z).abs() > self.config.minimum_step {
                    former_z = z;
                    noise.get_or_insert_with(z, || wood_noise(self.field, self.config, z));
                }
            }
        }

        HeightSamples {
            noise: NoiseMap(noise),
            last_patch,
            diagnostics,
        }
    }
}
