// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Two-pass transform façade.

use tracing::{info, instrument, warn};

use crate::config::WoodGrainConfig;
use crate::dialect::{CommandDialect, GcodeDialect};
use crate::error::{Diagnostic, WoodGrainError};
use crate::graph::TemperatureGraph;
use crate::height_map::{NoiseMap, NormalizedMap};
use crate::noise::NoiseField;
use crate::normalize::normalize;
use crate::rewrite::{Injection, StreamRewriter};
use crate::sampler::HeightSampler;

/// Result of a successful transform.
#[derive(Debug, Clone)]
pub struct Woodified {
    /// Rewritten layers, one per input layer.
    pub layers: Vec<String>,
    /// Temperature-vs-height rows, also rendered at the end of the last layer.
    pub graph: TemperatureGraph,
    /// Commands injected after motion lines.
    pub injected: Vec<Injection>,
    /// Temperature set by the startup block.
    pub startup_temperature: Option<i64>,
    /// Raw wood noise per discovered height.
    pub noise: NoiseMap,
    /// Noise rescaled to `[0, 1]`.
    pub normalized: NormalizedMap,
    /// Effective permutation seed; pass it back as `random_seed` to reproduce the run.
    pub seed: u64,
    /// Recovered anomalies, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl Woodified {
    /// Rewritten stream as one string.
    pub fn text(&self) -> String {
        self.layers.concat()
    }
}

/// Wood grain transform over a command dialect.
///
/// ```
/// use woodgrain_core::{WoodGrain, WoodGrainConfig};
///
/// let config = WoodGrainConfig { random_seed: 7, ..WoodGrainConfig::default() };
/// let layers = ["G90\nG1 Z0.2 X1\n", "G1 Z0.4 X2\n", "G1 Z0.6 X3\n"];
/// let out = WoodGrain::new(config).run(&layers).unwrap();
/// assert_eq!(out.layers.len(), 3);
/// assert_eq!(out.injected.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct WoodGrain<D = GcodeDialect> {
    config: WoodGrainConfig,
    dialect: D,
}

impl WoodGrain<GcodeDialect> {
    /// Transform using the default G-code vocabulary.
    pub fn new(config: WoodGrainConfig) -> Self {
        Self::with_dialect(config, GcodeDialect::default())
    }
}

impl<D: CommandDialect> WoodGrain<D> {
    /// Transform using `dialect` to read and write commands.
    pub fn with_dialect(config: WoodGrainConfig, dialect: D) -> Self {
        Self { config, dialect }
    }

    /// Settings in use.
    pub fn config(&self) -> &WoodGrainConfig {
        &self.config
    }

    /// Validates the settings, builds a fresh noise field and runs both passes.
    ///
    /// Nothing is produced on error.
    pub fn run<S: AsRef<str>>(&self, layers: &[S]) -> Result<Woodified, WoodGrainError> {
        self.config.validate()?;
        let field = NoiseField::new(self.config.tile_dim, self.config.random_seed);
        self.run_with_field(layers, &field)
    }

    /// Runs both passes over an existing noise field.
    #[instrument(skip_all, fields(layers = layers.len(), seed = field.seed()))]
    pub fn run_with_field<S: AsRef<str>>(
        &self,
        layers: &[S],
        field: &NoiseField,
    ) -> Result<Woodified, WoodGrainError> {
        self.config.validate()?;
        info!(
            seed = field.seed(),
            tile_dim = field.tile_dim(),
            "noise field ready"
        );

        let samples = HeightSampler::new(&self.dialect, field, &self.config).sample(layers);
        let mut diagnostics = samples.diagnostics;
        if samples.noise.len() < 2 {
            diagnostics.push(Diagnostic::SparseHeights {
                heights: samples.noise.len(),
            });
        }
        let normalized = normalize(&samples.noise)?;

        let rewritten = StreamRewriter::new(
            &self.dialect,
            &self.config,
            &normalized,
            samples.last_patch,
        )
        .rewrite(layers);
        diagnostics.extend(rewritten.diagnostics);

        for diagnostic in &diagnostics {
            warn!(%diagnostic, "recovered");
        }
        info!(
            heights = normalized.len(),
            injected = rewritten.injected.len(),
            startup = ?rewritten.startup_temperature,
            "wood grain applied"
        );

        Ok(Woodified {
            layers: rewritten.layers,
            graph: rewritten.graph,
            injected: rewritten.injected,
            startup_temperature: rewritten.startup_temperature,
            noise: samples.noise,
            normalized,
            seed: field.seed(),
            diagnostics,
        })
    }
}
