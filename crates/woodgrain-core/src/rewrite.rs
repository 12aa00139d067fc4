// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pass 2: rewrite the stream with scheduled temperature commands.
//!
//! Line handling, in order:
//! 1. anything the engine injected on an earlier run (tagged lines, whole
//!    `;woodgrain:begin`/`end` spans, legacy graph rows) is dropped; a span
//!    missing its end marker stops at the first line the engine could not
//!    have written;
//! 2. after the last patch point every other line passes through untouched;
//! 3. foreign temperature-set commands are dropped (the schedule replaces them);
//! 4. a motion line reaching a new sampled height gets a tagged
//!    temperature-set command right after it.
//!
//! The startup block opens the first layer and the graph closes the last one.

use tracing::{debug, instrument};

use crate::config::WoodGrainConfig;
use crate::dialect::{CommandDialect, LineKind};
use crate::error::Diagnostic;
use crate::graph::{whole_degrees, TemperatureGraph};
use crate::height_map::NormalizedMap;
use crate::sampler::PatchPoint;
use crate::schedule::TemperatureScheduler;
use crate::sentinel::{self, BlockKind, Sentinel};

/// A temperature command written into the stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Injection {
    /// Layer receiving the command.
    pub layer: usize,
    /// Height that triggered it.
    pub z: f64,
    /// Commanded temperature (°C).
    pub temperature: i64,
}

/// Output of pass 2.
#[derive(Debug, Clone, Default)]
pub struct Rewritten {
    /// Rewritten layers, same count and order as the input.
    pub layers: Vec<String>,
    /// Temperature applied at each transition.
    pub graph: TemperatureGraph,
    /// Commands injected after motion lines, in stream order.
    pub injected: Vec<Injection>,
    /// Temperature commanded by the startup block (`None` for an empty stream).
    pub startup_temperature: Option<i64>,
    /// Recovered anomalies.
    pub diagnostics: Vec<Diagnostic>,
}

/// Second-pass rewriter over heights discovered by
/// [`HeightSampler`](crate::sampler::HeightSampler).
pub struct StreamRewriter<'a, D> {
    dialect: &'a D,
    config: &'a WoodGrainConfig,
    normalized: &'a NormalizedMap,
    last_patch: Option<PatchPoint>,
}

impl<'a, D: CommandDialect> StreamRewriter<'a, D> {
    /// Rewriter injecting temperatures for the heights in `normalized`, up to
    /// and including the `last_patch` line.
    pub fn new(
        dialect: &'a D,
        config: &'a WoodGrainConfig,
        normalized: &'a NormalizedMap,
        last_patch: Option<PatchPoint>,
    ) -> Self {
        Self {
            dialect,
            config,
            normalized,
            last_patch,
        }
    }

    /// Runs pass 2 over `layers`.
    #[instrument(skip_all, fields(layers = layers.len()))]
    pub fn rewrite<S: AsRef<str>>(&self, layers: &[S]) -> Rewritten {
        if layers.is_empty() {
            return Rewritten::default();
        }

        let mut pass = Pass::new(self);
        let startup = pass.startup_block();
        let last_ix = layers.len() - 1;

        let mut out_layers = Vec::with_capacity(layers.len());
        for (layer_ix, layer) in layers.iter().enumerate() {
            let text = layer.as_ref();
            let (lines, trailing_newline) = split_layer(text);
            let mut out = LayerOut::new(lines.len());

            let mut startup_pending = layer_ix == 0;
            if startup_pending && !lines.iter().any(|l| self.dialect.is_startup_anchor(l)) {
                out.inject_all(startup.iter().cloned());
                startup_pending = false;
            }

            for (line_ix, line) in lines.iter().enumerate() {
                let kept = pass.visit(layer_ix, line_ix, line, &mut out);
                if startup_pending && kept && self.dialect.is_startup_anchor(line) {
                    out.inject_all(startup.iter().cloned());
                    startup_pending = false;
                }
            }
            if startup_pending {
                // The anchor only appeared inside a stripped block.
                out.prepend(startup.iter().cloned());
            }

            if layer_ix == last_ix {
                if let Some((layer, line)) = pass.open_block.take() {
                    pass.diagnostics
                        .push(Diagnostic::UnterminatedBlock { layer, line });
                }
                out.inject(BlockKind::Graph.begin());
                out.inject_all(pass.graph.render(self.config));
                out.inject(BlockKind::Graph.end());
            }

            out_layers.push(out.finish(trailing_newline));
        }

        debug!(
            injected = pass.injected.len(),
            rows = pass.graph.len(),
            "rewrite complete"
        );
        Rewritten {
            layers: out_layers,
            graph: pass.graph,
            injected: pass.injected,
            startup_temperature: Some(pass.startup_temperature),
            diagnostics: pass.diagnostics,
        }
    }
}

/// Splits a layer into lines, reporting whether it ended with a newline.
fn split_layer(text: &str) -> (Vec<&str>, bool) {
    if text.is_empty() {
        return (Vec::new(), false);
    }
    let trailing_newline = text.ends_with('\n');
    let body = if trailing_newline {
        &text[..text.len() - 1]
    } else {
        text
    };
    (body.split('\n').collect(), trailing_newline)
}

/// Output lines of one layer.
struct LayerOut {
    lines: Vec<String>,
    ends_with_injection: bool,
}

impl LayerOut {
    fn new(capacity: usize) -> Self {
        Self {
            lines: Vec::with_capacity(capacity),
            ends_with_injection: false,
        }
    }

    fn keep(&mut self, line: &str) {
        self.lines.push(line.to_owned());
        self.ends_with_injection = false;
    }

    fn inject(&mut self, line: String) {
        self.lines.push(line);
        self.ends_with_injection = true;
    }

    fn inject_all(&mut self, lines: impl IntoIterator<Item = String>) {
        for line in lines {
            self.inject(line);
        }
    }

    fn prepend(&mut self, lines: impl IntoIterator<Item = String>) {
        let was_empty = self.lines.is_empty();
        self.lines.splice(0..0, lines);
        if was_empty {
            self.ends_with_injection = !self.lines.is_empty();
        }
    }

    /// Injected lines are always newline-terminated so the next layer starts
    /// on its own line.
    fn finish(self, trailing_newline: bool) -> String {
        let mut text = self.lines.join("\n");
        if !self.lines.is_empty() && (trailing_newline || self.ends_with_injection) {
            text.push('\n');
        }
        text
    }
}

/// Mutable state of one rewrite pass.
struct Pass<'r, 'a, D> {
    rewriter: &'r StreamRewriter<'a, D>,
    scheduler: TemperatureScheduler,
    startup_temperature: i64,
    startup_hold: f64,
    graph: TemperatureGraph,
    injected: Vec<Injection>,
    diagnostics: Vec<Diagnostic>,
    absolute: bool,
    former_z: Option<f64>,
    frozen: bool,
    open_block: Option<(usize, usize)>,
}

impl<'r, 'a, D: CommandDialect> Pass<'r, 'a, D> {
    fn new(rewriter: &'r StreamRewriter<'a, D>) -> Self {
        let config = rewriter.config;
        let mut scheduler = TemperatureScheduler::from_config(config);
        let startup_hold = if config.has_first_temp() {
            scheduler.hold(config.first_temp)
        } else {
            scheduler.schedule(rewriter.normalized.get(0.0).unwrap_or(0.0))
        };
        Self {
            rewriter,
            scheduler,
            startup_temperature: whole_degrees(startup_hold),
            startup_hold,
            graph: TemperatureGraph::new(),
            injected: Vec::new(),
            diagnostics: Vec::new(),
            absolute: true,
            former_z: None,
            frozen: false,
            open_block: None,
        }
    }

    fn startup_block(&self) -> Vec<String> {
        let mut block = vec![BlockKind::Startup.begin()];
        block.extend(
            self.rewriter
                .dialect
                .startup_commands(self.startup_temperature),
        );
        block.push(BlockKind::Startup.end());
        block
    }

    /// Temperature already established by the startup block at height `z`.
    fn startup_covers(&self, z: f64) -> Option<f64> {
        let config = self.rewriter.config;
        if config.has_first_temp() && z <= config.first_temp_hold {
            Some(config.first_temp)
        } else if z == 0.0 {
            Some(self.startup_hold)
        } else {
            None
        }
    }

    /// Handles one input line. Returns whether it was kept in the output.
    fn visit(&mut self, layer: usize, line_ix: usize, line: &str, out: &mut LayerOut) -> bool {
        match sentinel::classify(line) {
            Sentinel::BlockBegin => {
                if self.open_block.is_none() {
                    self.open_block = Some((layer, line_ix));
                }
                return false;
            }
            Sentinel::BlockEnd => {
                self.open_block = None;
                return false;
            }
            Sentinel::Injected => return false,
            Sentinel::Foreign => {
                if let Some((begin_layer, begin_line)) = self.open_block {
                    if self.rewriter.dialect.is_block_residue(line) {
                        return false;
                    }
                    debug!(layer, line = line_ix, "unclosed block ended by foreign command");
                    self.open_block = None;
                    self.diagnostics.push(Diagnostic::UnterminatedBlock {
                        layer: begin_layer,
                        line: begin_line,
                    });
                }
            }
        }

        if self.frozen {
            out.keep(line);
            return true;
        }

        let dialect = self.rewriter.dialect;
        let kind = dialect.line_kind(line);
        match kind {
            LineKind::AbsolutePositioning => self.absolute = true,
            LineKind::RelativePositioning => self.absolute = false,
            LineKind::SetTemperature => return false,
            LineKind::Motion | LineKind::Other => {}
        }

        out.keep(line);
        if kind == LineKind::Motion && self.absolute {
            if let Ok(Some(z)) = dialect.extract_field(line, dialect.vertical_axis()) {
                if z.is_finite() {
                    self.transition(layer, z, out);
                }
            }
        }

        if self
            .rewriter
            .last_patch
            .is_some_and(|p| p.layer == layer && p.line == line_ix)
        {
            debug!(layer, line = line_ix, "last patch point reached");
            self.frozen = true;
        }
        true
    }

    fn transition(&mut self, layer: usize, z: f64, out: &mut LayerOut) {
        if self.former_z == Some(z) {
            return;
        }
        let Some(noise) = self.rewriter.normalized.get(z) else {
            return;
        };
        self.former_z = Some(z);

        let temp = if let Some(held) = self.startup_covers(z) {
            self.scheduler.hold(held)
        } else {
            let temp = self.scheduler.schedule(noise);
            let temperature = whole_degrees(temp);
            out.inject(sentinel::tag(
                &self.rewriter.dialect.temperature_command(temperature),
            ));
            self.injected.push(Injection {
                layer,
                z,
                temperature,
            });
            temp
        };
        debug!(layer, z, temp, "height transition");
        self.graph.push(z, temp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_layer_tracks_trailing_newline() {
        assert_eq!(split_layer(""), (Vec::<&str>::new(), false));
        assert_eq!(split_layer("a\nb\n"), (vec!["a", "b"], true));
        assert_eq!(split_layer("a\nb"), (vec!["a", "b"], false));
        assert_eq!(split_layer("\n"), (vec![""], true));
    }

    #[test]
    fn layer_out_terminates_injected_tails() {
        let mut out = LayerOut::new(2);
        out.keep("G1 Z0.2");
        out.inject("M104 S200 ; woodgrain".into());
        assert_eq!(out.finish(false), "G1 Z0.2\nM104 S200 ; woodgrain\n");

        let mut out = LayerOut::new(1);
        out.keep("G1 X1");
        assert_eq!(out.finish(false), "G1 X1");

        assert_eq!(LayerOut::new(0).finish(true), "");
    }
}
