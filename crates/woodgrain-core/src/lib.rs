// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! woodgrain-core: noise-driven temperature scheduling for layered toolpaths.
//!
//! Printing wood-filled filament hotter darkens it. This crate walks a G-code
//! stream twice: the first pass discovers every layer height and samples
//! fractal noise there, the second injects a rate-limited temperature command
//! at each height change, so the finished part shows irregular bands like
//! growth rings. [`WoodGrain`] wires the passes together; the individual
//! components are public for hosts that need finer control.
#![forbid(unsafe_code)]
// Heights are compared exactly, as parsed.
#![allow(clippy::cast_precision_loss, clippy::float_cmp)]

pub mod config;
pub mod dialect;
mod engine;
pub mod error;
pub mod graph;
pub mod height_map;
pub mod noise;
pub mod normalize;
pub mod prng;
pub mod rewrite;
pub mod sampler;
pub mod schedule;
pub mod sentinel;

pub use config::WoodGrainConfig;
pub use dialect::{CommandDialect, GcodeDialect, LineKind};
pub use engine::{WoodGrain, Woodified};
pub use error::{ConfigError, Diagnostic, MalformedField, NormalizeError, WoodGrainError};
pub use graph::{GraphRow, TemperatureGraph};
pub use height_map::{HeightMap, NoiseMap, NormalizedMap};
pub use noise::NoiseField;
pub use normalize::normalize;
pub use rewrite::{Injection, Rewritten, StreamRewriter};
pub use sampler::{HeightSampler, HeightSamples, PatchPoint};
pub use schedule::TemperatureScheduler;
