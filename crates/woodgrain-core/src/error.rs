// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fatal errors and recoverable diagnostics.

use std::fmt;

use thiserror::Error;

/// Invalid settings. Raised before the stream is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `max_temp == min_temp`; noise cannot be spread over an empty range.
    #[error("degenerate temperature range: min and max are both {0}C")]
    DegenerateTemperatureRange(f64),
    /// `max_temp < min_temp`.
    #[error("inverted temperature range: min {min}C is above max {max}C")]
    InvertedTemperatureRange {
        /// Configured minimum.
        min: f64,
        /// Configured maximum.
        max: f64,
    },
    /// A setting that must be strictly positive is not.
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Setting name.
        field: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A setting that must be zero or positive is negative.
    #[error("{field} must not be negative, got {value}")]
    Negative {
        /// Setting name.
        field: &'static str,
        /// Offending value.
        value: f64,
    },
    /// NaN or infinite setting.
    #[error("{field} must be finite")]
    NotFinite {
        /// Setting name.
        field: &'static str,
    },
    /// Noise lattice period too small to hash.
    #[error("tile dimension must be at least 2, got {0}")]
    TileDimTooSmall(usize),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failure to rescale the sampled noise.
#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    /// No heights at all; the sampler always seeds height 0, so this signals a bug upstream.
    #[error("no heights were sampled")]
    Empty,
    /// Every sample carries the same value (or the range is not finite).
    #[error("noise samples over {heights} heights span a degenerate range [{min}, {max}]")]
    DegenerateRange {
        /// Distinct heights sampled.
        heights: usize,
        /// Smallest sample.
        min: f64,
        /// Largest sample.
        max: f64,
    },
}

/// Anything that aborts a transform. No output is produced when this is returned.
#[derive(Debug, Error)]
pub enum WoodGrainError {
    /// Bad settings.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Sampled data cannot be normalized.
    #[error("data error: {0}")]
    Normalize(#[from] NormalizeError),
}

/// Numeric field present but unparsable (`Z`, `Z-`, `Z.`…).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed {axis} field: {text:?}")]
pub struct MalformedField {
    /// Axis letter that was looked up.
    pub axis: char,
    /// Raw text following the letter.
    pub text: String,
}

/// Recoverable anomaly; the transform continues.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Fewer than two distinct heights: every height maps to the minimum temperature.
    SparseHeights {
        /// Distinct heights found.
        heights: usize,
    },
    /// A motion line carried an unparsable height; the previous height was kept.
    MalformedField {
        /// Layer index.
        layer: usize,
        /// Line index inside the layer.
        line: usize,
        /// Parse failure.
        field: MalformedField,
    },
    /// A `;woodgrain:begin` marker was never closed; the span ended at the first
    /// line the engine could not have written.
    UnterminatedBlock {
        /// Layer holding the opening marker.
        layer: usize,
        /// Line index of the opening marker.
        line: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SparseHeights { heights } => write!(
                f,
                "only {heights} distinct height(s) found; using the minimum temperature"
            ),
            Self::MalformedField { layer, line, field } => {
                write!(f, "layer {layer}, line {line}: {field}; keeping previous height")
            }
            Self::UnterminatedBlock { layer, line } => write!(
                f,
                "layer {layer}, line {line}: injected block never closed; stripped up to the next foreign command"
            ),
        }
    }
}
