// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command vocabulary: how lines are classified and fields extracted.
//!
//! The engine never parses G-code beyond this seam. [`CommandDialect`] answers
//! two questions about a line (what kind is it, what value does an axis
//! carry) and renders the few commands the engine emits. [`GcodeDialect`] is
//! the substring-matching default; tokens are plain strings so another
//! firmware's spelling is a settings change, not a code change.

use serde::{Deserialize, Serialize};

use crate::error::MalformedField;

/// Classification of one stream line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Switches to absolute positioning.
    AbsolutePositioning,
    /// Switches to relative positioning.
    RelativePositioning,
    /// Move that may carry a vertical-axis value.
    Motion,
    /// Sets the hotend temperature.
    SetTemperature,
    /// Anything else (comments, blank lines, other commands).
    Other,
}

/// Tokenizer capability the two passes are written against.
pub trait CommandDialect {
    /// Classifies `line`.
    fn line_kind(&self, line: &str) -> LineKind;

    /// Numeric value following `axis` in the command part of `line`.
    ///
    /// `Ok(None)` when the axis is absent, `Err` when it is present but not a
    /// number.
    fn extract_field(&self, line: &str, axis: char) -> Result<Option<f64>, MalformedField>;

    /// Axis letter carrying the layer height.
    fn vertical_axis(&self) -> char {
        'Z'
    }

    /// Command setting the temperature to `celsius` without waiting.
    fn temperature_command(&self, celsius: i64) -> String;

    /// Blocking warm-up sequence placed at the start of the stream.
    fn startup_commands(&self, celsius: i64) -> Vec<String>;

    /// Whether `line` could belong to a block the engine emitted: a comment,
    /// or one of the [`startup_commands`](Self::startup_commands) at any
    /// temperature. Anything else inside an unclosed block ends it.
    ///
    /// The default only recognizes temperature-set commands.
    fn is_block_residue(&self, line: &str) -> bool {
        self.line_kind(line) == LineKind::SetTemperature
    }

    /// Whether the startup block belongs right after `line` instead of at the
    /// top of the first layer.
    fn is_startup_anchor(&self, _line: &str) -> bool {
        false
    }
}

/// Substring-matched G-code vocabulary (RepRap/Marlin spellings by default).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GcodeDialect {
    /// Absolute positioning command.
    pub absolute: String,
    /// Relative positioning command.
    pub relative: String,
    /// `G` numbers that move the head.
    pub motion_codes: Vec<u32>,
    /// Vertical axis letter.
    pub vertical_axis: char,
    /// Temperature-set command (value passed as `S`).
    pub set_temperature: String,
    /// Enables waiting for the temperature on the next change.
    pub wait_enable: String,
    /// Disables waiting on subsequent changes.
    pub wait_disable: String,
    /// Blocks until the target temperature is reached.
    pub wait_reached: String,
    /// Line fragment after which the startup block is placed (case-insensitive).
    pub startup_anchor: Option<String>,
}

impl Default for GcodeDialect {
    fn default() -> Self {
        Self {
            absolute: "G90".into(),
            relative: "G91".into(),
            motion_codes: vec![0, 1],
            vertical_axis: 'Z',
            set_temperature: "M104".into(),
            wait_enable: "M230 S0".into(),
            wait_disable: "M230 S1".into(),
            wait_reached: "M116".into(),
            startup_anchor: Some("; set extruder ".into()),
        }
    }
}

/// Part of `line` before any `;` comment.
pub fn command_part(line: &str) -> &str {
    line.split_once(';').map_or(line, |(code, _)| code)
}

fn contains_token(haystack_upper: &str, token: &str) -> bool {
    !token.is_empty() && haystack_upper.contains(&token.to_ascii_uppercase())
}

impl GcodeDialect {
    fn is_motion(&self, line: &str) -> bool {
        match self.extract_field(line, 'G') {
            Ok(Some(g)) if g.fract() == 0.0 && g >= 0.0 => self
                .motion_codes
                .iter()
                .any(|&code| f64::from(code) == g),
            _ => false,
        }
    }
}

impl CommandDialect for GcodeDialect {
    fn line_kind(&self, line: &str) -> LineKind {
        let code = command_part(line).to_ascii_uppercase();
        if contains_token(&code, &self.set_temperature) {
            LineKind::SetTemperature
        } else if contains_token(&code, &self.absolute) {
            LineKind::AbsolutePositioning
        } else if contains_token(&code, &self.relative) {
            LineKind::RelativePositioning
        } else if self.is_motion(line) {
            LineKind::Motion
        } else {
            LineKind::Other
        }
    }

    fn extract_field(&self, line: &str, axis: char) -> Result<Option<f64>, MalformedField> {
        let code = command_part(line);
        let Some(pos) = code.find(|c: char| c.eq_ignore_ascii_case(&axis)) else {
            return Ok(None);
        };
        let rest = &code[pos + axis.len_utf8()..];

        let mut end = 0;
        let mut seen_dot = false;
        for (i, c) in rest.char_indices() {
            let accept = match c {
                '+' | '-' => i == 0,
                '.' if !seen_dot => {
                    seen_dot = true;
                    true
                }
                _ => c.is_ascii_digit(),
            };
            if !accept {
                break;
            }
            end = i + c.len_utf8();
        }

        let text = &rest[..end];
        text.parse::<f64>().map(Some).map_err(|_| MalformedField {
            axis,
            text: rest.split_whitespace().next().unwrap_or_default().to_owned(),
        })
    }

    fn vertical_axis(&self) -> char {
        self.vertical_axis
    }

    fn temperature_command(&self, celsius: i64) -> String {
        format!("{} S{celsius}", self.set_temperature)
    }

    fn startup_commands(&self, celsius: i64) -> Vec<String> {
        vec![
            self.wait_enable.clone(),
            self.temperature_command(celsius),
            self.wait_disable.clone(),
            self.wait_reached.clone(),
        ]
    }

    fn is_block_residue(&self, line: &str) -> bool {
        let code = command_part(line).trim();
        code.is_empty()
            || self.line_kind(line) == LineKind::SetTemperature
            || [&self.wait_enable, &self.wait_disable, &self.wait_reached]
                .iter()
                .any(|token| code.eq_ignore_ascii_case(token.trim()))
    }

    fn is_startup_anchor(&self, line: &str) -> bool {
        self.startup_anchor.as_deref().is_some_and(|anchor| {
            !anchor.is_empty() && line.to_lowercase().contains(&anchor.to_lowercase())
        })
    }
}
