// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Temperature-vs-height graph appended to the end of the stream.

use crate::config::WoodGrainConfig;

const PREFIX: &str = ";WoodGraph:";
const BAR_WIDTH: usize = 20;
const BAR_MARK: char = '#';
const BAR_FILL: char = '.';

/// One applied temperature change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphRow {
    /// Height of the transition (mm).
    pub z: f64,
    /// Temperature applied from that height on (°C).
    pub temperature: f64,
}

/// Ordered rows, one per height transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemperatureGraph {
    rows: Vec<GraphRow>,
}

/// Temperature as emitted in commands: rounded to the nearest degree, so an
/// emitted step can exceed the scheduled one by up to a degree.
#[allow(clippy::cast_possible_truncation)]
pub fn whole_degrees(temp: f64) -> i64 {
    temp.round() as i64
}

impl TemperatureGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row.
    pub fn push(&mut self, z: f64, temperature: f64) {
        self.rows.push(GraphRow { z, temperature });
    }

    /// Rows in stream order.
    pub fn rows(&self) -> &[GraphRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no transition was recorded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Comment line summarizing the settings the graph was produced with.
    pub fn header(config: &WoodGrainConfig) -> String {
        let mut header = format!(
            "{PREFIX} Wood temperature graph (from {}C to {}C, grain size {}mm, z-offset {}mm)",
            config.min_temp, config.max_temp, config.grain_size, config.z_offset
        );
        if config.max_upward > 0.0 {
            header.push_str(&format!(
                ", temperature increases capped at {}C",
                config.max_upward
            ));
        }
        header.push(':');
        header
    }

    /// Renders one row: height to the micron, whole degrees, and a
    /// 20-column bar proportional to the temperature's place in the range.
    pub fn render_row(row: &GraphRow, config: &WoodGrainConfig) -> String {
        let marks = bar_marks(row.temperature, config.min_temp, config.max_temp);
        let mut bar = String::with_capacity(BAR_WIDTH);
        bar.extend(std::iter::repeat_n(BAR_MARK, marks));
        bar.extend(std::iter::repeat_n(BAR_FILL, BAR_WIDTH - marks));
        format!(
            "{PREFIX} Z {:.3} @{:>3}C | {bar}",
            row.z,
            whole_degrees(row.temperature)
        )
    }

    /// Header followed by every row.
    pub fn render(&self, config: &WoodGrainConfig) -> Vec<String> {
        std::iter::once(Self::header(config))
            .chain(self.rows.iter().map(|row| Self::render_row(row, config)))
            .collect()
    }
}

/// `round(19 * (temp - min) / (max - min))`, clamped to the bar.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar_marks(temp: f64, min: f64, max: f64) -> usize {
    let span = max - min;
    if span <= 0.0 {
        return 0;
    }
    let marks = (19.0 * (temp - min) / span).round();
    marks.clamp(0.0, 19.0) as usize
}
