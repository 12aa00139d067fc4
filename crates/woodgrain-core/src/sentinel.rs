// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Markers on everything the engine injects, so a re-run can strip it.
//!
//! Single injected lines end with [`LINE_TAG`]. Multi-line blocks are wrapped
//! in a `;woodgrain:begin <kind>` / `;woodgrain:end <kind>` pair and removed
//! by span, whatever their length.

/// Trailing annotation on injected single lines.
pub const LINE_TAG: &str = "; woodgrain";

const BEGIN: &str = ";woodgrain:begin";
const END: &str = ";woodgrain:end";
/// Lines written by older releases of the plugin, outside any span.
const LEGACY_GRAPH: &str = ";woodgraph";
const LEGACY_MARK: &str = ";woodified";
const LEGACY_TAG: &str = "; wood grain";

/// Kinds of injected multi-line blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Warm-up block at the start of the stream.
    Startup,
    /// Temperature graph at the end of the stream.
    Graph,
}

impl BlockKind {
    fn name(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Graph => "graph",
        }
    }

    /// Opening marker line.
    pub fn begin(self) -> String {
        format!("{BEGIN} {}", self.name())
    }

    /// Closing marker line.
    pub fn end(self) -> String {
        format!("{END} {}", self.name())
    }
}

/// What a line is, as far as stripping is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// Opens an injected block.
    BlockBegin,
    /// Closes an injected block.
    BlockEnd,
    /// Injected single line, or a legacy marker/graph row.
    Injected,
    /// Not produced by the engine.
    Foreign,
}

/// Appends [`LINE_TAG`] to `command`.
pub fn tag(command: &str) -> String {
    format!("{command} {LINE_TAG}")
}

/// Classifies `line`.
pub fn classify(line: &str) -> Sentinel {
    let trimmed = line.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with(BEGIN) {
        Sentinel::BlockBegin
    } else if lower.starts_with(END) {
        Sentinel::BlockEnd
    } else if lower.ends_with(LINE_TAG)
        || lower.ends_with(LEGACY_TAG)
        || lower.starts_with(LEGACY_GRAPH)
        || lower.starts_with(LEGACY_MARK)
    {
        Sentinel::Injected
    } else {
        Sentinel::Foreign
    }
}
