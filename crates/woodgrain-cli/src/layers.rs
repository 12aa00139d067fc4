// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Layer partitioning of a whole G-code file.

/// Splits `text` before every line starting with `marker`.
///
/// Text ahead of the first marker is layer 0, even when empty. The layers
/// concatenate back to `text` exactly. An empty marker yields a single layer.
pub fn split_layers<'a>(text: &'a str, marker: &str) -> Vec<&'a str> {
    let mut layers = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if !marker.is_empty() && line.starts_with(marker) {
            layers.push(&text[start..offset]);
            start = offset;
        }
        offset += line.len();
    }
    layers.push(&text[start..]);
    layers
}
