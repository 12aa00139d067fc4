// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Insertion-ordered maps keyed by exact Z height.
//!
//! Heights are compared by the bit pattern of the parsed value (with `-0.0`
//! folded into `0.0`), so `Z0.2` read in pass 1 hits the same key when it is
//! read again in pass 2. No tolerance is applied.

use rustc_hash::FxHashMap;

/// Insertion-ordered `height -> value` map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeightMap {
    entries: Vec<(f64, f64)>,
    index: FxHashMap<u64, usize>,
}

fn key(z: f64) -> u64 {
    if z == 0.0 {
        0.0f64.to_bits()
    } else {
        z.to_bits()
    }
}

impl HeightMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored for `z`, computing and inserting it first if
    /// the height has not been seen yet. Existing values are never recomputed.
    pub fn get_or_insert_with(&mut self, z: f64, compute: impl FnOnce() -> f64) -> f64 {
        if let Some(&slot) = self.index.get(&key(z)) {
            return self.entries[slot].1;
        }
        let value = compute();
        self.index.insert(key(z), self.entries.len());
        self.entries.push((z, value));
        value
    }

    /// Value stored for `z`.
    pub fn get(&self, z: f64) -> Option<f64> {
        self.index.get(&key(z)).map(|&slot| self.entries[slot].1)
    }

    /// Whether `z` has been recorded.
    pub fn contains(&self, z: f64) -> bool {
        self.index.contains_key(&key(z))
    }

    /// Number of distinct heights.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no height has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Heights in discovery order.
    pub fn heights(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|&(z, _)| z)
    }

    /// Values in discovery order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|&(_, v)| v)
    }

    /// New map with the same keys (same order) and every value passed through `f`.
    pub fn map_values(&self, mut f: impl FnMut(f64) -> f64) -> Self {
        Self {
            entries: self.entries.iter().map(|&(z, v)| (z, f(v))).collect(),
            index: self.index.clone(),
        }
    }
}

/// Raw wood-noise sample per discovered height (pass 1 output).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoiseMap(pub(crate) HeightMap);

impl NoiseMap {
    /// Underlying ordered map.
    pub fn as_map(&self) -> &HeightMap {
        &self.0
    }

    /// Sample stored for `z`.
    pub fn get(&self, z: f64) -> Option<f64> {
        self.0.get(z)
    }

    /// Number of distinct heights.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Min–max rescaled noise per height, in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedMap(pub(crate) HeightMap);

impl NormalizedMap {
    /// Underlying ordered map.
    pub fn as_map(&self) -> &HeightMap {
        &self.0
    }

    /// Normalized value for `z`.
    pub fn get(&self, z: f64) -> Option<f64> {
        self.0.get(z)
    }

    /// Number of distinct heights.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_discovery_order() {
        let mut map = HeightMap::new();
        for z in [0.0, 0.6, 0.2, 0.4] {
            map.get_or_insert_with(z, || z * 10.0);
        }
        assert_eq!(map.heights().collect::<Vec<_>>(), vec![0.0, 0.6, 0.2, 0.4]);
    }

    #[test]
    fn never_recomputes_existing_heights() {
        let mut map = HeightMap::new();
        assert_eq!(map.get_or_insert_with(0.3, || 1.0), 1.0);
        assert_eq!(map.get_or_insert_with(0.3, || 2.0), 1.0);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn negative_zero_folds_into_zero() {
        let mut map = HeightMap::new();
        map.get_or_insert_with(-0.0, || 5.0);
        assert!(map.contains(0.0));
        assert_eq!(map.get(0.0), Some(5.0));
    }

    #[test]
    fn map_values_preserves_key_set() {
        let mut map = HeightMap::new();
        map.get_or_insert_with(1.0, || 1.0);
        map.get_or_insert_with(2.0, || 3.0);
        let doubled = map.map_values(|v| v * 2.0);
        assert_eq!(doubled.heights().collect::<Vec<_>>(), vec![1.0, 2.0]);
        assert_eq!(doubled.get(2.0), Some(6.0));
    }
}
