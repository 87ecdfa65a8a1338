// Harmony membership: which simultaneous pitch sets are allowed.
//
// A sounding chord is reduced to its pitch-class set (octave and doubling
// ignored) and looked up in a table. The table is declared as a list of
// shapes written from 0 (e.g. `[0, 4, 7]` for a major triad) with a weight;
// every shape is expanded to all twelve transpositions when the table is
// built, so a lookup is one map probe.
//
// Generators use `is_allowed` as a hard filter and `weight` as a
// multiplicative bias on candidate pitches. The empty set (everyone resting)
// is always allowed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Set of pitch classes packed into the low 12 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PitchClassSet(u16);

impl PitchClassSet {
    pub fn from_pitches(pitches: &[u8]) -> Self {
        PitchClassSet(pitches.iter().fold(0u16, |bits, &p| bits | 1 << (p % 12)))
    }

    pub fn pitch_classes(&self) -> Vec<u8> {
        (0..12u8).filter(|&pc| self.contains(pc)).collect()
    }

    pub fn contains(&self, pitch_class: u8) -> bool {
        self.0 & (1 << (pitch_class % 12)) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Rotate every member up by `semitones` (mod 12).
    pub fn transpose(&self, semitones: i32) -> Self {
        let shift = semitones.rem_euclid(12) as u32;
        let bits = self.0 as u32;
        let rotated = ((bits << shift) | (bits >> (12 - shift))) & 0xFFF;
        PitchClassSet(rotated as u16)
    }

    /// The set re-expressed with each member in turn as pitch class 0.
    pub fn inversions(&self) -> Vec<PitchClassSet> {
        self.pitch_classes()
            .into_iter()
            .map(|pc| self.transpose(-(pc as i32)))
            .collect()
    }
}

impl fmt::Display for PitchClassSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.pitch_classes())
    }
}

/// Gaps in semitones between successive distinct pitches, low to high.
pub fn intervals_between(pitches: &[u8]) -> Vec<u8> {
    let mut sorted = pitches.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.windows(2).map(|w| w[1] - w[0]).collect()
}

/// One declared chord shape, written from pitch class 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonyShape {
    pub shape: Vec<u8>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// Shapes of the standard table. Chromatic clusters, tritone dyads and the
/// diminished and augmented triads are absent.
const STANDARD_SHAPES: &[&[u8]] = &[
    &[0],
    &[0, 4],
    &[0, 5],
    &[0, 4, 7],
    &[0, 3, 7],
    &[0, 5, 7],
    &[0, 3, 5],
    &[0, 2, 5],
    &[0, 2, 4],
    &[0, 4, 7, 11],
    &[0, 4, 7, 10],
    &[0, 3, 7, 10],
    &[0, 5, 7, 10],
    &[0, 2, 5, 7],
    &[0, 2, 4, 7],
    &[0, 2, 3, 7],
    &[0, 3, 5, 7],
    &[0, 2, 4, 7, 11],
    &[0, 2, 4, 7, 10],
    &[0, 2, 3, 7, 10],
    &[0, 2, 4, 6, 8, 10],
    &[0, 2, 4, 5, 7, 11],
    &[0, 2, 4, 5, 7, 10],
    &[0, 2, 3, 5, 7, 10],
];

/// Lookup table from pitch-class set to weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<HarmonyShape>", into = "Vec<HarmonyShape>")]
pub struct HarmonyTable {
    shapes: Vec<HarmonyShape>,
    lookup: BTreeMap<PitchClassSet, f64>,
}

impl HarmonyTable {
    pub fn empty() -> Self {
        HarmonyTable { shapes: Vec::new(), lookup: BTreeMap::new() }
    }

    pub fn standard() -> Self {
        STANDARD_SHAPES
            .iter()
            .fold(HarmonyTable::empty(), |table, shape| table.with_shape(shape, 1.0))
    }

    /// Add a shape in all twelve transpositions. When two shapes expand to
    /// the same set the larger weight wins.
    pub fn with_shape(mut self, shape: &[u8], weight: f64) -> Self {
        self.insert_shape(shape, weight);
        self.shapes.push(HarmonyShape { shape: shape.to_vec(), weight });
        self
    }

    fn insert_shape(&mut self, shape: &[u8], weight: f64) {
        let base = PitchClassSet::from_pitches(shape);
        if base.is_empty() {
            return;
        }
        for root in 0..12 {
            let entry = self.lookup.entry(base.transpose(root)).or_insert(weight);
            *entry = entry.max(weight);
        }
    }

    /// Number of distinct pitch-class sets in the table.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    pub fn shapes(&self) -> &[HarmonyShape] {
        &self.shapes
    }

    pub fn set_weight(&self, set: PitchClassSet) -> f64 {
        if set.is_empty() {
            return 1.0;
        }
        self.lookup.get(&set).copied().unwrap_or(0.0)
    }

    /// Weight of the set of simultaneous pitches; 0.0 when not allowed.
    pub fn weight(&self, pitches: &[u8]) -> f64 {
        self.set_weight(PitchClassSet::from_pitches(pitches))
    }

    pub fn is_allowed(&self, pitches: &[u8]) -> bool {
        self.weight(pitches) > 0.0
    }
}

impl Default for HarmonyTable {
    fn default() -> Self {
        HarmonyTable::standard()
    }
}

impl From<Vec<HarmonyShape>> for HarmonyTable {
    fn from(shapes: Vec<HarmonyShape>) -> Self {
        shapes
            .into_iter()
            .fold(HarmonyTable::empty(), |table, s| table.with_shape(&s.shape, s.weight))
    }
}

impl From<HarmonyTable> for Vec<HarmonyShape> {
    fn from(table: HarmonyTable) -> Self {
        table.shapes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_class_set_ignores_octaves_and_doubling() {
        let a = PitchClassSet::from_pitches(&[60, 64, 67, 72]);
        let b = PitchClassSet::from_pitches(&[43, 52, 84]);
        assert_eq!(a, b);
        assert_eq!(a.pitch_classes(), vec![0, 4, 7]);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_transpose_wraps_around() {
        let b_major = PitchClassSet::from_pitches(&[11, 3, 6]);
        assert_eq!(b_major.transpose(1), PitchClassSet::from_pitches(&[0, 4, 7]));
        assert_eq!(b_major.transpose(-11), b_major.transpose(1));
        assert_eq!(b_major.transpose(12), b_major);
    }

    #[test]
    fn test_inversions_of_major_triad() {
        let c = PitchClassSet::from_pitches(&[0, 4, 7]);
        let shapes: Vec<Vec<u8>> = c.inversions().iter().map(|s| s.pitch_classes()).collect();
        assert_eq!(shapes, vec![vec![0, 4, 7], vec![0, 3, 8], vec![0, 5, 9]]);
    }

    #[test]
    fn test_intervals_between_sorted_distinct() {
        assert_eq!(intervals_between(&[74, 72, 73, 72]), vec![1, 1]);
        assert!(intervals_between(&[60]).is_empty());
    }

    #[test]
    fn test_standard_table_accepts_triads_in_every_key() {
        let table = HarmonyTable::standard();
        for root in 0..12u8 {
            assert!(table.is_allowed(&[60 + root, 64 + root, 67 + root]));
            assert!(table.is_allowed(&[60 + root, 63 + root, 67 + root]));
        }
    }

    #[test]
    fn test_standard_table_rejects_clusters_and_tritones() {
        let table = HarmonyTable::standard();
        assert!(!table.is_allowed(&[72, 73, 74]));
        assert!(!table.is_allowed(&[60, 66]));
        assert!(!table.is_allowed(&[60, 64, 68])); // augmented
        assert!(!table.is_allowed(&[60, 63, 66])); // diminished
        assert_eq!(table.weight(&[60, 61]), 0.0);
    }

    #[test]
    fn test_inverted_shapes_are_covered_by_transposition() {
        // A 6/3 chord has the same pitch classes as its root position.
        let table = HarmonyTable::standard();
        assert!(table.is_allowed(&[64, 67, 72]));
        // Fourths come from the (0 5) shape.
        assert!(table.is_allowed(&[62, 67]));
    }

    #[test]
    fn test_silence_and_unison_are_allowed() {
        let table = HarmonyTable::standard();
        assert!(table.is_allowed(&[]));
        assert!(table.is_allowed(&[60, 72]));
        assert!(HarmonyTable::empty().is_allowed(&[]));
        assert!(!HarmonyTable::empty().is_allowed(&[60]));
    }

    #[test]
    fn test_table_size() {
        // 24 shapes x 12 roots, less the whole-tone hexachord's symmetry (2 sets)
        // and 0 5 7 10, which is a rotation of 0 2 5 7.
        let table = HarmonyTable::standard();
        assert_eq!(table.len(), 22 * 12 + 2);
    }

    #[test]
    fn test_heavier_shape_wins() {
        let table = HarmonyTable::empty().with_shape(&[0, 4, 7], 0.5).with_shape(&[0, 4, 7], 2.0);
        assert_eq!(table.weight(&[62, 66, 69]), 2.0);
    }

    #[test]
    fn test_table_roundtrips_through_json() {
        let table = HarmonyTable::empty().with_shape(&[0, 7], 1.5).with_shape(&[0, 4, 7], 1.0);
        let json = serde_json::to_string(&table).unwrap();
        let back: HarmonyTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
        let parsed: HarmonyTable = serde_json::from_str(r#"[{"shape": [0, 5]}]"#).unwrap();
        assert_eq!(parsed.weight(&[60, 65]), 1.0);
        assert!(!parsed.is_allowed(&[60, 64]));
    }
}
