// Scales as pitch-class filters.
//
// The sketches do not think in keys; they filter a candidate pitch list down
// to the members of a scale. A scale is a kind (its interval pattern) plus a
// root pitch class. `scale_plan` produces the drifting sequence of scales
// the random walk moves through, one per section.

use crate::instrument::PitchRange;
use chamber_prng::SketchRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    /// 0 2 4 5 7 9 11
    Major,
    /// 0 2 4 7 9
    MajorPentatonic,
    /// Every pitch class; disables scale filtering.
    Chromatic,
}

impl ScaleKind {
    /// Semitones above the root.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleKind::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleKind::MajorPentatonic => &[0, 2, 4, 7, 9],
            ScaleKind::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    pub kind: ScaleKind,
    /// Pitch class of the root, 0 = C.
    pub root: u8,
}

impl Scale {
    pub fn new(kind: ScaleKind, root: u8) -> Self {
        Scale { kind, root: root % 12 }
    }

    pub fn major(root: u8) -> Self {
        Scale::new(ScaleKind::Major, root)
    }

    pub fn major_pentatonic(root: u8) -> Self {
        Scale::new(ScaleKind::MajorPentatonic, root)
    }

    /// Membership table indexed by absolute pitch class.
    pub fn pitch_classes(&self) -> [bool; 12] {
        let mut pcs = [false; 12];
        for &iv in self.kind.intervals() {
            pcs[((self.root + iv) % 12) as usize] = true;
        }
        pcs
    }

    pub fn contains(&self, pitch: u8) -> bool {
        self.pitch_classes()[(pitch % 12) as usize]
    }

    pub fn pitches_in(&self, range: PitchRange) -> Vec<u8> {
        let pcs = self.pitch_classes();
        range.iter().filter(|&p| pcs[(p % 12) as usize]).collect()
    }

    pub fn transposed(&self, semitones: i32) -> Scale {
        Scale::new(self.kind, (self.root as i32 + semitones).rem_euclid(12) as u8)
    }

    /// Nearest member of the scale, preferring the lower neighbour on ties.
    pub fn snap(&self, pitch: u8) -> u8 {
        if self.contains(pitch) {
            return pitch;
        }
        for offset in 1u8..=6 {
            if pitch >= offset && self.contains(pitch - offset) {
                return pitch - offset;
            }
            if pitch <= 127 - offset && self.contains(pitch + offset) {
                return pitch + offset;
            }
        }
        pitch
    }
}

/// A sequence of `count` scales whose roots wander by a random choice of
/// `root_changes` semitones each section, starting from a random root.
///
/// An empty `root_changes` keeps the root fixed.
pub fn scale_plan(
    rng: &mut SketchRng,
    kind: ScaleKind,
    count: usize,
    root_changes: &[i32],
) -> Vec<Scale> {
    let mut scale = Scale::new(kind, rng.range_usize(0, 12) as u8);
    (0..count)
        .map(|_| {
            let change = rng.choose(root_changes).copied().unwrap_or(0);
            scale = scale.transposed(change);
            scale
        })
        .collect()
}
