// The note event: what sounds (nothing, one pitch, or a chord) and for how
// long.
//
// Durations are exact rationals measured in beats, where one beat is a
// quarter note. Sketches mix sixteenth grids with triplet eighths, and
// `1/3 + 1/3 + 1/3` has to land back on the beat for barline splitting and
// for `Part::note_at` lookups, so floats are not used here.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::slice;

/// Duration or offset in quarter-note beats.
pub type Beats = Rational64;

/// Finest subdivision `beats_from_f64` snaps to: LCM of sixteenths and
/// triplet sixteenths.
const SNAP_DENOMINATOR: i64 = 48;

/// Exact `numer / denom` beats.
pub fn beats(numer: i64, denom: i64) -> Beats {
    Beats::new(numer, denom)
}

/// Whole number of beats.
pub fn whole_beats(n: i64) -> Beats {
    Beats::from_integer(n)
}

/// Convert a float beat count to the nearest 1/48 beat.
pub fn beats_from_f64(value: f64) -> Beats {
    Beats::new((value * SNAP_DENOMINATOR as f64).round() as i64, SNAP_DENOMINATOR)
}

/// Approximate float value, for display and seconds arithmetic.
pub fn beats_to_f64(value: Beats) -> f64 {
    *value.numer() as f64 / *value.denom() as f64
}

/// What a note event sounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sound {
    Rest,
    Pitch(u8),
    /// Sorted, deduplicated; always at least two pitches.
    Chord(Vec<u8>),
}

impl Sound {
    /// Normalize a list of pitches: none is a rest, one is a single pitch.
    pub fn from_pitches(pitches: &[u8]) -> Sound {
        let mut sorted = pitches.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        match sorted.len() {
            0 => Sound::Rest,
            1 => Sound::Pitch(sorted[0]),
            _ => Sound::Chord(sorted),
        }
    }

    pub fn pitches(&self) -> &[u8] {
        match self {
            Sound::Rest => &[],
            Sound::Pitch(p) => slice::from_ref(p),
            Sound::Chord(ps) => ps,
        }
    }
}

impl From<Option<u8>> for Sound {
    fn from(pitch: Option<u8>) -> Self {
        pitch.map_or(Sound::Rest, Sound::Pitch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub sound: Sound,
    pub duration: Beats,
}

impl Note {
    pub fn new(sound: Sound, duration: Beats) -> Self {
        Note { sound, duration }
    }

    pub fn pitch(pitch: u8, duration: Beats) -> Self {
        Note::new(Sound::Pitch(pitch), duration)
    }

    pub fn rest(duration: Beats) -> Self {
        Note::new(Sound::Rest, duration)
    }

    pub fn chord(pitches: &[u8], duration: Beats) -> Self {
        Note::new(Sound::from_pitches(pitches), duration)
    }

    pub fn is_rest(&self) -> bool {
        matches!(self.sound, Sound::Rest)
    }

    pub fn pitches(&self) -> &[u8] {
        self.sound.pitches()
    }

    /// Highest sounding pitch; the melody note of a chord.
    pub fn top_pitch(&self) -> Option<u8> {
        self.pitches().last().copied()
    }
}

/// A note with its start offset inside a part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedNote<'a> {
    pub start: Beats,
    pub note: &'a Note,
}

impl TimedNote<'_> {
    pub fn end(&self) -> Beats {
        self.start + self.note.duration
    }

    /// Half-open span test: `[start, end)`.
    pub fn covers(&self, beat: Beats) -> bool {
        self.start <= beat && beat < self.end()
    }
}

/// Pitch class names, flats for black keys.
const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

pub fn pitch_class_name(pitch: u8) -> &'static str {
    PITCH_CLASS_NAMES[(pitch % 12) as usize]
}

/// Scientific pitch name, middle C (60) = "C4".
pub fn pitch_name(pitch: u8) -> String {
    let octave = (pitch / 12) as i32 - 1;
    format!("{}{}", pitch_class_name(pitch), octave)
}
