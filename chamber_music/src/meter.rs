// Meter arithmetic: where a beat offset falls in the bar.
//
// A beat is always a quarter note. Scores without an explicit time signature
// are treated as 4/4, which is also what the renderers print. Time
// signatures parse from and serialize to the usual "12/8" text form so they
// read naturally in config files.

use crate::error::MusicError;
use crate::note::{Beats, beats_to_f64};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature { numerator: 4, denominator: 4 };

    /// Length of one bar in quarter-note beats (6/8 is 3 beats).
    pub fn bar_beats(&self) -> Beats {
        Beats::new(self.numerator as i64 * 4, self.denominator as i64)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature::COMMON
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for TimeSignature {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MusicError::InvalidTimeSignature(s.to_string());
        let (num, den) = s.trim().split_once('/').ok_or_else(invalid)?;
        let numerator: u8 = num.trim().parse().map_err(|_| invalid())?;
        let denominator: u8 = den.trim().parse().map_err(|_| invalid())?;
        if numerator == 0 || !denominator.is_power_of_two() || denominator > 64 {
            return Err(invalid());
        }
        Ok(TimeSignature { numerator, denominator })
    }
}

impl TryFrom<String> for TimeSignature {
    type Error = MusicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSignature> for String {
    fn from(ts: TimeSignature) -> Self {
        ts.to_string()
    }
}

/// Position of a beat offset within the metric grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterPosition {
    /// Zero-based bar number.
    pub bar: i64,
    /// Zero-based whole beat inside the bar.
    pub beat_in_bar: i64,
    /// What is left over inside the beat, in [0, 1).
    pub fraction: Beats,
}

pub fn meter_position(beat: Beats, time_signature: Option<TimeSignature>) -> MeterPosition {
    let bar_beats = time_signature.unwrap_or_default().bar_beats();
    let bar = (beat / bar_beats).floor();
    let offset = beat - bar * bar_beats;
    let beat_in_bar = offset.floor();
    MeterPosition {
        bar: bar.to_integer(),
        beat_in_bar: beat_in_bar.to_integer(),
        fraction: offset - beat_in_bar,
    }
}

pub fn beats_to_seconds(beats: Beats, bpm: f64) -> f64 {
    beats_to_f64(beats) / (bpm / 60.0)
}

/// Beat offsets from `start` (inclusive) to `end` (exclusive) in sixteenths.
pub fn sixteenth_grid(start: Beats, end: Beats) -> Vec<Beats> {
    let step = Beats::new(1, 4);
    let mut out = Vec::new();
    let mut pos = (start / step).ceil() * step;
    while pos < end {
        out.push(pos);
        pos += step;
    }
    out
}
