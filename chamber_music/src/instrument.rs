// The chamber ensemble: static instrument data.
//
// Eight instruments in score order (violin down to percussion). Each carries
// a notation name and abbreviation, a playable MIDI range, a clef and a
// General MIDI program for playback. Percussion is unpitched and has no
// range; generators work over `Instrument::PITCHED`.
//
// Registers split a range into seven equal bands by index. The sketches
// mostly write in the "safe" bands (everything but the extremes) and use the
// outer bands for effect.

use crate::error::MusicError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    Violin,
    Flute,
    Oboe,
    Clarinet,
    AltoSaxophone,
    Trumpet,
    Bass,
    Percussion,
}

/// Staff clef used when rendering a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clef {
    Treble,
    Bass,
    Percussion,
}

impl Clef {
    pub fn lilypond_name(self) -> &'static str {
        match self {
            Clef::Treble => "treble",
            Clef::Bass => "bass",
            Clef::Percussion => "percussion",
        }
    }
}

/// Inclusive MIDI pitch range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchRange {
    pub low: u8,
    pub high: u8,
}

impl PitchRange {
    pub fn new(low: u8, high: u8) -> Self {
        PitchRange { low: low.min(high), high: low.max(high) }
    }

    pub fn contains(&self, pitch: u8) -> bool {
        (self.low..=self.high).contains(&pitch)
    }

    pub fn len(&self) -> usize {
        (self.high - self.low) as usize + 1
    }

    /// Always false: a range holds at least one pitch.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<u8> {
        self.low..=self.high
    }

    /// The pitch halfway up the range (index `len / 2`).
    pub fn middle(&self) -> u8 {
        self.low + (self.len() / 2) as u8
    }

    /// Intersection with another range, if they overlap.
    pub fn intersect(&self, other: &PitchRange) -> Option<PitchRange> {
        let low = self.low.max(other.low);
        let high = self.high.min(other.high);
        (low <= high).then_some(PitchRange { low, high })
    }
}

/// A range divided into seven bands by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    pub lowest: Vec<u8>,
    pub middle: Vec<u8>,
    pub highest: Vec<u8>,
    /// Bands 1 through 5: everything but the extremes.
    pub safe: Vec<u8>,
    /// Bands 2 through 4.
    pub very_safe: Vec<u8>,
}

const REGISTER_BANDS: usize = 7;

impl Registers {
    pub fn from_range(range: PitchRange) -> Self {
        let len = range.len();
        let bands: Vec<Vec<u8>> = (0..REGISTER_BANDS)
            .map(|band| {
                range
                    .iter()
                    .enumerate()
                    .filter(|&(pos, _)| {
                        let scaled = pos * REGISTER_BANDS;
                        scaled >= band * len && scaled < (band + 1) * len
                    })
                    .map(|(_, pitch)| pitch)
                    .collect()
            })
            .collect();

        Registers {
            lowest: bands[0].clone(),
            middle: bands[3].clone(),
            highest: bands[REGISTER_BANDS - 1].clone(),
            safe: bands[1..REGISTER_BANDS - 1].concat(),
            very_safe: bands[2..REGISTER_BANDS - 2].concat(),
        }
    }
}

impl Instrument {
    pub const ALL: [Instrument; 8] = [
        Instrument::Violin,
        Instrument::Flute,
        Instrument::Oboe,
        Instrument::Clarinet,
        Instrument::AltoSaxophone,
        Instrument::Trumpet,
        Instrument::Bass,
        Instrument::Percussion,
    ];

    /// The ensemble minus percussion, in score order.
    pub const PITCHED: [Instrument; 7] = [
        Instrument::Violin,
        Instrument::Flute,
        Instrument::Oboe,
        Instrument::Clarinet,
        Instrument::AltoSaxophone,
        Instrument::Trumpet,
        Instrument::Bass,
    ];

    /// snake_case key used in config files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Instrument::Violin => "violin",
            Instrument::Flute => "flute",
            Instrument::Oboe => "oboe",
            Instrument::Clarinet => "clarinet",
            Instrument::AltoSaxophone => "alto_saxophone",
            Instrument::Trumpet => "trumpet",
            Instrument::Bass => "bass",
            Instrument::Percussion => "percussion",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Instrument::Violin => "Violin",
            Instrument::Flute => "Flute",
            Instrument::Oboe => "Oboe",
            Instrument::Clarinet => "Clarinet",
            Instrument::AltoSaxophone => "Alto Saxophone",
            Instrument::Trumpet => "Trumpet",
            Instrument::Bass => "Bass",
            Instrument::Percussion => "Percussion",
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Instrument::Violin => "vln",
            Instrument::Flute => "f",
            Instrument::Oboe => "ob",
            Instrument::Clarinet => "cl",
            Instrument::AltoSaxophone => "sx",
            Instrument::Trumpet => "tpt",
            Instrument::Bass => "b",
            Instrument::Percussion => "perc",
        }
    }

    /// Playable range as MIDI pitches. `None` for percussion.
    pub fn range(self) -> Option<PitchRange> {
        let (low, high) = match self {
            Instrument::Violin => (55, 95),
            Instrument::Flute => (60, 96),
            Instrument::Oboe => (59, 86),
            Instrument::Clarinet => (50, 89),
            Instrument::AltoSaxophone => (49, 80),
            Instrument::Trumpet => (52, 82),
            Instrument::Bass => (28, 60),
            Instrument::Percussion => return None,
        };
        Some(PitchRange { low, high })
    }

    pub fn registers(self) -> Option<Registers> {
        self.range().map(Registers::from_range)
    }

    pub fn clef(self) -> Clef {
        match self {
            Instrument::Bass => Clef::Bass,
            Instrument::Percussion => Clef::Percussion,
            _ => Clef::Treble,
        }
    }

    /// General MIDI program number (0-based).
    pub fn midi_program(self) -> u8 {
        match self {
            Instrument::Violin => 40,
            Instrument::Flute => 73,
            Instrument::Oboe => 68,
            Instrument::Clarinet => 71,
            Instrument::AltoSaxophone => 65,
            Instrument::Trumpet => 56,
            Instrument::Bass => 32,
            Instrument::Percussion => 0,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Instrument {
    type Err = MusicError;

    /// Accepts either the snake_case name or the abbreviation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        Instrument::ALL
            .into_iter()
            .find(|i| i.name() == key || i.abbreviation() == key)
            .ok_or_else(|| MusicError::UnknownInstrument(s.to_string()))
    }
}
