// Error type for the chamber_music library.
//
// Generation itself rarely fails; errors come from the edges: bad names in
// config files, notes that fall outside an instrument's range, and the
// rendering/viewer boundary (file I/O, MIDI encoding, launching a viewer).

use crate::instrument::Instrument;
use crate::note::Beats;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MusicError {
    #[error("unknown instrument '{0}'")]
    UnknownInstrument(String),

    #[error("pitch {pitch} is outside the {instrument} range {low}-{high}")]
    PitchOutOfRange {
        instrument: Instrument,
        pitch: u8,
        low: u8,
        high: u8,
    },

    #[error("note durations must be positive, got {0}")]
    InvalidDuration(Beats),

    #[error("invalid time signature '{0}' (expected e.g. \"4/4\" or \"12/8\")")]
    InvalidTimeSignature(String),

    #[error("the score has no {0} part")]
    MissingPart(Instrument),

    #[error("{0} is listed as more than one voice")]
    DuplicateVoice(Instrument),

    #[error("unknown sketch '{0}'")]
    UnknownSketch(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MIDI encoding failed: {0}")]
    Midi(String),

    #[error("could not launch viewer: {0}")]
    Viewer(String),
}
