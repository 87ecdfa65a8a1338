// A fixed transcription: four bars of Art Pepper's alto solo on
// "September Song".
//
// Nothing random happens here. The excerpt exists to exercise the renderers
// with material no generator writes: triplet eighths, pickup rests and
// syncopated rests.

use crate::error::MusicError;
use crate::instrument::Instrument;
use crate::note::{Sound, beats};
use crate::score::Score;

/// (pitch or rest, duration as numerator/denominator of a beat).
const SEPTEMBER_SONG: &[(Option<u8>, i64, i64)] = &[
    (None, 3, 1),
    (Some(64), 1, 2),
    (Some(60), 1, 2),
    (Some(69), 1, 3),
    (Some(72), 1, 3),
    (Some(69), 1, 3),
    (Some(67), 1, 2),
    (Some(72), 1, 1),
    (Some(72), 1, 2),
    (Some(67), 1, 3),
    (Some(72), 1, 3),
    (Some(67), 1, 3),
    (Some(66), 1, 2),
    (None, 1, 2),
    (Some(69), 1, 2),
    (Some(67), 1, 2),
    (None, 1, 2),
    (Some(64), 1, 2),
    (Some(60), 1, 2),
    (None, 1, 2),
    (Some(65), 1, 2),
    (Some(67), 1, 2),
    (Some(63), 1, 2),
    (Some(64), 1, 2),
    (Some(60), 1, 2),
    (Some(57), 1, 2),
    (None, 1, 1),
];

/// Write the excerpt into the score's alto saxophone part.
pub fn generate(score: &mut Score) -> Result<(), MusicError> {
    let part = score.part_mut(Instrument::AltoSaxophone)?;
    for &(pitch, numer, denom) in SEPTEMBER_SONG {
        part.add_note(Sound::from(pitch), beats(numer, denom))?;
    }
    Ok(())
}
