// Chamber Sketches
//
// Generative sketches for a fixed chamber ensemble (violin, flute, oboe,
// clarinet, alto saxophone, trumpet, bass, percussion). Each sketch makes
// plausible note sequences with weighted random walks over instrument
// ranges, scale filters and a harmony table, then hands the result to a
// renderer for engraving or playback.
//
// Architecture:
// - instrument.rs: Ensemble data (ranges, registers, clefs, GM programs)
// - note.rs: The note event (rest, pitch or chord) with exact rational beats
// - part.rs: One instrument's append-only line plus look-back queries
// - score.rs: Title/tempo/meter and one part per instrument, cross-part queries
// - meter.rs: Time signatures and meter positions
// - scale.rs: Scales as pitch-class filters and drifting scale plans
// - harmony.rs: Pitch-class sets and the harmony-membership table
// - generators/: The sketches (random walk, drift, pentatonic, ensemble,
//   transcription) and the `Sketch` dispatch
// - render/: The renderer boundary (LilyPond, MIDI, text) and viewer launch
// - config.rs: JSON configuration with per-sketch parameter groups
// - error.rs: The library error type
//
// All randomness comes from one seeded `SketchRng`, so output is
// reproducible from (sketch, config, seed).

pub mod config;
pub mod error;
pub mod generators;
pub mod harmony;
pub mod instrument;
pub mod meter;
pub mod note;
pub mod part;
pub mod render;
pub mod scale;
pub mod score;
