// Data-driven sketch configuration.
//
// Every tunable number a generator uses lives here, grouped into one
// parameter struct per sketch, so a piece can be re-voiced or lengthened
// from a JSON file without recompiling. `SketchConfig::default()` reproduces
// the stock sketches; any field missing from a file falls back to that
// default (`#[serde(default)]` at every level), so config files only need to
// name what they change.
//
// Durations are written as float beats (0.5 = an eighth note) for
// readability and converted to exact `Beats` by the generators.
//
// See also: `generators/` for the code that reads each parameter group,
// `harmony.rs` for the table format under the `harmony` key.

use crate::error::MusicError;
use crate::harmony::HarmonyTable;
use crate::instrument::{Instrument, PitchRange};
use crate::meter::TimeSignature;
use crate::scale::{Scale, ScaleKind};
use crate::score::DEFAULT_COMPOSER;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which slice of an instrument's range a generator writes in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterChoice {
    Full,
    Safe,
    VerySafe,
}

/// A duration option with a relative likelihood.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightedDuration {
    pub beats: f64,
    pub weight: f64,
}

impl WeightedDuration {
    pub fn new(beats: f64, weight: f64) -> Self {
        WeightedDuration { beats, weight }
    }
}

/// Score metadata shared by every sketch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreParams {
    pub title: String,
    pub tempo_bpm: u32,
    pub time_signature: Option<TimeSignature>,
    pub instruments: Vec<Instrument>,
}

impl ScoreParams {
    fn new(title: &str, tempo_bpm: u32, instruments: &[Instrument]) -> Self {
        ScoreParams {
            title: title.to_string(),
            tempo_bpm,
            time_signature: None,
            instruments: instruments.to_vec(),
        }
    }
}

impl Default for ScoreParams {
    fn default() -> Self {
        ScoreParams::new("Untitled", 60, &Instrument::PITCHED)
    }
}

/// Scale-filtered random walk with section-by-section key drift.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomWalkParams {
    pub score: ScoreParams,
    /// Keep appending while a part is no longer than this.
    pub total_beats: f64,
    /// How long each scale of the plan stays active.
    pub section_beats: f64,
    /// Number of scales in the plan; later sections reuse the last one.
    pub sections: usize,
    pub scale_kind: ScaleKind,
    /// Semitone shifts the root may take between sections.
    pub root_changes: Vec<i32>,
    pub rest_chance: f64,
    /// Largest melodic step in semitones.
    pub max_step: u8,
    /// Rest lengths in sixteenths, inclusive bounds.
    pub rest_sixteenths: (i32, i32),
    /// Note lengths in sixteenths, inclusive bounds.
    pub note_sixteenths: (i32, i32),
}

impl Default for RandomWalkParams {
    fn default() -> Self {
        RandomWalkParams {
            score: ScoreParams::new("Full Movie", 160, &Instrument::PITCHED),
            total_beats: 64.0,
            section_beats: 16.0,
            sections: 8,
            scale_kind: ScaleKind::Major,
            root_changes: vec![-1, 1, 6],
            rest_chance: 0.5,
            max_step: 3,
            rest_sixteenths: (1, 16),
            note_sixteenths: (1, 8),
        }
    }
}

/// One voice of the drift sketch and the pitch it starts on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftVoice {
    pub instrument: Instrument,
    pub start_pitch: u8,
}

/// Chromatic voice-leading drift: one voice moves per step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftParams {
    pub score: ScoreParams,
    pub voices: Vec<DriftVoice>,
    pub steps: usize,
    pub step_beats: f64,
    /// Chance a move is a whole step instead of a half step.
    pub leap_chance: f64,
    /// Optional shared register, intersected with each instrument's range.
    pub register: Option<PitchRange>,
    /// Only accept moves whose resulting chord is in the harmony table.
    pub require_allowed_harmony: bool,
    pub harmony_attempts: usize,
}

impl Default for DriftParams {
    fn default() -> Self {
        let voices = [
            (Instrument::Flute, 74),
            (Instrument::Oboe, 72),
            (Instrument::Clarinet, 73),
        ]
        .into_iter()
        .map(|(instrument, start_pitch)| DriftVoice { instrument, start_pitch })
        .collect();
        DriftParams {
            score: ScoreParams::new(
                "Movement 3",
                160,
                &[Instrument::Flute, Instrument::Oboe, Instrument::Clarinet],
            ),
            voices,
            steps: 150,
            step_beats: 1.0,
            leap_chance: 0.1,
            register: None,
            require_allowed_harmony: false,
            harmony_attempts: 8,
        }
    }
}

/// Pentatonic rounds: every selected part adds one note per round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PentatonicParams {
    pub score: ScoreParams,
    /// Parts that play. `None` means every score part except the last.
    pub players: Option<Vec<Instrument>>,
    pub rounds: usize,
    pub durations: Vec<f64>,
    pub note_chance: f64,
    pub scale: Scale,
    /// Pitches must stay strictly closer than this to the previous note.
    pub proximity: u8,
}

impl Default for PentatonicParams {
    fn default() -> Self {
        PentatonicParams {
            score: ScoreParams::new("Utah 2017", 60, &Instrument::PITCHED),
            players: None,
            rounds: 40,
            durations: vec![0.5, 1.0, 1.5, 2.0],
            note_chance: 0.8,
            scale: Scale::major_pentatonic(0),
            proximity: 5,
        }
    }
}

/// Harmony-aware phrasing across the whole ensemble.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleParams {
    pub score: ScoreParams,
    pub total_beats: f64,
    /// Decision grid; parts only start notes on multiples of this.
    pub step_beats: f64,
    pub section_beats: f64,
    pub scale_kind: ScaleKind,
    pub root_changes: Vec<i32>,
    pub register: RegisterChoice,
    /// Rest chance right after a rest.
    pub base_rest_chance: f64,
    /// Extra rest chance per `phrase_beats` of unbroken playing.
    pub rest_pressure: f64,
    pub phrase_beats: f64,
    pub max_rest_chance: f64,
    pub rest_lengths: Vec<WeightedDuration>,
    pub durations: Vec<WeightedDuration>,
    /// Largest melodic interval considered, in semitones.
    pub max_leap: u8,
    /// Exponent of the interval penalty `1 / (1 + |interval|)^falloff`.
    pub leap_falloff: f64,
}

impl Default for EnsembleParams {
    fn default() -> Self {
        EnsembleParams {
            score: ScoreParams::new("Ensemble Phrases", 96, &Instrument::PITCHED),
            total_beats: 64.0,
            step_beats: 0.5,
            section_beats: 16.0,
            scale_kind: ScaleKind::Major,
            root_changes: vec![5, 7],
            register: RegisterChoice::Safe,
            base_rest_chance: 0.05,
            rest_pressure: 0.4,
            phrase_beats: 8.0,
            max_rest_chance: 0.95,
            rest_lengths: vec![
                WeightedDuration::new(0.5, 1.0),
                WeightedDuration::new(1.0, 2.0),
                WeightedDuration::new(2.0, 1.0),
            ],
            durations: vec![
                WeightedDuration::new(0.5, 3.0),
                WeightedDuration::new(1.0, 4.0),
                WeightedDuration::new(1.5, 2.0),
                WeightedDuration::new(2.0, 1.0),
            ],
            max_leap: 7,
            leap_falloff: 1.5,
        }
    }
}

/// Settings for the fixed transcription.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionParams {
    pub score: ScoreParams,
}

impl Default for TranscriptionParams {
    fn default() -> Self {
        TranscriptionParams {
            score: ScoreParams::new(
                "Art Pepper \"September Song\" Excerpt",
                120,
                &[Instrument::AltoSaxophone],
            ),
        }
    }
}

/// Top-level configuration: composer credit, harmony table and one
/// parameter group per sketch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    pub composer: String,
    pub harmony: HarmonyTable,
    pub random_walk: RandomWalkParams,
    pub drift: DriftParams,
    pub pentatonic: PentatonicParams,
    pub ensemble: EnsembleParams,
    pub september_song: TranscriptionParams,
}

impl Default for SketchConfig {
    fn default() -> Self {
        SketchConfig {
            composer: DEFAULT_COMPOSER.to_string(),
            harmony: HarmonyTable::standard(),
            random_walk: RandomWalkParams::default(),
            drift: DriftParams::default(),
            pentatonic: PentatonicParams::default(),
            ensemble: EnsembleParams::default(),
            september_song: TranscriptionParams::default(),
        }
    }
}

impl SketchConfig {
    pub fn from_json(json: &str) -> Result<Self, MusicError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, MusicError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, MusicError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
