// Sketch generators and the dispatch that runs them.
//
// Each generator appends to a `Score` built from its `ScoreParams`, reading
// its own parameter group from `SketchConfig` and drawing every random
// decision from one `SketchRng`, so a (sketch, config, seed) triple always
// produces the same score.
//
// - `random_walk`: scale-filtered stepwise walk, one part at a time.
// - `drift`: three winds leaning chromatically, one voice moving per step.
// - `pentatonic`: round-robin pentatonic notes with a proximity rule.
// - `ensemble`: all parts on a shared grid, phrased by rest pressure and
//   filtered through the harmony table.
// - `transcription`: a fixed, hand-entered excerpt.

pub mod drift;
pub mod ensemble;
pub mod pentatonic;
pub mod random_walk;
pub mod transcription;

use crate::config::{ScoreParams, SketchConfig};
use crate::error::MusicError;
use crate::note::{Beats, beats_from_f64};
use crate::score::Score;
use chamber_prng::SketchRng;
use log::info;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sketch {
    RandomWalk,
    Drift,
    Pentatonic,
    Ensemble,
    SeptemberSong,
}

impl Sketch {
    pub const ALL: [Sketch; 5] = [
        Sketch::RandomWalk,
        Sketch::Drift,
        Sketch::Pentatonic,
        Sketch::Ensemble,
        Sketch::SeptemberSong,
    ];

    /// Command-line name.
    pub fn name(self) -> &'static str {
        match self {
            Sketch::RandomWalk => "random-walk",
            Sketch::Drift => "drift",
            Sketch::Pentatonic => "pentatonic",
            Sketch::Ensemble => "ensemble",
            Sketch::SeptemberSong => "september-song",
        }
    }

    pub fn score_params(self, config: &SketchConfig) -> &ScoreParams {
        match self {
            Sketch::RandomWalk => &config.random_walk.score,
            Sketch::Drift => &config.drift.score,
            Sketch::Pentatonic => &config.pentatonic.score,
            Sketch::Ensemble => &config.ensemble.score,
            Sketch::SeptemberSong => &config.september_song.score,
        }
    }

    /// Build an empty score from this sketch's metadata.
    pub fn new_score(self, config: &SketchConfig) -> Score {
        let params = self.score_params(config);
        let mut score = Score::new(&params.title, &params.instruments, params.tempo_bpm);
        score.composer = config.composer.clone();
        score.time_signature = params.time_signature;
        score
    }

    pub fn generate(self, config: &SketchConfig, rng: &mut SketchRng) -> Result<Score, MusicError> {
        let mut score = self.new_score(config);
        match self {
            Sketch::RandomWalk => random_walk::generate(&mut score, &config.random_walk, rng)?,
            Sketch::Drift => drift::generate(&mut score, &config.drift, &config.harmony, rng)?,
            Sketch::Pentatonic => pentatonic::generate(&mut score, &config.pentatonic, rng)?,
            Sketch::Ensemble => {
                ensemble::generate(&mut score, &config.ensemble, &config.harmony, rng)?
            }
            Sketch::SeptemberSong => transcription::generate(&mut score)?,
        }
        let stats = score.stats();
        info!(
            "{}: '{}' with {} parts, {} notes, {} chords, {} rests, {} beats",
            self, score.title, stats.parts, stats.notes, stats.chords, stats.rests, stats.duration
        );
        Ok(score)
    }
}

impl fmt::Display for Sketch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sketch {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('_', "-");
        Sketch::ALL
            .into_iter()
            .find(|sketch| sketch.name() == key)
            .ok_or_else(|| MusicError::UnknownSketch(s.to_string()))
    }
}

/// Float beats from config as an exact, strictly positive duration.
pub(crate) fn positive_beats(value: f64) -> Result<Beats, MusicError> {
    let duration = beats_from_f64(value);
    if duration <= Beats::from_integer(0) {
        return Err(MusicError::InvalidDuration(duration));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Instrument;
    use crate::meter::TimeSignature;
    use crate::note::beats;

    #[test]
    fn test_sketch_names_parse() {
        for sketch in Sketch::ALL {
            assert_eq!(sketch.name().parse::<Sketch>().unwrap(), sketch);
        }
        assert_eq!("September_Song".parse::<Sketch>().unwrap(), Sketch::SeptemberSong);
        assert!(matches!("fugue".parse::<Sketch>(), Err(MusicError::UnknownSketch(_))));
    }

    #[test]
    fn test_new_score_uses_config_metadata() {
        let mut config = SketchConfig::default();
        config.composer = "Anon".to_string();
        config.pentatonic.score.time_signature = Some(TimeSignature { numerator: 3, denominator: 4 });
        let score = Sketch::Pentatonic.new_score(&config);
        assert_eq!(score.title, "Utah 2017");
        assert_eq!(score.composer, "Anon");
        assert_eq!(score.tempo_bpm, 60);
        assert_eq!(score.instruments(), Instrument::PITCHED.to_vec());
        assert!(score.time_signature.is_some());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let config = SketchConfig::default();
        for sketch in Sketch::ALL {
            let a = sketch.generate(&config, &mut SketchRng::new(11)).unwrap();
            let b = sketch.generate(&config, &mut SketchRng::new(11)).unwrap();
            assert_eq!(a, b, "{sketch} differs between identical seeds");
        }
    }

    #[test]
    fn test_positive_beats() {
        assert_eq!(positive_beats(1.5).unwrap(), beats(3, 2));
        assert!(positive_beats(0.0).is_err());
        assert!(positive_beats(-2.0).is_err());
    }
}
