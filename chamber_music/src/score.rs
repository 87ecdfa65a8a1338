// The score: title, tempo and one part per instrument.
//
// This is what generators write into and what renderers read. Parts keep
// their own implicit timelines; the score answers cross-part questions such
// as "what is sounding at beat 12" (the input to harmony checks) and carries
// the metadata a notation program needs for the title block.

use crate::error::MusicError;
use crate::instrument::Instrument;
use crate::meter::{TimeSignature, meter_position};
use crate::note::{Beats, Note, Sound, pitch_name};
use crate::part::Part;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

pub const DEFAULT_COMPOSER: &str = "Jonathan Marmor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub title: String,
    pub composer: String,
    /// Generation date as `YYYY/MM/DD`. Only the binary stamps it;
    /// generators leave it `None`.
    pub date: Option<String>,
    /// `None` means no printed signature; renderers bar in 4/4.
    pub time_signature: Option<TimeSignature>,
    pub tempo_bpm: u32,
    /// Note value the tempo refers to, in beats (1 = quarter note).
    pub tempo_referent: Beats,
    parts: Vec<Part>,
}

impl Score {
    /// Parts are created in the order given; duplicates are dropped.
    pub fn new(title: &str, instruments: &[Instrument], tempo_bpm: u32) -> Self {
        let mut parts: Vec<Part> = Vec::with_capacity(instruments.len());
        for &inst in instruments {
            if !parts.iter().any(|p| p.instrument == inst) {
                parts.push(Part::new(inst));
            }
        }
        Score {
            title: title.to_string(),
            composer: DEFAULT_COMPOSER.to_string(),
            date: None,
            time_signature: None,
            tempo_bpm,
            tempo_referent: Beats::from_integer(1),
            parts,
        }
    }

    /// The seven pitched instruments at 160 bpm.
    pub fn ensemble(title: &str) -> Self {
        Score::new(title, &Instrument::PITCHED, 160)
    }

    pub fn instruments(&self) -> Vec<Instrument> {
        self.parts.iter().map(|p| p.instrument).collect()
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut [Part] {
        &mut self.parts
    }

    pub fn part(&self, instrument: Instrument) -> Result<&Part, MusicError> {
        self.parts
            .iter()
            .find(|p| p.instrument == instrument)
            .ok_or(MusicError::MissingPart(instrument))
    }

    pub fn part_mut(&mut self, instrument: Instrument) -> Result<&mut Part, MusicError> {
        self.parts
            .iter_mut()
            .find(|p| p.instrument == instrument)
            .ok_or(MusicError::MissingPart(instrument))
    }

    /// Length of the longest part.
    pub fn duration(&self) -> Beats {
        self.parts
            .iter()
            .map(Part::duration)
            .max()
            .unwrap_or_else(|| Beats::from_integer(0))
    }

    /// What every part is doing at `beat`, in score order. `None` means the
    /// part has already ended.
    pub fn notes_at(&self, beat: Beats) -> Vec<(Instrument, Option<&Note>)> {
        self.parts
            .iter()
            .map(|p| (p.instrument, p.note_at(beat)))
            .collect()
    }

    /// All pitches sounding at `beat`, sorted, duplicates kept.
    pub fn sounding_pitches_at(&self, beat: Beats) -> Vec<u8> {
        let mut pitches: Vec<u8> = self
            .notes_at(beat)
            .into_iter()
            .filter_map(|(_, note)| note)
            .flat_map(|note| note.pitches().iter().copied())
            .collect();
        pitches.sort_unstable();
        pitches
    }

    /// Copy the note-index window `[start, end)` out of the chosen parts.
    ///
    /// An empty `instruments` slice selects every part. Without `end` the
    /// window runs to the length of the shortest selected part. Windows are
    /// clamped to each part's length.
    pub fn slice(
        &self,
        instruments: &[Instrument],
        start: usize,
        end: Option<usize>,
    ) -> Result<BTreeMap<Instrument, Vec<Note>>, MusicError> {
        let selected: Vec<&Part> = if instruments.is_empty() {
            self.parts.iter().collect()
        } else {
            instruments
                .iter()
                .map(|&i| self.part(i))
                .collect::<Result<_, _>>()?
        };
        let end = end.unwrap_or_else(|| selected.iter().map(|p| p.len()).min().unwrap_or(0));

        Ok(selected
            .into_iter()
            .map(|part| {
                let notes = part.notes();
                let hi = end.min(notes.len());
                let lo = start.min(hi);
                (part.instrument, notes[lo..hi].to_vec())
            })
            .collect())
    }

    pub fn stats(&self) -> ScoreStats {
        let mut stats = ScoreStats {
            parts: self.parts.len(),
            notes: 0,
            chords: 0,
            rests: 0,
            duration: self.duration(),
        };
        for note in self.parts.iter().flat_map(|p| p.notes()) {
            match note.sound {
                Sound::Rest => stats.rests += 1,
                Sound::Pitch(_) => stats.notes += 1,
                Sound::Chord(_) => stats.chords += 1,
            }
        }
        stats
    }

    /// Compact text view: one line per part, bar lines marked with `|`,
    /// each event as `name:duration`.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} ({}), {} bpm, {} beats",
            self.title,
            self.composer,
            self.tempo_bpm,
            self.duration()
        );
        for part in &self.parts {
            let _ = write!(out, "{:>15}:", part.instrument.display_name());
            let mut last_bar = 0;
            for event in part.events() {
                let bar = meter_position(event.start, self.time_signature).bar;
                if bar != last_bar {
                    out.push_str(" |");
                    last_bar = bar;
                }
                let name = match &event.note.sound {
                    Sound::Rest => "r".to_string(),
                    Sound::Pitch(p) => pitch_name(*p),
                    Sound::Chord(ps) => {
                        let names: Vec<String> = ps.iter().map(|&p| pitch_name(p)).collect();
                        format!("<{}>", names.join(" "))
                    }
                };
                let _ = write!(out, " {}:{}", name, event.note.duration);
            }
            out.push('\n');
        }
        out
    }
}

/// Event counts across the score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreStats {
    pub parts: usize,
    pub notes: usize,
    pub chords: usize,
    pub rests: usize,
    pub duration: Beats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{beats, whole_beats};

    fn trio() -> Score {
        let mut score = Score::new(
            "Trio",
            &[Instrument::Flute, Instrument::Oboe, Instrument::Clarinet],
            60,
        );
        score.part_mut(Instrument::Flute).unwrap().add_pitch(74, whole_beats(2)).unwrap();
        let oboe = score.part_mut(Instrument::Oboe).unwrap();
        oboe.add_pitch(72, whole_beats(1)).unwrap();
        oboe.add_rest(whole_beats(1)).unwrap();
        oboe.add_pitch(71, whole_beats(3)).unwrap();
        let cl = score.part_mut(Instrument::Clarinet).unwrap();
        cl.add_note(Sound::Chord(vec![55, 62]), beats(1, 2)).unwrap();
        cl.add_pitch(60, beats(1, 2)).unwrap();
        score
    }

    #[test]
    fn test_ensemble_has_seven_pitched_parts() {
        let score = Score::ensemble("Full Movie");
        assert_eq!(score.instruments(), Instrument::PITCHED.to_vec());
        assert_eq!(score.composer, DEFAULT_COMPOSER);
        assert_eq!(score.tempo_bpm, 160);
        assert_eq!(score.duration(), whole_beats(0));
    }

    #[test]
    fn test_duplicate_instruments_collapse() {
        let score = Score::new("x", &[Instrument::Oboe, Instrument::Oboe], 60);
        assert_eq!(score.parts().len(), 1);
    }

    #[test]
    fn test_missing_part_is_an_error() {
        let mut score = trio();
        assert!(matches!(score.part(Instrument::Bass), Err(MusicError::MissingPart(Instrument::Bass))));
        assert!(score.part_mut(Instrument::Violin).is_err());
    }

    #[test]
    fn test_duration_is_longest_part() {
        assert_eq!(trio().duration(), whole_beats(5));
    }

    #[test]
    fn test_notes_at_reports_every_part() {
        let score = trio();
        let at_one = score.notes_at(whole_beats(1));
        assert_eq!(at_one.len(), 3);
        assert_eq!(at_one[0].1.unwrap().top_pitch(), Some(74));
        assert!(at_one[1].1.unwrap().is_rest());
        assert!(at_one[2].1.is_none(), "clarinet has ended by beat 1");
    }

    #[test]
    fn test_sounding_pitches_include_chords() {
        let score = trio();
        assert_eq!(score.sounding_pitches_at(whole_beats(0)), vec![55, 62, 72, 74]);
        assert_eq!(score.sounding_pitches_at(beats(1, 2)), vec![60, 72, 74]);
        assert_eq!(score.sounding_pitches_at(whole_beats(1)), vec![74]);
        assert!(score.sounding_pitches_at(whole_beats(9)).is_empty());
    }

    #[test]
    fn test_slice_by_note_index() {
        let score = trio();
        let all = score.slice(&[], 0, None).unwrap();
        assert_eq!(all.len(), 3);
        // Shortest part (flute) has one note.
        assert!(all.values().all(|notes| notes.len() == 1));

        let oboe = score.slice(&[Instrument::Oboe], 1, Some(3)).unwrap();
        assert_eq!(oboe[&Instrument::Oboe].len(), 2);
        assert!(oboe[&Instrument::Oboe][0].is_rest());

        let clamped = score.slice(&[Instrument::Clarinet], 5, Some(9)).unwrap();
        assert!(clamped[&Instrument::Clarinet].is_empty());

        assert!(score.slice(&[Instrument::Trumpet], 0, None).is_err());
    }

    #[test]
    fn test_stats_count_event_kinds() {
        let stats = trio().stats();
        assert_eq!(stats.parts, 3);
        assert_eq!(stats.notes, 4);
        assert_eq!(stats.chords, 1);
        assert_eq!(stats.rests, 1);
        assert_eq!(stats.duration, whole_beats(5));
    }

    #[test]
    fn test_summary_lists_parts_and_barlines() {
        let summary = trio().summary();
        assert!(summary.starts_with("Trio (Jonathan Marmor)"));
        assert!(summary.contains("Flute: D5:2"), "{summary}");
        assert!(summary.contains("<G3 D4>:1/2"), "{summary}");
        // Oboe's B4 starts on beat 2 and holds into bar 2; no bar line before it.
        assert!(summary.contains("Oboe: C5:1 r:1 B4:3"), "{summary}");
    }
}
