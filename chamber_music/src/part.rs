// One instrument's line: a flat, append-only sequence of note events.
//
// Offsets are implicit (each note starts where the previous one ended), so
// a part is just its notes. Generators only ever append, extend the last
// note, or look back: the last pitched note for melodic continuity, and the
// length of the current unbroken phrase for deciding when to breathe.
//
// Appends are validated: durations must be positive and pitches must sit in
// the instrument's range. Percussion accepts any pitch number.

use crate::error::MusicError;
use crate::instrument::Instrument;
use crate::meter::{MeterPosition, TimeSignature, meter_position};
use crate::note::{Beats, Note, Sound, TimedNote};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub instrument: Instrument,
    notes: Vec<Note>,
}

impl Part {
    pub fn new(instrument: Instrument) -> Self {
        Part { instrument, notes: Vec::new() }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Total length in beats.
    pub fn duration(&self) -> Beats {
        self.notes.iter().map(|n| n.duration).sum()
    }

    /// Where the next appended note would start.
    pub fn current_position(&self, time_signature: Option<TimeSignature>) -> MeterPosition {
        meter_position(self.duration(), time_signature)
    }

    /// Append a note after validating its duration and range.
    pub fn push(&mut self, note: Note) -> Result<(), MusicError> {
        if note.duration <= Beats::from_integer(0) {
            return Err(MusicError::InvalidDuration(note.duration));
        }
        if let Some(range) = self.instrument.range() {
            if let Some(&pitch) = note.pitches().iter().find(|&&p| !range.contains(p)) {
                return Err(MusicError::PitchOutOfRange {
                    instrument: self.instrument,
                    pitch,
                    low: range.low,
                    high: range.high,
                });
            }
        }
        let sound = Sound::from_pitches(note.pitches());
        self.notes.push(Note::new(sound, note.duration));
        Ok(())
    }

    pub fn add_note(&mut self, sound: Sound, duration: Beats) -> Result<(), MusicError> {
        self.push(Note::new(sound, duration))
    }

    pub fn add_pitch(&mut self, pitch: u8, duration: Beats) -> Result<(), MusicError> {
        self.push(Note::pitch(pitch, duration))
    }

    pub fn add_rest(&mut self, duration: Beats) -> Result<(), MusicError> {
        self.push(Note::rest(duration))
    }

    /// Hold the last note for `duration` more beats. An empty part gets a
    /// rest instead.
    pub fn extend_last(&mut self, duration: Beats) -> Result<(), MusicError> {
        if duration <= Beats::from_integer(0) {
            return Err(MusicError::InvalidDuration(duration));
        }
        match self.notes.last_mut() {
            Some(last) => {
                last.duration += duration;
                Ok(())
            }
            None => self.add_rest(duration),
        }
    }

    /// Notes paired with their start offsets.
    pub fn events(&self) -> impl Iterator<Item = TimedNote<'_>> {
        self.notes.iter().scan(Beats::from_integer(0), |start, note| {
            let timed = TimedNote { start: *start, note };
            *start += note.duration;
            Some(timed)
        })
    }

    /// The note sounding (or resting) at `beat`, if the part reaches that far.
    pub fn timed_note_at(&self, beat: Beats) -> Option<TimedNote<'_>> {
        self.events()
            .take_while(|e| e.start <= beat)
            .find(|e| e.covers(beat))
    }

    pub fn note_at(&self, beat: Beats) -> Option<&Note> {
        self.timed_note_at(beat).map(|e| e.note)
    }

    pub fn last_note(&self) -> Option<&Note> {
        self.notes.last()
    }

    /// Most recent note that is not a rest, looking back past rests.
    pub fn last_pitched_note(&self) -> Option<&Note> {
        self.notes.iter().rev().find(|n| !n.is_rest())
    }

    /// Top pitch of the final event, or `None` if the part is empty or
    /// currently resting.
    pub fn last_pitch(&self) -> Option<u8> {
        self.last_note().and_then(Note::top_pitch)
    }

    /// Length of the trailing run of sounding notes. Zero right after a rest;
    /// a part that never rested counts from its start.
    pub fn beats_since_last_rest(&self) -> Beats {
        self.notes
            .iter()
            .rev()
            .take_while(|n| !n.is_rest())
            .map(|n| n.duration)
            .sum()
    }
}
