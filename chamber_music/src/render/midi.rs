// Standard MIDI File export.
//
// Writes SMF format 1: a conductor track holding the title, tempo and meter,
// then one track per part with its name and General MIDI program. Percussion
// always plays on channel 10 (index 9); pitched parts take the other
// channels in score order. Chords sound as one note-on per pitch.
//
// Event times are computed from each note's exact start in beats, so
// triplets land on whole ticks (480 per quarter is divisible by 3) and long
// parts never accumulate rounding drift.
//
// Uses the `midly` crate for MIDI writing.

use crate::error::MusicError;
use crate::instrument::Instrument;
use crate::note::Beats;
use crate::part::Part;
use crate::render::Renderer;
use crate::score::Score;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Channel index General MIDI reserves for percussion.
const PERCUSSION_CHANNEL: u8 = 9;

const VELOCITY: u8 = 80;

/// Largest value a tempo meta event can hold (24 bits).
const MAX_TEMPO_MICROS: i64 = 0xFF_FFFF;

pub struct MidiRenderer;

impl Renderer for MidiRenderer {
    fn render(&self, score: &Score) -> Result<Vec<u8>, MusicError> {
        let smf = score_to_smf(score)?;
        let mut buf = Vec::new();
        smf.write_std(&mut buf).map_err(|e| MusicError::Midi(e.to_string()))?;
        Ok(buf)
    }

    fn extension(&self) -> &'static str {
        "mid"
    }
}

fn to_ticks(beats: Beats) -> u32 {
    (beats * Beats::from_integer(TICKS_PER_QUARTER as i64))
        .round()
        .to_integer()
        .max(0) as u32
}

/// Microseconds per quarter note for `bpm` beats of `referent` quarters.
fn tempo_micros(bpm: u32, referent: Beats) -> Result<u32, MusicError> {
    let quarters_per_minute = Beats::from_integer(bpm as i64) * referent;
    if quarters_per_minute <= Beats::from_integer(0) {
        return Err(MusicError::Midi(format!("tempo must be positive, got {bpm}")));
    }
    let micros = (Beats::from_integer(60_000_000) / quarters_per_minute).round().to_integer();
    Ok(micros.clamp(1, MAX_TEMPO_MICROS) as u32)
}

fn channel_for(instrument: Instrument, index: usize) -> u4 {
    if instrument == Instrument::Percussion {
        return u4::new(PERCUSSION_CHANNEL);
    }
    let channel = if index >= PERCUSSION_CHANNEL as usize { index + 1 } else { index };
    u4::new(channel.min(15) as u8)
}

fn meta(kind: MetaMessage<'_>) -> TrackEventKind<'_> {
    TrackEventKind::Meta(kind)
}

/// Turn absolute-tick events into a track with delta times, closed at
/// `end_tick` or at the last event, whichever is later.
fn with_deltas<'a>(events: Vec<(u32, TrackEventKind<'a>)>, end_tick: u32) -> Track<'a> {
    let mut track = Vec::with_capacity(events.len() + 1);
    let mut last_tick = 0;
    for (tick, kind) in events {
        track.push(TrackEvent { delta: u28::new(tick - last_tick), kind });
        last_tick = tick;
    }
    track.push(TrackEvent {
        delta: u28::new(end_tick.saturating_sub(last_tick)),
        kind: meta(MetaMessage::EndOfTrack),
    });
    track
}

fn part_track(part: &Part, channel: u4) -> Track<'static> {
    let mut events: Vec<(u32, TrackEventKind<'static>)> = vec![
        (0, meta(MetaMessage::TrackName(part.instrument.display_name().as_bytes()))),
        (
            0,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange { program: u7::new(part.instrument.midi_program()) },
            },
        ),
    ];

    for event in part.events() {
        let pitches = event.note.pitches();
        if pitches.is_empty() {
            continue;
        }
        let on = to_ticks(event.start);
        let off = to_ticks(event.end());
        for &pitch in pitches {
            let key = u7::new(pitch.min(127));
            events.push((on, TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, vel: u7::new(VELOCITY) },
            }));
            events.push((off, TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff { key, vel: u7::new(0) },
            }));
        }
    }
    // Stable sort keeps offs ahead of ons at the same tick.
    events.sort_by_key(|e| (e.0, !is_note_off(&e.1)));
    with_deltas(events, to_ticks(part.duration()))
}

fn is_note_off(kind: &TrackEventKind<'_>) -> bool {
    matches!(kind, TrackEventKind::Midi { message: MidiMessage::NoteOff { .. }, .. })
}

/// Build an in-memory SMF for a score.
pub fn score_to_smf(score: &Score) -> Result<Smf<'_>, MusicError> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let time_signature = score.time_signature.unwrap_or_default();
    let conductor = vec![
        (0, meta(MetaMessage::TrackName(score.title.as_bytes()))),
        (0, meta(MetaMessage::Tempo(u24::new(tempo_micros(score.tempo_bpm, score.tempo_referent)?)))),
        (
            0,
            meta(MetaMessage::TimeSignature(
                time_signature.numerator,
                time_signature.denominator.trailing_zeros() as u8,
                24,
                8,
            )),
        ),
    ];
    smf.tracks.push(with_deltas(conductor, 0));

    for (index, part) in score.parts().iter().enumerate() {
        smf.tracks.push(part_track(part, channel_for(part.instrument, index)));
    }
    Ok(smf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{Sound, beats, whole_beats};

    /// (absolute tick, channel, key, is_on) for every note message in a track.
    fn notes(track: &Track<'_>) -> Vec<(u32, u8, u8, bool)> {
        let mut tick = 0;
        let mut out = Vec::new();
        for event in track {
            tick += event.delta.as_int();
            if let TrackEventKind::Midi { channel, message } = &event.kind {
                match message {
                    MidiMessage::NoteOn { key, .. } => out.push((tick, channel.as_int(), key.as_int(), true)),
                    MidiMessage::NoteOff { key, .. } => out.push((tick, channel.as_int(), key.as_int(), false)),
                    _ => {}
                }
            }
        }
        out
    }

    fn track_end(track: &Track<'_>) -> u32 {
        track.iter().map(|e| e.delta.as_int()).sum()
    }

    #[test]
    fn test_score_to_smf_basic() {
        let mut score = Score::new("Duo", &[Instrument::Flute, Instrument::Bass], 120);
        let flute = score.part_mut(Instrument::Flute).unwrap();
        flute.add_pitch(72, whole_beats(1)).unwrap();
        flute.add_rest(beats(1, 2)).unwrap();
        flute.add_pitch(74, beats(1, 2)).unwrap();

        let smf = score_to_smf(&score).unwrap();
        // 1 conductor track + 2 part tracks
        assert_eq!(smf.tracks.len(), 3);
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(
            notes(&smf.tracks[1]),
            vec![(0, 0, 72, true), (480, 0, 72, false), (720, 0, 74, true), (960, 0, 74, false)]
        );
        assert!(notes(&smf.tracks[2]).is_empty());
    }

    #[test]
    fn test_tempo_and_meter() {
        let mut score = Score::new("x", &[Instrument::Oboe], 120);
        score.tempo_referent = beats(3, 2);
        let smf = score_to_smf(&score).unwrap();
        let tempo = smf.tracks[0].iter().find_map(|e| match &e.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
            _ => None,
        });
        // 120 dotted quarters a minute is 180 quarters: 333,333 us each.
        assert_eq!(tempo, Some(333_333));
        assert!(smf.tracks[0].iter().any(|e| matches!(
            e.kind,
            TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8))
        )));

        score.tempo_bpm = 0;
        assert!(matches!(score_to_smf(&score), Err(MusicError::Midi(_))));
    }

    #[test]
    fn test_triplets_land_on_ticks() {
        let mut score = Score::new("x", &[Instrument::AltoSaxophone], 120);
        let sax = score.part_mut(Instrument::AltoSaxophone).unwrap();
        for pitch in [69, 72, 69] {
            sax.add_pitch(pitch, beats(1, 3)).unwrap();
        }
        let smf = score_to_smf(&score).unwrap();
        let ons: Vec<u32> = notes(&smf.tracks[1]).iter().filter(|n| n.3).map(|n| n.0).collect();
        assert_eq!(ons, vec![0, 160, 320]);
    }

    #[test]
    fn test_repeated_pitch_releases_before_restriking() {
        let mut score = Score::new("x", &[Instrument::Oboe], 120);
        let oboe = score.part_mut(Instrument::Oboe).unwrap();
        oboe.add_pitch(72, whole_beats(1)).unwrap();
        oboe.add_pitch(72, whole_beats(1)).unwrap();
        let smf = score_to_smf(&score).unwrap();
        let events = notes(&smf.tracks[1]);
        assert_eq!(events[1], (480, 0, 72, false));
        assert_eq!(events[2], (480, 0, 72, true));
    }

    #[test]
    fn test_chords_and_percussion_channel() {
        let mut score = Score::new("x", &[Instrument::Violin, Instrument::Percussion], 120);
        score
            .part_mut(Instrument::Violin)
            .unwrap()
            .add_note(Sound::Chord(vec![60, 64, 67]), whole_beats(2))
            .unwrap();
        score.part_mut(Instrument::Percussion).unwrap().add_pitch(38, whole_beats(1)).unwrap();

        let smf = score_to_smf(&score).unwrap();
        let violin = notes(&smf.tracks[1]);
        assert_eq!(violin.iter().filter(|n| n.3).count(), 3);
        assert!(violin.iter().all(|n| n.1 == 0));
        let drums = notes(&smf.tracks[2]);
        assert_eq!(drums, vec![(0, 9, 38, true), (480, 9, 38, false)]);
    }

    #[test]
    fn test_trailing_rest_extends_track() {
        let mut score = Score::new("x", &[Instrument::Trumpet], 120);
        let trumpet = score.part_mut(Instrument::Trumpet).unwrap();
        trumpet.add_pitch(60, whole_beats(1)).unwrap();
        trumpet.add_rest(whole_beats(3)).unwrap();
        let smf = score_to_smf(&score).unwrap();
        assert_eq!(track_end(&smf.tracks[1]), 4 * 480);
    }

    #[test]
    fn test_channels_skip_percussion() {
        assert_eq!(channel_for(Instrument::Violin, 0).as_int(), 0);
        assert_eq!(channel_for(Instrument::Bass, 9).as_int(), 10);
        assert_eq!(channel_for(Instrument::Percussion, 2).as_int(), 9);
    }

    #[test]
    fn test_rendered_bytes_parse_back() {
        let mut score = Score::new("Round Trip", &[Instrument::Clarinet], 96);
        score.part_mut(Instrument::Clarinet).unwrap().add_pitch(62, whole_beats(2)).unwrap();
        let bytes = MidiRenderer.render(&score).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 2);
        assert_eq!(notes(&smf.tracks[1]), vec![(0, 0, 62, true), (960, 0, 62, false)]);
    }
}
