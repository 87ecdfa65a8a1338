// LilyPond engraving source from a score.
//
// Each part becomes a music variable and a Staff inside one StaffGroup, with
// the score's title and composer (plus the date, when stamped) in the
// \header and a shared `global` block for meter and tempo. Parts shorter
// than the score are padded with rests so every staff ends on the same beat.
//
// The work is in the durations. LilyPond wants power-of-two note values
// (optionally dotted), so each event is split at barlines and every fragment
// is decomposed into tied values, largest first. Whatever cannot be spelled
// that way (triplets and other tuplets) is written as a scaled quarter, e.g.
// `c'4*1/3`, which keeps the timing exact without tuplet brackets.
//
// Uses absolute pitches (not \relative) for simplicity and correctness.

use crate::error::MusicError;
use crate::instrument::Instrument;
use crate::note::{Beats, Sound, beats_to_f64};
use crate::part::Part;
use crate::render::Renderer;
use crate::score::Score;
use log::warn;
use std::fmt::Write;

pub struct LilyPondRenderer;

impl Renderer for LilyPondRenderer {
    fn render(&self, score: &Score) -> Result<Vec<u8>, MusicError> {
        Ok(score_to_lilypond(score).into_bytes())
    }

    fn extension(&self) -> &'static str {
        "ly"
    }
}

/// Pitch class names in LilyPond notation (indexed by pitch class 0-11).
/// Uses flats for black keys except C# and F#.
const LY_PITCH_NAMES: [&str; 12] = [
    "c", "cis", "d", "ees", "e", "f", "fis", "g", "aes", "a", "bes", "b",
];

/// Convert a MIDI pitch number to a LilyPond absolute pitch string.
///
/// LilyPond's `c` with no octave marks = MIDI 48 (C3).
/// Each `'` raises one octave, each `,` lowers one octave.
pub fn midi_to_ly_note(midi_pitch: u8) -> String {
    let pc = (midi_pitch % 12) as usize;
    let octave = (midi_pitch / 12) as i8 - 4;
    let mut result = LY_PITCH_NAMES[pc].to_string();
    if octave > 0 {
        for _ in 0..octave {
            result.push('\'');
        }
    } else {
        for _ in 0..(-octave) {
            result.push(',');
        }
    }
    result
}

/// A rest, a pitch or a `<...>` chord, without its duration.
fn ly_sound(sound: &Sound) -> String {
    match sound {
        Sound::Rest => "r".to_string(),
        Sound::Pitch(p) => midi_to_ly_note(*p),
        Sound::Chord(ps) => {
            let names: Vec<String> = ps.iter().map(|&p| midi_to_ly_note(p)).collect();
            format!("<{}>", names.join(" "))
        }
    }
}

/// Spellable note values in beats (numerator, denominator) and their
/// LilyPond text, longest first.
const DURATION_TABLE: [(i64, i64, &str); 11] = [
    (4, 1, "1"),
    (3, 1, "2."),
    (2, 1, "2"),
    (3, 2, "4."),
    (1, 1, "4"),
    (3, 4, "8."),
    (1, 2, "8"),
    (3, 8, "16."),
    (1, 4, "16"),
    (1, 8, "32"),
    (1, 16, "64"),
];

fn is_binary(value: Beats) -> bool {
    (*value.denom() as u64).is_power_of_two()
}

/// Decompose a duration into LilyPond duration strings, largest first. The
/// pieces are meant to be tied.
///
/// Binary fractions decompose completely (5/2 beats = "2" + "8"). For
/// anything else the whole beats are spelled normally and the remainder
/// becomes one scaled quarter: 4/3 beats = "4" + "4*1/3".
pub fn decompose_duration(duration: Beats) -> Vec<String> {
    let mut parts = Vec::new();
    if duration <= Beats::from_integer(0) {
        return parts;
    }
    let mut remaining = if is_binary(duration) { duration } else { duration.trunc() };
    let scaled = duration - remaining;
    for &(numer, denom, name) in &DURATION_TABLE {
        let value = Beats::new(numer, denom);
        while remaining >= value {
            parts.push(name.to_string());
            remaining -= value;
        }
    }
    let leftover = remaining + scaled;
    if leftover > Beats::from_integer(0) {
        parts.push(format!("4*{}/{}", leftover.numer(), leftover.denom()));
    }
    parts
}

/// Split a duration at barlines. A note starting at `start` that crosses one
/// or more barlines comes back as pieces that each fit within a bar.
pub fn split_at_barlines(start: Beats, duration: Beats, bar: Beats) -> Vec<Beats> {
    let mut fragments = Vec::new();
    let mut remaining = duration;
    let mut pos = start;

    while remaining > Beats::from_integer(0) {
        let bar_end = ((pos / bar).floor() + 1) * bar;
        let frag = remaining.min(bar_end - pos);
        fragments.push(frag);
        remaining -= frag;
        pos += frag;
    }
    fragments
}

/// LilyPond identifiers are letters only: `alto_saxophone` -> `altoSaxophone`.
fn ly_variable(instrument: Instrument) -> String {
    let mut out = String::new();
    for (i, word) in instrument.name().split('_').enumerate() {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.push(first);
            } else {
                out.extend(first.to_uppercase());
            }
            out.extend(chars);
        }
    }
    out
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `\tempo` argument. A referent with no plain or dotted note value is
/// restated as quarters per minute.
fn tempo_mark(referent: Beats, bpm: u32) -> String {
    if let Some(&(_, _, name)) = DURATION_TABLE
        .iter()
        .find(|&&(n, d, _)| Beats::new(n, d) == referent)
    {
        return format!("{} = {}", name, bpm);
    }
    let quarters = (beats_to_f64(referent) * bpm as f64).round() as u32;
    warn!(
        "lilypond: tempo referent {} has no note value, writing {} bpm as 4 = {}",
        referent, bpm, quarters
    );
    format!("4 = {}", quarters)
}

/// Render one part's music, padded with rests to `total` beats.
fn render_part_music(part: &Part, bar: Beats, total: Beats) -> String {
    let mut events: Vec<(Sound, Beats, Beats)> = part
        .events()
        .map(|e| (e.note.sound.clone(), e.start, e.note.duration))
        .collect();
    let end = part.duration();
    if end < total {
        events.push((Sound::Rest, end, total - end));
    }

    let mut out = String::new();
    for (sound, start, duration) in &events {
        let name = ly_sound(sound);
        let fragments = split_at_barlines(*start, *duration, bar);
        let mut pos = *start;
        for (i, frag) in fragments.iter().enumerate() {
            let parts = decompose_duration(*frag);
            for (j, dur_str) in parts.iter().enumerate() {
                if !out.is_empty() {
                    out.push(' ');
                }
                let _ = write!(out, "{}{}", name, dur_str);
                // Tie if there are more parts in this fragment or more fragments
                let more = j + 1 < parts.len() || i + 1 < fragments.len();
                if more && !matches!(sound, Sound::Rest) {
                    out.push('~');
                }
            }
            pos += *frag;
            if (pos / bar).is_integer() {
                out.push_str(" |\n ");
            }
        }
    }
    out.trim_end().to_string()
}

/// Generate a complete LilyPond file for a score.
pub fn score_to_lilypond(score: &Score) -> String {
    let time_signature = score.time_signature.unwrap_or_default();
    let bar = time_signature.bar_beats();
    let total = score.duration();
    let mut ly = String::new();

    ly.push_str("\\version \"2.24.0\"\n\n");

    let _ = write!(
        ly,
        "\\header {{\n  title = \"{}\"\n  composer = \"{}\"\n",
        escape(&score.title),
        escape(&score.composer)
    );
    if let Some(date) = &score.date {
        let _ = writeln!(ly, "  date = \"{}\"", escape(date));
        let _ = writeln!(ly, "  tagline = \"Generated {}\"", escape(date));
    }
    ly.push_str("}\n\n");

    let _ = write!(
        ly,
        "global = {{\n  \\time {} \\tempo {}\n}}\n\n",
        time_signature,
        tempo_mark(score.tempo_referent, score.tempo_bpm)
    );

    for part in score.parts() {
        let music = render_part_music(part, bar, total);
        let _ = write!(
            ly,
            "{} = \\absolute {{\n  \\global\n  {}\n}}\n\n",
            ly_variable(part.instrument),
            music
        );
    }

    ly.push_str("\\score {\n  \\new StaffGroup <<\n");
    for part in score.parts() {
        let instrument = part.instrument;
        let _ = writeln!(
            ly,
            "    \\new Staff = \"{}\" \\with {{ instrumentName = \"{}\" shortInstrumentName = \"{}\" }} {{\n      \\clef {}\n      \\{}\n    }}",
            instrument.display_name(),
            instrument.display_name(),
            instrument.abbreviation(),
            instrument.clef().lilypond_name(),
            ly_variable(instrument)
        );
    }
    ly.push_str("  >>\n");
    ly.push_str("  \\layout { }\n");
    ly.push_str("  \\midi { }\n");
    ly.push_str("}\n");

    ly
}
