// Chromatic voice-leading drift for a small group of winds.
//
// Every voice starts on its configured pitch, moved to the nearest edge of
// its bounds when it lies outside them. Each step exactly one voice
// moves, usually by a semitone and occasionally by a whole tone, while the
// others hold (their last note is extended). A move that would leave the
// voice's bounds goes the other way instead. Bounds are the instrument's
// range, narrowed by the optional shared register.
//
// With `require_allowed_harmony` the step draws up to `harmony_attempts`
// candidate moves and keeps the first whose resulting chord is in the
// harmony table; if none is, the first candidate is taken anyway so the
// piece never stalls.

use crate::config::DriftParams;
use crate::error::MusicError;
use crate::generators::positive_beats;
use crate::harmony::{HarmonyTable, intervals_between};
use crate::instrument::PitchRange;
use crate::note::pitch_name;
use crate::score::Score;
use chamber_prng::SketchRng;
use log::{debug, warn};

/// Any MIDI pitch; bounds for voices without a range.
const FULL_RANGE: PitchRange = PitchRange { low: 0, high: 127 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Move {
    voice: usize,
    pitch: u8,
}

pub fn generate(
    score: &mut Score,
    params: &DriftParams,
    harmony: &HarmonyTable,
    rng: &mut SketchRng,
) -> Result<(), MusicError> {
    if params.voices.is_empty() {
        warn!("drift: no voices configured");
        return Ok(());
    }
    let step = positive_beats(params.step_beats)?;
    for (index, voice) in params.voices.iter().enumerate() {
        if params.voices[..index].iter().any(|v| v.instrument == voice.instrument) {
            return Err(MusicError::DuplicateVoice(voice.instrument));
        }
    }

    let mut bounds = Vec::with_capacity(params.voices.len());
    let mut current = Vec::with_capacity(params.voices.len());
    for voice in &params.voices {
        let range = voice.instrument.range().unwrap_or(FULL_RANGE);
        let bound = match params.register {
            Some(register) => range.intersect(&register).unwrap_or_else(|| {
                warn!("drift: register misses the {} range, using the full range", voice.instrument);
                range
            }),
            None => range,
        };
        let start = voice.start_pitch.clamp(bound.low, bound.high);
        if start != voice.start_pitch {
            warn!(
                "drift: {} start pitch {} is outside {}-{}, starting on {}",
                voice.instrument, voice.start_pitch, bound.low, bound.high, start
            );
        }
        score.part_mut(voice.instrument)?.add_pitch(start, step)?;
        bounds.push(bound);
        current.push(start);
    }

    for n in 0..params.steps {
        let chosen = choose_move(rng, params, harmony, &current, &bounds);
        current[chosen.voice] = chosen.pitch;
        for (index, voice) in params.voices.iter().enumerate() {
            let part = score.part_mut(voice.instrument)?;
            if index == chosen.voice {
                part.add_pitch(chosen.pitch, step)?;
            } else {
                part.extend_last(step)?;
            }
        }
        debug!(
            "drift step {}: {} moves, chord {:?} intervals {:?}",
            n,
            params.voices[chosen.voice].instrument,
            current.iter().map(|&p| pitch_name(p)).collect::<Vec<_>>(),
            intervals_between(&current)
        );
    }
    Ok(())
}

fn choose_move(
    rng: &mut SketchRng,
    params: &DriftParams,
    harmony: &HarmonyTable,
    current: &[u8],
    bounds: &[PitchRange],
) -> Move {
    let first = random_move(rng, params.leap_chance, current, bounds);
    if !params.require_allowed_harmony || allows(harmony, current, first) {
        return first;
    }
    for _ in 1..params.harmony_attempts {
        let candidate = random_move(rng, params.leap_chance, current, bounds);
        if allows(harmony, current, candidate) {
            return candidate;
        }
    }
    warn!(
        "drift: no allowed chord in {} attempts, moving anyway",
        params.harmony_attempts.max(1)
    );
    first
}

fn allows(harmony: &HarmonyTable, current: &[u8], candidate: Move) -> bool {
    let mut chord = current.to_vec();
    chord[candidate.voice] = candidate.pitch;
    harmony.is_allowed(&chord)
}

fn random_move(rng: &mut SketchRng, leap_chance: f64, current: &[u8], bounds: &[PitchRange]) -> Move {
    let voice = rng.range_usize(0, current.len());
    let size = if rng.random_bool(leap_chance) { 2 } else { 1 };
    let delta = if rng.random_bool(0.5) { size } else { -size };
    Move { voice, pitch: reflect(current[voice], delta, bounds[voice]) }
}

/// Move `pitch` by `delta`, turning around at the edge of `bound`.
fn reflect(pitch: u8, delta: i32, bound: PitchRange) -> u8 {
    let (low, high) = (bound.low as i32, bound.high as i32);
    let forward = pitch as i32 + delta;
    let target = if (low..=high).contains(&forward) { forward } else { pitch as i32 - delta };
    target.clamp(low, high) as u8
}
