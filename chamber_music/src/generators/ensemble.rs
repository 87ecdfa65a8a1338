// Harmony-aware phrasing across the whole ensemble.
//
// Time advances on a fixed grid of `step_beats`. At each grid point every
// pitched part whose previous event has ended makes one decision:
//
// 1. Breathe? The rest chance grows with the length of the current phrase:
//    `base_rest_chance + rest_pressure * beats_since_last_rest / phrase_beats`,
//    capped at `max_rest_chance`. Rests take a weighted length.
// 2. Otherwise pick a pitch by weighted random walk over the part's register
//    in the active scale. Each candidate weighs
//    `1 / (1 + |interval|)^leap_falloff` times the harmony-table weight of
//    the chord it would form with everything already sounding, so
//    candidates that produce a disallowed set are never chosen. If every
//    weight is zero the part rests for one grid step and tries again.
//
// A part that would breathe while the others sound a disallowed set plays
// on instead when some candidate completes an allowed chord. Sets that no
// single added pitch can repair (a bare major seventh, say) stay as they
// are until the next decision.
//
// Parts decide in score order, so later parts hear the choices earlier ones
// just made at the same grid point. All lengths are rounded up to the grid
// so every part keeps landing on grid points.

use crate::config::{EnsembleParams, RegisterChoice, WeightedDuration};
use crate::error::MusicError;
use crate::generators::positive_beats;
use crate::harmony::HarmonyTable;
use crate::instrument::Instrument;
use crate::note::{Beats, beats_from_f64, beats_to_f64};
use crate::part::Part;
use crate::scale::{Scale, scale_plan};
use crate::score::Score;
use chamber_prng::SketchRng;
use log::{debug, warn};

pub fn generate(
    score: &mut Score,
    params: &EnsembleParams,
    harmony: &HarmonyTable,
    rng: &mut SketchRng,
) -> Result<(), MusicError> {
    let step = positive_beats(params.step_beats)?;
    let section = positive_beats(params.section_beats)?;
    let total = beats_from_f64(params.total_beats);
    let lengths = Lengths {
        step,
        rests: grid_choices(&params.rest_lengths, step)?,
        notes: grid_choices(&params.durations, step)?,
    };
    let sections = (total / section).ceil().to_integer().max(1) as usize;
    let plan = scale_plan(rng, params.scale_kind, sections, &params.root_changes);

    let mut voices = Vec::new();
    for instrument in score.instruments() {
        match register(instrument, params.register) {
            Some(pitches) if !pitches.is_empty() => voices.push((instrument, pitches)),
            _ => warn!("ensemble: {} has no register to play in, skipping", instrument),
        }
    }

    let mut now = Beats::from_integer(0);
    while now < total {
        let index = ((now / section).floor().to_integer() as usize).min(plan.len() - 1);
        let scale = plan[index];
        for (instrument, register) in &voices {
            if score.part(*instrument)?.duration() > now {
                continue;
            }
            let sounding = score.sounding_pitches_at(now);
            let part = score.part_mut(*instrument)?;

            decide(rng, params, harmony, &lengths, part, register, scale, &sounding)?;
        }
        now += step;
    }
    Ok(())
}

/// Grid-rounded length choices with their weights.
struct Lengths {
    step: Beats,
    rests: Vec<(Beats, f64)>,
    notes: Vec<(Beats, f64)>,
}

/// One part's move at a grid point, given what the other parts sound there.
#[allow(clippy::too_many_arguments)]
fn decide(
    rng: &mut SketchRng,
    params: &EnsembleParams,
    harmony: &HarmonyTable,
    lengths: &Lengths,
    part: &mut Part,
    register: &[u8],
    scale: Scale,
    sounding: &[u8],
) -> Result<(), MusicError> {
    let phrase = beats_to_f64(part.beats_since_last_rest());
    let wants_rest = rng.random_bool(rest_chance(params, phrase));
    if wants_rest && harmony.is_allowed(sounding) {
        return part.add_rest(pick_duration(rng, &lengths.rests, lengths.step));
    }

    let previous = part.last_pitched_note().and_then(|n| n.top_pitch());
    match choose_pitch(rng, params, harmony, register, scale, previous, sounding) {
        Some(pitch) => {
            if wants_rest {
                debug!("ensemble: {} plays on to repair {:?}", part.instrument, sounding);
            }
            part.add_pitch(pitch, pick_duration(rng, &lengths.notes, lengths.step))
        }
        None if wants_rest => part.add_rest(pick_duration(rng, &lengths.rests, lengths.step)),
        None => {
            debug!("ensemble: {} found no allowed pitch, resting", part.instrument);
            part.add_rest(lengths.step)
        }
    }
}

/// Chance to rest after `phrase` beats of unbroken playing.
fn rest_chance(params: &EnsembleParams, phrase: f64) -> f64 {
    let phrase_beats = if params.phrase_beats > 0.0 { params.phrase_beats } else { 1.0 };
    (params.base_rest_chance + params.rest_pressure * phrase / phrase_beats)
        .min(params.max_rest_chance)
}

fn register(instrument: Instrument, choice: RegisterChoice) -> Option<Vec<u8>> {
    let range = instrument.range()?;
    match choice {
        RegisterChoice::Full => Some(range.iter().collect()),
        RegisterChoice::Safe => instrument.registers().map(|r| r.safe),
        RegisterChoice::VerySafe => instrument.registers().map(|r| r.very_safe),
    }
}

fn choose_pitch(
    rng: &mut SketchRng,
    params: &EnsembleParams,
    harmony: &HarmonyTable,
    register: &[u8],
    scale: Scale,
    previous: Option<u8>,
    sounding: &[u8],
) -> Option<u8> {
    let anchor = previous.unwrap_or(register[register.len() / 2]);
    let candidates: Vec<u8> = register
        .iter()
        .copied()
        .filter(|&p| scale.contains(p) && p.abs_diff(anchor) <= params.max_leap)
        .filter(|&p| previous != Some(p))
        .collect();

    let mut chord = sounding.to_vec();
    let weights: Vec<f64> = candidates
        .iter()
        .map(|&p| {
            chord.push(p);
            let harmonic = harmony.weight(&chord);
            chord.pop();
            let interval = p.abs_diff(anchor) as f64;
            harmonic / (1.0 + interval).powf(params.leap_falloff)
        })
        .collect();
    rng.choose_weighted(&candidates, &weights).copied()
}

/// Config durations rounded up to whole grid steps, with their weights.
fn grid_choices(
    choices: &[WeightedDuration],
    step: Beats,
) -> Result<Vec<(Beats, f64)>, MusicError> {
    choices
        .iter()
        .map(|c| positive_beats(c.beats).map(|d| (to_grid(d, step), c.weight)))
        .collect()
}

fn to_grid(duration: Beats, step: Beats) -> Beats {
    (duration / step).ceil() * step
}

fn pick_duration(rng: &mut SketchRng, choices: &[(Beats, f64)], step: Beats) -> Beats {
    let lengths: Vec<Beats> = choices.iter().map(|c| c.0).collect();
    let weights: Vec<f64> = choices.iter().map(|c| c.1).collect();
    rng.choose_weighted(&lengths, &weights).copied().unwrap_or(step)
}
