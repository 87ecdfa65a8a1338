// Scale-filtered random walk, one part at a time.
//
// A plan of drifting major scales is drawn up front, one per section. Each
// pitched part then walks from the middle of its range: a coin flip decides
// rest or note, notes step at most `max_step` semitones (never repeating the
// previous pitch) and must sit in the section's scale. Lengths are whole
// sixteenths. A part keeps going while its length is at most `total_beats`,
// so every part ends just past that mark.

use crate::config::RandomWalkParams;
use crate::error::MusicError;
use crate::generators::positive_beats;
use crate::instrument::PitchRange;
use crate::note::{Beats, beats, beats_from_f64};
use crate::scale::{Scale, scale_plan};
use crate::score::Score;
use chamber_prng::SketchRng;
use log::{debug, warn};

/// Widest search before giving up on a note and resting instead.
const OCTAVE: u8 = 12;

pub fn generate(
    score: &mut Score,
    params: &RandomWalkParams,
    rng: &mut SketchRng,
) -> Result<(), MusicError> {
    let total = beats_from_f64(params.total_beats);
    let section = positive_beats(params.section_beats)?;
    let rest_bounds = sixteenth_bounds(params.rest_sixteenths)?;
    let note_bounds = sixteenth_bounds(params.note_sixteenths)?;
    let plan = scale_plan(rng, params.scale_kind, params.sections.max(1), &params.root_changes);

    for part in score.parts_mut() {
        let Some(range) = part.instrument.range() else {
            warn!("random walk: skipping unpitched {}", part.instrument);
            continue;
        };
        let mut previous = range.middle();
        while part.duration() <= total {
            let scale = scale_for(&plan, part.duration(), section);
            if rng.random_bool(params.rest_chance) {
                part.add_rest(sixteenths(rng, rest_bounds))?;
                continue;
            }
            match next_pitch(rng, previous, range, scale, params.max_step) {
                Some(pitch) => {
                    part.add_pitch(pitch, sixteenths(rng, note_bounds))?;
                    previous = pitch;
                }
                None => {
                    warn!(
                        "random walk: {} has no scale tone near {}, resting",
                        part.instrument, previous
                    );
                    part.add_rest(sixteenths(rng, rest_bounds))?;
                }
            }
        }
        debug!(
            "random walk: {} wrote {} events over {} beats",
            part.instrument,
            part.len(),
            part.duration()
        );
    }
    Ok(())
}

/// Scale of the section containing `position`; past the plan the last scale
/// stays active.
fn scale_for(plan: &[Scale], position: Beats, section: Beats) -> Scale {
    let index = (position / section).floor().to_integer().max(0) as usize;
    plan[index.min(plan.len() - 1)]
}

/// Pick a new pitch within `max_step` of `previous`, in range and in scale.
/// If nothing qualifies the search widens to an octave before giving up.
fn next_pitch(
    rng: &mut SketchRng,
    previous: u8,
    range: PitchRange,
    scale: Scale,
    max_step: u8,
) -> Option<u8> {
    for reach in [max_step, max_step.max(OCTAVE)] {
        let options: Vec<u8> = range
            .iter()
            .filter(|&p| p != previous && p.abs_diff(previous) <= reach && scale.contains(p))
            .collect();
        if let Some(&pitch) = rng.choose(&options) {
            return Some(pitch);
        }
    }
    None
}

fn sixteenth_bounds((low, high): (i32, i32)) -> Result<(i32, i32), MusicError> {
    if low < 1 || low > high {
        return Err(MusicError::InvalidDuration(beats(low as i64, 4)));
    }
    Ok((low, high))
}

fn sixteenths(rng: &mut SketchRng, (low, high): (i32, i32)) -> Beats {
    beats(rng.range_i32(low, high) as i64, 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Instrument;
    use crate::scale::ScaleKind;

    fn walk(seed: u64, params: &RandomWalkParams) -> Score {
        let mut score = Score::ensemble("Full Movie");
        generate(&mut score, params, &mut SketchRng::new(seed)).unwrap();
        score
    }

    #[test]
    fn test_every_part_runs_past_total() {
        let params = RandomWalkParams::default();
        let score = walk(1, &params);
        let total = Beats::from_integer(64);
        for part in score.parts() {
            assert!(part.duration() > total, "{} stopped at {}", part.instrument, part.duration());
            // The last event starts at or before the 64-beat mark.
            let last = part.events().last().unwrap();
            assert!(last.start <= total);
        }
    }

    #[test]
    fn test_durations_are_whole_sixteenths() {
        let score = walk(2, &RandomWalkParams::default());
        for note in score.parts().iter().flat_map(|p| p.notes()) {
            let sixteenths = note.duration * 4;
            assert!(sixteenths.is_integer());
            if note.is_rest() {
                assert!(sixteenths >= Beats::from_integer(1) && sixteenths <= Beats::from_integer(16));
            } else {
                assert!(sixteenths >= Beats::from_integer(1) && sixteenths <= Beats::from_integer(8));
            }
        }
    }

    #[test]
    fn test_steps_are_small_and_never_repeat() {
        let score = walk(3, &RandomWalkParams::default());
        for part in score.parts() {
            let range = part.instrument.range().unwrap();
            let mut previous = range.middle();
            for pitch in part.notes().iter().filter_map(|n| n.top_pitch()) {
                let step = pitch.abs_diff(previous);
                assert!((1..=3).contains(&step), "{}: {previous} -> {pitch}", part.instrument);
                assert!(range.contains(pitch));
                previous = pitch;
            }
        }
    }

    #[test]
    fn test_pitches_follow_the_section_scale() {
        let params = RandomWalkParams::default();
        let mut rng = SketchRng::new(4);
        let mut score = Score::ensemble("Full Movie");
        generate(&mut score, &params, &mut rng).unwrap();

        // Replay the plan the generator drew first from the same seed.
        let plan = scale_plan(&mut SketchRng::new(4), ScaleKind::Major, 8, &[-1, 1, 6]);
        let section = Beats::from_integer(16);
        for part in score.parts() {
            for event in part.events() {
                if let Some(pitch) = event.note.top_pitch() {
                    assert!(scale_for(&plan, event.start, section).contains(pitch));
                }
            }
        }
    }

    #[test]
    fn test_no_rests_when_rest_chance_is_zero() {
        let params = RandomWalkParams { rest_chance: 0.0, ..RandomWalkParams::default() };
        let score = walk(5, &params);
        assert_eq!(score.stats().rests, 0);
    }

    #[test]
    fn test_unpitched_parts_are_skipped() {
        let mut score = Score::new("x", &[Instrument::Percussion, Instrument::Bass], 160);
        generate(&mut score, &RandomWalkParams::default(), &mut SketchRng::new(6)).unwrap();
        assert!(score.part(Instrument::Percussion).unwrap().is_empty());
        assert!(!score.part(Instrument::Bass).unwrap().is_empty());
    }

    #[test]
    fn test_widens_when_scale_has_no_near_neighbour() {
        // C pentatonic has no tone a semitone from E.
        let mut rng = SketchRng::new(7);
        let pitch = next_pitch(&mut rng, 64, PitchRange::new(60, 72), Scale::major_pentatonic(0), 1);
        assert!(matches!(pitch, Some(p) if p != 64 && Scale::major_pentatonic(0).contains(p)));
        assert_eq!(next_pitch(&mut rng, 60, PitchRange::new(60, 60), Scale::major(0), 3), None);
    }

    #[test]
    fn test_bad_bounds_are_errors() {
        let params = RandomWalkParams { note_sixteenths: (4, 2), ..RandomWalkParams::default() };
        let mut score = Score::ensemble("x");
        assert!(matches!(
            generate(&mut score, &params, &mut SketchRng::new(8)),
            Err(MusicError::InvalidDuration(_))
        ));
        let params = RandomWalkParams { section_beats: 0.0, ..RandomWalkParams::default() };
        assert!(generate(&mut score, &params, &mut SketchRng::new(8)).is_err());
    }
}
