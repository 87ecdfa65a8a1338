// Pentatonic rounds.
//
// In every round each playing part appends one event: a rest, or a pitch
// from the scale that stays close to the part's previous note. Parts are
// independent, so their lengths drift apart round by round and the texture
// stays loosely imitative rather than chordal.

use crate::config::PentatonicParams;
use crate::error::MusicError;
use crate::generators::positive_beats;
use crate::instrument::Instrument;
use crate::note::Beats;
use crate::score::Score;
use chamber_prng::SketchRng;
use log::{debug, warn};

pub fn generate(
    score: &mut Score,
    params: &PentatonicParams,
    rng: &mut SketchRng,
) -> Result<(), MusicError> {
    let durations = params
        .durations
        .iter()
        .map(|&d| positive_beats(d))
        .collect::<Result<Vec<Beats>, _>>()?;
    if durations.is_empty() {
        return Err(MusicError::InvalidDuration(Beats::from_integer(0)));
    }
    let players = players(score, params);

    for round in 0..params.rounds {
        for &instrument in &players {
            let part = score.part_mut(instrument)?;
            let duration = rng.choose(&durations).copied().unwrap_or(durations[0]);
            let pitch = if rng.random_bool(params.note_chance) {
                choose_pitch(rng, params, instrument, part.last_pitch())
            } else {
                None
            };
            match pitch {
                Some(p) => part.add_pitch(p, duration)?,
                None => part.add_rest(duration)?,
            }
        }
        debug!("pentatonic round {} done", round);
    }
    Ok(())
}

/// Configured players, or every part but the last in score order.
fn players(score: &Score, params: &PentatonicParams) -> Vec<Instrument> {
    match &params.players {
        Some(list) => list.clone(),
        None => {
            let mut all = score.instruments();
            all.pop();
            all
        }
    }
}

fn choose_pitch(
    rng: &mut SketchRng,
    params: &PentatonicParams,
    instrument: Instrument,
    previous: Option<u8>,
) -> Option<u8> {
    let Some(range) = instrument.range() else {
        warn!("pentatonic: {} is unpitched, resting", instrument);
        return None;
    };
    let pool = params.scale.pitches_in(range);
    let near: Vec<u8> = match previous {
        Some(prev) => pool.iter().copied().filter(|p| p.abs_diff(prev) < params.proximity).collect(),
        None => pool.clone(),
    };
    if near.is_empty() && !pool.is_empty() {
        warn!("pentatonic: nothing near {:?} for {}, using the whole scale", previous, instrument);
        return rng.choose(&pool).copied();
    }
    rng.choose(&near).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::beats;
    use crate::scale::Scale;

    fn utah(seed: u64, params: &PentatonicParams) -> Score {
        let mut score = Score::new("Utah 2017", &Instrument::PITCHED, 60);
        generate(&mut score, params, &mut SketchRng::new(seed)).unwrap();
        score
    }

    #[test]
    fn test_last_part_sits_out_by_default() {
        let score = utah(1, &PentatonicParams::default());
        assert!(score.part(Instrument::Bass).unwrap().is_empty());
        for instrument in &Instrument::PITCHED[..6] {
            assert_eq!(score.part(*instrument).unwrap().len(), 40, "{instrument}");
        }
    }

    #[test]
    fn test_durations_come_from_the_list() {
        let score = utah(2, &PentatonicParams::default());
        let allowed = [beats(1, 2), beats(1, 1), beats(3, 2), beats(2, 1)];
        for note in score.parts().iter().flat_map(|p| p.notes()) {
            assert!(allowed.contains(&note.duration), "unexpected {}", note.duration);
        }
    }

    #[test]
    fn test_pitches_are_pentatonic_and_close() {
        let score = utah(3, &PentatonicParams::default());
        let scale = Scale::major_pentatonic(0);
        for part in score.parts() {
            let mut previous: Option<u8> = None;
            for note in part.notes() {
                if let Some(pitch) = note.top_pitch() {
                    assert!(scale.contains(pitch));
                    if let Some(prev) = previous {
                        assert!(pitch.abs_diff(prev) < 5, "{}: {prev} -> {pitch}", part.instrument);
                    }
                }
                previous = note.top_pitch();
            }
        }
    }

    #[test]
    fn test_note_chance_controls_rests() {
        let all_rests = PentatonicParams { note_chance: 0.0, ..PentatonicParams::default() };
        let score = utah(4, &all_rests);
        assert_eq!(score.stats().notes, 0);
        assert_eq!(score.stats().rests, 6 * 40);

        let no_rests = PentatonicParams { note_chance: 1.0, ..PentatonicParams::default() };
        assert_eq!(utah(4, &no_rests).stats().rests, 0);
    }

    #[test]
    fn test_explicit_players() {
        let params = PentatonicParams {
            players: Some(vec![Instrument::Bass]),
            rounds: 5,
            ..PentatonicParams::default()
        };
        let score = utah(5, &params);
        assert_eq!(score.part(Instrument::Bass).unwrap().len(), 5);
        assert!(score.part(Instrument::Violin).unwrap().is_empty());
    }

    #[test]
    fn test_falls_back_to_whole_scale() {
        let params = PentatonicParams { proximity: 0, ..PentatonicParams::default() };
        let mut rng = SketchRng::new(6);
        let pitch = choose_pitch(&mut rng, &params, Instrument::Oboe, Some(72));
        assert!(pitch.is_some_and(|p| Scale::major_pentatonic(0).contains(p)));
        assert_eq!(choose_pitch(&mut rng, &params, Instrument::Percussion, None), None);
    }

    #[test]
    fn test_empty_durations_are_an_error() {
        let params = PentatonicParams { durations: Vec::new(), ..PentatonicParams::default() };
        let mut score = Score::ensemble("x");
        assert!(generate(&mut score, &params, &mut SketchRng::new(7)).is_err());
    }
}
