// Plain-text rendering: the score summary plus event counts.

use crate::error::MusicError;
use crate::render::Renderer;
use crate::score::Score;

pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn render(&self, score: &Score) -> Result<Vec<u8>, MusicError> {
        let stats = score.stats();
        let mut text = score.summary();
        text.push_str(&format!(
            "{} notes, {} chords, {} rests\n",
            stats.notes, stats.chords, stats.rests
        ));
        Ok(text.into_bytes())
    }

    fn extension(&self) -> &'static str {
        "txt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Instrument;
    use crate::note::whole_beats;

    #[test]
    fn test_text_contains_summary_and_counts() {
        let mut score = Score::new("Solo", &[Instrument::Trumpet], 90);
        let part = score.part_mut(Instrument::Trumpet).unwrap();
        part.add_pitch(60, whole_beats(1)).unwrap();
        part.add_rest(whole_beats(1)).unwrap();

        let text = String::from_utf8(TextRenderer.render(&score).unwrap()).unwrap();
        assert!(text.starts_with("Solo (Jonathan Marmor), 90 bpm, 2 beats"), "{text}");
        assert!(text.contains("Trumpet: C4:1 r:1"), "{text}");
        assert!(text.ends_with("1 notes, 0 chords, 1 rests\n"), "{text}");
    }
}
