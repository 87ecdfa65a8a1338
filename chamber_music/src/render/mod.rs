// The renderer boundary: everything after generation.
//
// A renderer turns a finished `Score` into the bytes of one file format.
// Generators never know which format will be written; the binary picks a
// `Format`, renders, writes the bytes and optionally hands the file to an
// external viewer (a notation program or MIDI player) with `show`.
//
// - lilypond.rs: `.ly` engraving source, the main notation target.
// - midi.rs: Standard MIDI File export via midly.
// - text.rs: the score summary as plain text, for terminals and logs.

pub mod lilypond;
pub mod midi;
pub mod text;

use crate::error::MusicError;
use crate::score::Score;
use log::info;
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;

pub use lilypond::LilyPondRenderer;
pub use midi::MidiRenderer;
pub use text::TextRenderer;

pub trait Renderer {
    fn render(&self, score: &Score) -> Result<Vec<u8>, MusicError>;

    /// File extension without the dot.
    fn extension(&self) -> &'static str;

    fn write(&self, score: &Score, path: &Path) -> Result<(), MusicError> {
        let bytes = self.render(score)?;
        std::fs::write(path, &bytes)?;
        info!("wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    LilyPond,
    Midi,
    Text,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::LilyPond, Format::Midi, Format::Text];

    pub fn renderer(self) -> Box<dyn Renderer> {
        match self {
            Format::LilyPond => Box::new(LilyPondRenderer),
            Format::Midi => Box::new(MidiRenderer),
            Format::Text => Box::new(TextRenderer),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::LilyPond => "ly",
            Format::Midi => "midi",
            Format::Text => "text",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ly" | "lilypond" => Ok(Format::LilyPond),
            "midi" | "mid" => Ok(Format::Midi),
            "text" | "txt" => Ok(Format::Text),
            other => Err(format!("unknown format '{other}' (expected ly, midi or text)")),
        }
    }
}

/// Open a rendered file in an external program and wait for it to exit.
pub fn show(path: &Path, viewer: &str) -> Result<(), MusicError> {
    info!("opening {} with {}", path.display(), viewer);
    let status = Command::new(viewer)
        .arg(path)
        .status()
        .map_err(|e| MusicError::Viewer(format!("{viewer}: {e}")))?;
    if !status.success() {
        return Err(MusicError::Viewer(format!("{viewer} exited with {status}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names_parse() {
        for format in Format::ALL {
            assert_eq!(format.name().parse::<Format>().unwrap(), format);
        }
        assert_eq!("LilyPond".parse::<Format>().unwrap(), Format::LilyPond);
        assert_eq!("mid".parse::<Format>().unwrap(), Format::Midi);
        assert!("pdf".parse::<Format>().is_err());
    }

    #[test]
    fn test_extensions() {
        assert_eq!(Format::LilyPond.renderer().extension(), "ly");
        assert_eq!(Format::Midi.renderer().extension(), "mid");
        assert_eq!(Format::Text.renderer().extension(), "txt");
    }

    #[test]
    fn test_missing_viewer_is_an_error() {
        let result = show(Path::new("score.ly"), "definitely-not-a-real-viewer-binary");
        assert!(matches!(result, Err(MusicError::Viewer(_))));
    }
}
