use crate::error::{ErrorKind, ParseError};
use crate::model::note::MAX_MIDI;
use std::fmt;

pub const MIN_OCTAVE: i32 = -2;
pub const MAX_OCTAVE: i32 = 8;

// Octave numbering puts middle C (60) at C3.
const OCTAVE_OFFSET: i32 = 2;

/// Canonical spelling per pitch class. Black keys are written as flats.
pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// A pitch as written in notation: a concrete MIDI note, or the `*` placeholder
/// used when listing drum pads that have no note assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchToken {
    Note(u8),
    Wildcard,
}

impl fmt::Display for PitchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PitchToken::Note(midi) => match pitch_name(*midi) {
                Some(name) => f.write_str(&name),
                None => write!(f, "<{}>", midi),
            },
            PitchToken::Wildcard => f.write_str("*"),
        }
    }
}

fn letter_class(letter: char) -> Option<i32> {
    match letter.to_ascii_uppercase() {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

/// True when `text` has the shape `{A-G}[#|b]{signed integer}`. Range checks are
/// left to [`parse_pitch_token`].
pub fn looks_like_pitch(text: &str) -> bool {
    if text == "*" {
        return true;
    }

    let mut chars = text.chars();
    let Some(letter) = chars.next() else {
        return false;
    };
    if letter_class(letter).is_none() {
        return false;
    }

    let rest = chars.as_str();
    let rest = rest
        .strip_prefix('#')
        .or_else(|| rest.strip_prefix('b'))
        .unwrap_or(rest);
    let digits = rest.strip_prefix('-').or_else(|| rest.strip_prefix('+')).unwrap_or(rest);

    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Parses a pitch name or `*`.
pub fn parse_pitch_token(text: &str) -> Result<PitchToken, ParseError> {
    if text == "*" {
        return Ok(PitchToken::Wildcard);
    }

    let unresolved = |why: String| ParseError::at(ErrorKind::UnresolvedPitch, text, why);

    let mut chars = text.chars();
    let letter = chars
        .next()
        .ok_or_else(|| unresolved("empty pitch name".into()))?;
    let class = letter_class(letter)
        .ok_or_else(|| unresolved(format!("'{}' is not a note letter (A-G)", letter)))?;

    let rest = chars.as_str();
    let (accidental, octave_text) = if let Some(r) = rest.strip_prefix('#') {
        (1, r)
    } else if let Some(r) = rest.strip_prefix('b') {
        (-1, r)
    } else {
        (0, rest)
    };

    let octave_digits = octave_text
        .strip_prefix('-')
        .or_else(|| octave_text.strip_prefix('+'))
        .unwrap_or(octave_text);
    if octave_digits.is_empty()
        || octave_digits.len() > 3
        || !octave_digits.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(unresolved(format!("'{}' is not an octave number", octave_text)));
    }

    let octave: i32 = octave_text
        .parse()
        .map_err(|_| unresolved(format!("'{}' is not an octave number", octave_text)))?;
    if !(MIN_OCTAVE..=MAX_OCTAVE).contains(&octave) {
        return Err(unresolved(format!(
            "octave {} is outside {}..{}",
            octave, MIN_OCTAVE, MAX_OCTAVE
        )));
    }

    let midi = (octave + OCTAVE_OFFSET) * 12 + class + accidental;
    if !(0..=MAX_MIDI as i32).contains(&midi) {
        return Err(unresolved(format!("MIDI note {} is outside 0..127", midi)));
    }

    Ok(PitchToken::Note(midi as u8))
}

/// Resolves a note name to its MIDI number. `*` does not name a note and is refused.
pub fn resolve_pitch(text: &str) -> Result<u8, ParseError> {
    match parse_pitch_token(text)? {
        PitchToken::Note(midi) => Ok(midi),
        PitchToken::Wildcard => Err(ParseError::at(
            ErrorKind::UnresolvedPitch,
            text,
            "'*' only marks unassigned drum pads and cannot be written as a note",
        )),
    }
}

/// Canonical name for a MIDI note, e.g. `60 -> "C3"`.
pub fn pitch_name(midi: u8) -> Option<String> {
    if midi > MAX_MIDI {
        return None;
    }

    let class = PITCH_CLASS_NAMES[(midi % 12) as usize];
    let octave = (midi / 12) as i32 - OCTAVE_OFFSET;
    Some(format!("{}{}", class, octave))
}

/// Human readable label for logs, e.g. `"C3 (60)"`.
pub fn midi_label(midi: u8) -> String {
    match pitch_name(midi) {
        Some(name) => format!("{} ({})", name, midi),
        None => format!("<out of range> ({})", midi),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reference_points() {
        assert_eq!(resolve_pitch("C3").unwrap(), 60);
        assert_eq!(resolve_pitch("C1").unwrap(), 36);
        assert_eq!(resolve_pitch("D1").unwrap(), 38);
        assert_eq!(resolve_pitch("C-2").unwrap(), 0);
        assert_eq!(resolve_pitch("G8").unwrap(), 127);
        assert_eq!(resolve_pitch("C4").unwrap(), 72);
    }

    #[test]
    fn accidentals_and_case() {
        assert_eq!(resolve_pitch("Gb1").unwrap(), 42);
        assert_eq!(resolve_pitch("F#1").unwrap(), 42);
        assert_eq!(resolve_pitch("bb2").unwrap(), 58);
        assert_eq!(resolve_pitch("Cb3").unwrap(), 59);
        assert_eq!(resolve_pitch("B#3").unwrap(), 72);
        assert_eq!(resolve_pitch("e+3").unwrap(), 64);
    }

    #[test]
    fn names_round_trip() {
        for octave in MIN_OCTAVE..=MAX_OCTAVE {
            for class in PITCH_CLASS_NAMES {
                let name = format!("{}{}", class, octave);
                let Ok(midi) = resolve_pitch(&name) else {
                    // only the top of octave 8 falls off the MIDI range
                    assert_eq!(octave, MAX_OCTAVE);
                    continue;
                };
                assert_eq!(pitch_name(midi).as_deref(), Some(name.as_str()));
            }
        }

        for midi in 0..=MAX_MIDI {
            let name = pitch_name(midi).unwrap();
            assert_eq!(resolve_pitch(&name).unwrap(), midi);
        }
    }

    #[test]
    fn unresolved_pitches() {
        for bad in ["H3", "C9", "C-3", "Cb-2", "G#8", "C", "C#", "Cx3", "C3.5"] {
            let err = resolve_pitch(bad).unwrap_err();
            assert_eq!(err.kind, ErrorKind::UnresolvedPitch, "{}", bad);
            assert_eq!(err.token.as_deref(), Some(bad));
        }
    }

    #[test]
    fn wildcard_only_on_read_side() {
        assert_eq!(parse_pitch_token("*").unwrap(), PitchToken::Wildcard);
        assert_eq!(PitchToken::Wildcard.to_string(), "*");
        assert_eq!(PitchToken::Note(36).to_string(), "C1");
        assert_eq!(resolve_pitch("*").unwrap_err().kind, ErrorKind::UnresolvedPitch);
    }

    #[test]
    fn pitch_shapes() {
        assert!(looks_like_pitch("C3"));
        assert!(looks_like_pitch("Db-1"));
        assert!(looks_like_pitch("C9"));
        assert!(looks_like_pitch("*"));
        assert!(!looks_like_pitch("H3"));
        assert!(!looks_like_pitch("C"));
        assert!(!looks_like_pitch("C#x"));
        assert_eq!(midi_label(60), "C3 (60)");
    }
}
