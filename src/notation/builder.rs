use crate::error::{ErrorKind, ParseError};
use crate::model::note::{
    BarBeatPosition, DEFAULT_DURATION, DEFAULT_PROBABILITY, DEFAULT_VELOCITY, DraftNote, MAX_MIDI,
};
use crate::notation::tokenizer::{Token, TokenKind};
use crate::pitch::{midi_label, resolve_pitch};
use crate::position::validate_position;
use log::debug;

/// The modifier values a pitch picks up when it is written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteSettings {
    pub velocity: u8,
    pub duration: f64,
    pub probability: f64,
    pub velocity_deviation: u8,
}

impl Default for NoteSettings {
    fn default() -> Self {
        Self {
            velocity: DEFAULT_VELOCITY,
            duration: DEFAULT_DURATION,
            probability: DEFAULT_PROBABILITY,
            velocity_deviation: 0,
        }
    }
}

/// A pitch waiting for the position that anchors it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPitch {
    pub pitch: u8,
    pub text: String,
    pub settings: NoteSettings,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParserState {
    pub settings: NoteSettings,
    pub current_position: Option<BarBeatPosition>,
    pub pending: Vec<PendingPitch>,
}

/// Applies one token to `state`.
///
/// Modifiers replace a setting. Pitches are queued with a copy of the settings
/// in effect when they were read. A position anchors every queued pitch to
/// itself, in the order they were written, and becomes the current position.
pub fn step(
    state: ParserState,
    token: &Token<'_>,
) -> Result<(ParserState, Vec<DraftNote>), ParseError> {
    let ParserState {
        mut settings,
        current_position,
        mut pending,
    } = state;

    match token.kind {
        TokenKind::Velocity(value) => {
            settings.velocity = midi_value(value, token, "velocity")?;
            settings.velocity_deviation = 0;
        }
        TokenKind::VelocityRange(lo, hi) => {
            let lo = midi_value(lo, token, "velocity")?;
            let hi = midi_value(hi, token, "velocity")?;
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            settings.velocity = lo;
            settings.velocity_deviation = hi - lo;
        }
        TokenKind::Duration(value) => {
            if !value.is_finite() || value <= 0.0 {
                return Err(ParseError::at(
                    ErrorKind::OutOfRangeValue,
                    token.text,
                    format!("duration must be greater than 0, got {}", value),
                ));
            }
            settings.duration = value;
        }
        TokenKind::Probability(value) => {
            if !(0.0..=1.0).contains(&value) {
                return Err(ParseError::at(
                    ErrorKind::OutOfRangeValue,
                    token.text,
                    format!("probability must be within 0..1, got {}", value),
                ));
            }
            settings.probability = value;
        }
        TokenKind::Pitch => {
            let pitch = resolve_pitch(token.text)?;
            pending.push(PendingPitch {
                pitch,
                text: token.text.to_string(),
                settings,
            });
        }
        TokenKind::Position { bar, beat } => {
            let position = BarBeatPosition { bar, beat };
            validate_position(position).map_err(|e| ParseError {
                token: Some(token.text.to_string()),
                ..e
            })?;

            let notes: Vec<DraftNote> = pending
                .drain(..)
                .map(|p| DraftNote {
                    pitch: p.pitch,
                    position,
                    duration: p.settings.duration,
                    velocity: p.settings.velocity,
                    probability: p.settings.probability,
                    velocity_deviation: p.settings.velocity_deviation,
                })
                .collect();

            if !notes.is_empty() {
                debug!(
                    "Placed {} at {}",
                    notes
                        .iter()
                        .map(|n| midi_label(n.pitch))
                        .collect::<Vec<_>>()
                        .join(", "),
                    position
                );
            }

            let next = ParserState {
                settings,
                current_position: Some(position),
                pending,
            };
            return Ok((next, notes));
        }
    }

    Ok((
        ParserState {
            settings,
            current_position,
            pending,
        },
        Vec::new(),
    ))
}

/// Folds a token list into draft notes, starting from the default settings.
pub fn build(tokens: &[Token<'_>]) -> Result<Vec<DraftNote>, ParseError> {
    let mut state = ParserState::default();
    let mut notes = Vec::new();

    for token in tokens {
        let (next, emitted) = step(state, token)?;
        notes.extend(emitted);
        state = next;
    }

    if let Some(dangling) = state.pending.first() {
        let context = match state.current_position {
            Some(pos) => format!("after {}", pos),
            None => "before any position".to_string(),
        };
        return Err(ParseError::at(
            ErrorKind::PitchBeforePosition,
            &dangling.text,
            format!(
                "pitch '{}' {} is never followed by a bar|beat position",
                dangling.text, context
            ),
        ));
    }

    Ok(notes)
}

fn midi_value(value: f64, token: &Token<'_>, what: &str) -> Result<u8, ParseError> {
    let rounded = value.round();
    if !(0.0..=MAX_MIDI as f64).contains(&rounded) {
        return Err(ParseError::at(
            ErrorKind::OutOfRangeValue,
            token.text,
            format!("{} must be within 0..{}, got {}", what, MAX_MIDI, value),
        ));
    }
    Ok(rounded as u8)
}
