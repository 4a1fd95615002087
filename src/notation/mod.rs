//! The bar|beat note notation: `v`/`t`/`p` modifiers, note names and `bar|beat` positions.
//!
//! ```text
//! v100 t0.25 C1 Gb1 1|1  p0.6 Gb1 1|1.5  D1 Gb1 1|2
//! ```

mod builder;
mod formatter;
mod tokenizer;

pub use builder::{NoteSettings, ParserState, PendingPitch, build, step};
pub use formatter::{format_drafts, format_notes, notes_to_drafts};
pub use tokenizer::{Token, TokenKind, Tokens, tokenize, tokens};

use crate::error::ParseError;
use crate::model::note::{DraftNote, NoteEvent, TimeSignature};
use crate::position::to_absolute_beats;
use log::debug;

/// Parses notation into drafts that still carry bar|beat positions.
pub fn parse_drafts(notation: &str) -> Result<Vec<DraftNote>, ParseError> {
    let tokens = tokenize(notation)?;
    debug!("Tokenized notation into {} token(s)", tokens.len());
    build(&tokens)
}

/// Places drafts on the absolute beat grid of `ts`.
pub fn resolve_drafts(
    drafts: &[DraftNote],
    ts: TimeSignature,
) -> Result<Vec<NoteEvent>, ParseError> {
    drafts
        .iter()
        .map(|draft| {
            Ok(NoteEvent {
                pitch: draft.pitch,
                start_time: to_absolute_beats(draft.position, ts)?,
                duration: draft.duration,
                velocity: draft.velocity,
                probability: draft.probability,
                velocity_deviation: draft.velocity_deviation,
            })
        })
        .collect()
}

/// Compiles notation into clip notes. The time signature is checked before any
/// token is read, and nothing is returned unless the whole string is valid.
pub fn compile(notation: &str, ts: TimeSignature) -> Result<Vec<NoteEvent>, ParseError> {
    ts.validate()?;
    let drafts = parse_drafts(notation)?;
    let notes = resolve_drafts(&drafts, ts)?;
    debug!("Compiled {} note(s) in {}", notes.len(), ts);
    Ok(notes)
}
