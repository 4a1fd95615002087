use crate::error::ParseError;
use crate::model::note::{DraftNote, MAX_MIDI, NoteEvent, TimeSignature, format_number};
use crate::notation::builder::NoteSettings;
use crate::pitch::pitch_name;
use crate::position::from_absolute_beats;

/// Writes draft notes back out as notation.
///
/// Consecutive drafts sharing a position are written as one chord. Modifiers are
/// only written when they differ from the running settings, which start at the
/// parser defaults, so the output parses back into the same drafts.
///
/// A velocity range is capped at 127, so a draft whose velocity plus deviation
/// goes past it comes back with a smaller deviation.
pub fn format_drafts(drafts: &[DraftNote]) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = NoteSettings::default();
    let mut iter = drafts.iter().peekable();

    while let Some(note) = iter.next() {
        let velocity = (note.velocity, note.velocity_deviation);
        if velocity != (current.velocity, current.velocity_deviation) {
            if note.velocity_deviation > 0 {
                let hi = note.velocity.saturating_add(note.velocity_deviation).min(MAX_MIDI);
                words.push(format!("v{}-{}", note.velocity, hi));
            } else {
                words.push(format!("v{}", note.velocity));
            }
            current.velocity = note.velocity;
            current.velocity_deviation = note.velocity_deviation;
        }

        if note.duration != current.duration {
            words.push(format!("t{}", format_number(note.duration)));
            current.duration = note.duration;
        }

        if note.probability != current.probability {
            words.push(format!("p{}", format_number(note.probability)));
            current.probability = note.probability;
        }

        words.push(pitch_name(note.pitch).unwrap_or_else(|| note.pitch.to_string()));

        let chord_continues = iter
            .peek()
            .is_some_and(|next| next.position == note.position);
        if !chord_continues {
            words.push(note.position.to_string());
        }
    }

    words.join(" ")
}

/// Converts clip notes into drafts, ordered by start time then pitch.
pub fn notes_to_drafts(
    notes: &[NoteEvent],
    ts: TimeSignature,
) -> Result<Vec<DraftNote>, ParseError> {
    let mut sorted = notes.to_vec();
    sorted.sort_by(|a, b| {
        a.start_time
            .total_cmp(&b.start_time)
            .then_with(|| a.pitch.cmp(&b.pitch))
    });

    sorted
        .into_iter()
        .map(|note| {
            Ok(DraftNote {
                pitch: note.pitch,
                position: from_absolute_beats(note.start_time, ts)?,
                duration: note.duration,
                velocity: note.velocity,
                probability: note.probability,
                velocity_deviation: note.velocity_deviation,
            })
        })
        .collect()
}

/// Notation for a clip's notes under `ts`.
pub fn format_notes(notes: &[NoteEvent], ts: TimeSignature) -> Result<String, ParseError> {
    Ok(format_drafts(&notes_to_drafts(notes, ts)?))
}
