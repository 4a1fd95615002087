use crate::midi_importer::import_midi_notes;
use crate::model::note::{NoteEvent, TimeSignature};
use crate::model::request::UpdateMode;
use anyhow::{Result, anyhow};
use log::info;
use std::fs;
use std::path::Path;

pub fn parse_update_mode(s: &str) -> Result<UpdateMode> {
    match s.to_lowercase().as_str() {
        "m" | "merge" => Ok(UpdateMode::Merge),
        "r" | "replace" => Ok(UpdateMode::Replace),
        other => Err(anyhow!(
            "Unknown update mode '{}', expected merge|replace..!",
            other
        )),
    }
}

/// Loads a clip's notes from a `.mid` file or a JSON note list.
/// The time signature is only known for MIDI files that declare one.
pub fn load_existing_notes(path: &Path) -> Result<(Vec<NoteEvent>, Option<TimeSignature>)> {
    let is_midi = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_lowercase().as_str(), "mid" | "midi"));

    if is_midi {
        let clip = import_midi_notes(path)?;
        info!(
            "Loaded {} existing note(s) from MIDI file '{}'..!",
            clip.notes.len(),
            path.display()
        );
        return Ok((clip.notes, clip.time_signature));
    }

    let text = fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read note list {}: {}", path.display(), e))?;
    let notes = parse_note_list(&text)?;
    info!(
        "Loaded {} existing note(s) from '{}'..!",
        notes.len(),
        path.display()
    );

    Ok((notes, None))
}

/// Parses a JSON array of notes. Every note must be in range.
pub fn parse_note_list(text: &str) -> Result<Vec<NoteEvent>> {
    let notes: Vec<NoteEvent> =
        serde_json::from_str(text).map_err(|e| anyhow!("Failed to parse note list: {}", e))?;

    for (i, note) in notes.iter().enumerate() {
        note.validate().map_err(|e| anyhow!("Note {} in the note list is invalid: {}", i, e))?;
    }

    Ok(notes)
}
