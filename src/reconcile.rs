use crate::error::Result;
use crate::model::note::{NoteEvent, TimeSignature};
use crate::model::request::{NoteUpdateRequest, NoteUpdateResult, UpdateMode};
use crate::notation::compile;
use crate::store::{NoteStore, StoreCommand};
use log::{debug, info};

/// What a clip should contain after an update, and how to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub final_notes: Vec<NoteEvent>,
    pub commands: Vec<StoreCommand>,
}

impl Reconciliation {
    pub fn note_count(&self) -> usize {
        self.final_notes.len()
    }

    pub fn result(&self) -> NoteUpdateResult {
        NoteUpdateResult {
            note_count: self.note_count(),
        }
    }
}

/// Combines parsed notes with a clip's current notes.
///
/// Merging never deduplicates: a parsed note with the same pitch and start as an
/// existing one ends up next to it. `existing` is ignored when replacing.
pub fn reconcile(
    drafts: Vec<NoteEvent>,
    mode: UpdateMode,
    existing: &[NoteEvent],
) -> Reconciliation {
    match mode {
        UpdateMode::Merge => {
            let mut final_notes = Vec::with_capacity(existing.len() + drafts.len());
            final_notes.extend_from_slice(existing);
            final_notes.extend_from_slice(&drafts);

            Reconciliation {
                final_notes,
                commands: vec![StoreCommand::Add(drafts)],
            }
        }
        UpdateMode::Replace => Reconciliation {
            final_notes: drafts.clone(),
            commands: vec![StoreCommand::clear_all(), StoreCommand::Add(drafts)],
        },
    }
}

/// Writes `notes` into `store`. In merge mode the existing notes are read first;
/// the write does not check whether they changed in between.
pub fn update_clip(
    store: &mut dyn NoteStore,
    notes: Vec<NoteEvent>,
    mode: UpdateMode,
) -> Result<Reconciliation> {
    let existing = match mode {
        UpdateMode::Merge => store.read_all_notes()?,
        UpdateMode::Replace => Vec::new(),
    };

    let plan = reconcile(notes, mode, &existing);
    for command in &plan.commands {
        command.apply(store)?;
    }

    debug!(
        "Clip update ({:?}) kept {} existing note(s), now holds {}",
        mode,
        existing.len(),
        plan.note_count()
    );

    Ok(plan)
}

/// Compiles `request` against the clip's meter (unless the request names one)
/// and applies it to the clip.
pub fn apply_note_update(
    store: &mut dyn NoteStore,
    clip_time_signature: TimeSignature,
    request: &NoteUpdateRequest,
) -> Result<NoteUpdateResult> {
    let options = request.options()?;
    let ts = options.effective_time_signature(clip_time_signature);
    let notes = compile(&request.notation, ts)?;

    info!("Writing {} note(s) in {} ({:?})", notes.len(), ts, options.update_mode);
    let plan = update_clip(store, notes, options.update_mode)?;

    Ok(plan.result())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::{ErrorKind, NoteError};
    use crate::store::{InMemoryNoteStore, StoreOperation};

    fn existing_clip() -> InMemoryNoteStore {
        InMemoryNoteStore::with_notes(vec![NoteEvent::new(60, 0.0, 1.0, 100)])
    }

    fn request(notation: &str, mode: UpdateMode) -> NoteUpdateRequest {
        NoteUpdateRequest {
            notation: notation.into(),
            time_signature: None,
            update_mode: mode,
        }
    }

    fn update_in_common_time(
        store: &mut InMemoryNoteStore,
        notation: &str,
        mode: UpdateMode,
    ) -> Result<NoteUpdateResult> {
        apply_note_update(store, TimeSignature::default(), &request(notation, mode))
    }

    #[test]
    fn merge_keeps_existing_notes() {
        env_logger::try_init().unwrap_or(());

        let mut store = existing_clip();
        let result = update_in_common_time(&mut store, "D3 1|2", UpdateMode::Merge).unwrap();

        assert_eq!(result.note_count, 2);
        assert_eq!(store.notes().len(), 2);
        assert_eq!(store.operations(), vec![StoreOperation::Read, StoreOperation::Add(1)]);
    }

    #[test]
    fn replace_discards_existing_notes() {
        env_logger::try_init().unwrap_or(());

        let mut store = existing_clip();
        let result = update_in_common_time(&mut store, "D3 1|2", UpdateMode::Replace).unwrap();

        assert_eq!(result.note_count, 1);
        assert_eq!(store.notes().len(), 1);
        assert_eq!(store.notes()[0].pitch, 62);
        assert_eq!(store.operations(), vec![StoreOperation::Clear, StoreOperation::Add(1)]);
    }

    #[test]
    fn merge_does_not_deduplicate() {
        let mut store = existing_clip();
        let result = update_in_common_time(&mut store, "v50 C3 1|1", UpdateMode::Merge).unwrap();

        assert_eq!(result.note_count, 2);
        let layered: Vec<_> = store
            .notes()
            .iter()
            .filter(|n| n.pitch == 60 && n.start_time == 0.0)
            .collect();
        assert_eq!(layered.len(), 2);
    }

    #[test]
    fn replace_ignores_overlap() {
        let plan = reconcile(
            vec![NoteEvent::new(60, 0.0, 1.0, 90)],
            UpdateMode::Replace,
            &[NoteEvent::new(60, 0.0, 1.0, 100)],
        );
        assert_eq!(plan.note_count(), 1);
        assert_eq!(plan.final_notes[0].velocity, 90);
        assert_eq!(plan.commands[0], StoreCommand::clear_all());
    }

    #[test]
    fn empty_notation_is_not_an_error() {
        let mut store = existing_clip();
        let result = update_in_common_time(&mut store, "", UpdateMode::Merge).unwrap();
        assert_eq!(result.note_count, 1);
        assert_eq!(store.operations(), vec![StoreOperation::Read, StoreOperation::Add(0)]);

        let mut store = existing_clip();
        let result = update_in_common_time(&mut store, "   ", UpdateMode::Replace).unwrap();
        assert_eq!(result.note_count, 0);
        assert!(store.notes().is_empty());
    }

    #[test]
    fn parse_errors_leave_the_clip_untouched() {
        let mut store = existing_clip();
        let err = update_in_common_time(&mut store, "C3 1|1 D3", UpdateMode::Replace).unwrap_err();

        let parse = match err {
            NoteError::Parse(parse) => parse,
            other => panic!("expected a parse error, got {:?}", other),
        };
        assert_eq!(parse.kind, ErrorKind::PitchBeforePosition);
        assert_eq!(store.notes().len(), 1);
        assert!(store.operations().is_empty());
    }

    #[test]
    fn request_time_signature_wins_over_clip() {
        let mut store = InMemoryNoteStore::new();
        let mut req = request("C3 1|1 D3 2|1", UpdateMode::Merge);
        req.time_signature = Some("6/8".into());

        apply_note_update(&mut store, TimeSignature::new(4, 4).unwrap(), &req).unwrap();
        assert_eq!(store.notes()[1].start_time, 3.0);
    }

    #[test]
    fn invalid_request_time_signature() {
        let mut store = existing_clip();
        let mut req = request("C3 1|1", UpdateMode::Merge);
        req.time_signature = Some("invalid".into());

        let err = apply_note_update(&mut store, TimeSignature::default(), &req).unwrap_err();
        assert!(err.to_string().contains("Time signature must be in format"));
        assert!(store.operations().is_empty());
    }
}
