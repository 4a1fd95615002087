use crate::error::Result;
use crate::model::note::NoteEvent;
use crate::store::NoteStore;
use log::debug;
use std::cell::RefCell;
use std::ops::{Range, RangeInclusive};

/// One call made against an [`InMemoryNoteStore`], in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOperation {
    Read,
    Clear,
    Add(usize),
}

/// A clip's notes held in a `Vec`. Records every call so callers can check the
/// order in which the store was used.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNoteStore {
    notes: Vec<NoteEvent>,
    operations: RefCell<Vec<StoreOperation>>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notes(notes: Vec<NoteEvent>) -> Self {
        Self {
            notes,
            operations: RefCell::new(Vec::new()),
        }
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn into_notes(self) -> Vec<NoteEvent> {
        self.notes
    }

    pub fn operations(&self) -> Vec<StoreOperation> {
        self.operations.borrow().clone()
    }

    fn contains(note: &NoteEvent, pitches: &RangeInclusive<u8>, time: &Range<f64>) -> bool {
        pitches.contains(&note.pitch) && time.contains(&note.start_time)
    }
}

impl NoteStore for InMemoryNoteStore {
    fn read_notes(&self, pitches: RangeInclusive<u8>, time: Range<f64>) -> Result<Vec<NoteEvent>> {
        self.operations.borrow_mut().push(StoreOperation::Read);

        Ok(self
            .notes
            .iter()
            .filter(|n| Self::contains(n, &pitches, &time))
            .copied()
            .collect())
    }

    fn clear_notes(&mut self, pitches: RangeInclusive<u8>, time: Range<f64>) -> Result<()> {
        self.operations.borrow_mut().push(StoreOperation::Clear);

        let before = self.notes.len();
        self.notes.retain(|n| !Self::contains(n, &pitches, &time));
        debug!("Cleared {} note(s) from the clip", before - self.notes.len());

        Ok(())
    }

    fn add_notes(&mut self, notes: &[NoteEvent]) -> Result<()> {
        self.operations
            .borrow_mut()
            .push(StoreOperation::Add(notes.len()));
        self.notes.extend_from_slice(notes);

        Ok(())
    }
}
