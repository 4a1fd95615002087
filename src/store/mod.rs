use crate::error::Result;
use crate::model::note::{MAX_MIDI, NoteEvent};
use std::ops::{Range, RangeInclusive};

mod memory;

pub use memory::{InMemoryNoteStore, StoreOperation};

/// Upper bound of the time window used when touching "all" notes of a clip.
/// Comfortably longer than any clip a session can hold.
pub const FULL_TIME_RANGE_END: f64 = 1_000_000.0;

pub fn full_pitch_range() -> RangeInclusive<u8> {
    0..=MAX_MIDI
}

pub fn full_time_range() -> Range<f64> {
    0.0..FULL_TIME_RANGE_END
}

/// The notes of one clip, as exposed by the host.
///
/// Calls are made one at a time and are not retried. A note is inside a time
/// range when its start time is.
pub trait NoteStore {
    fn read_notes(&self, pitches: RangeInclusive<u8>, time: Range<f64>) -> Result<Vec<NoteEvent>>;

    fn clear_notes(&mut self, pitches: RangeInclusive<u8>, time: Range<f64>) -> Result<()>;

    fn add_notes(&mut self, notes: &[NoteEvent]) -> Result<()>;

    fn read_all_notes(&self) -> Result<Vec<NoteEvent>> {
        self.read_notes(full_pitch_range(), full_time_range())
    }
}

/// A single mutation to send to a [`NoteStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCommand {
    Clear {
        pitches: RangeInclusive<u8>,
        time: Range<f64>,
    },
    Add(Vec<NoteEvent>),
}

impl StoreCommand {
    pub fn clear_all() -> Self {
        StoreCommand::Clear {
            pitches: full_pitch_range(),
            time: full_time_range(),
        }
    }

    pub fn apply(&self, store: &mut dyn NoteStore) -> Result<()> {
        match self {
            StoreCommand::Clear { pitches, time } => {
                store.clear_notes(pitches.clone(), time.clone())
            }
            StoreCommand::Add(notes) => store.add_notes(notes),
        }
    }
}
