use crate::model::note::{NoteEvent, TimeSignature};
use anyhow::{Result, anyhow};
use log::{debug, warn};
use midly::num::{u4, u7, u15, u28};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::fs;
use std::path::Path;

pub const EXPORT_TICKS_PER_QUARTER: u16 = 480;

const MAX_DELTA_TICKS: u32 = (1 << 28) - 1;

struct Point {
    tick: u64,
    is_start: bool,
    midi: u8,
    velocity: u8,
}

/// Writes notes as a single-track Standard MIDI File.
///
/// Probability and velocity deviation have no MIDI equivalent and are dropped.
pub fn export_midi_notes<P: AsRef<Path>>(
    notes: &[NoteEvent],
    time_signature: TimeSignature,
    path: P,
) -> Result<()> {
    let bytes = notes_to_midi_bytes(notes, time_signature)?;
    fs::write(path.as_ref(), bytes).map_err(|e| {
        anyhow!(
            "Failed to write MIDI file {}: {}",
            path.as_ref().display(),
            e
        )
    })
}

/// Encodes notes at [`EXPORT_TICKS_PER_QUARTER`]. Notes outside the MIDI ranges are an error.
pub fn notes_to_midi_bytes(notes: &[NoteEvent], time_signature: TimeSignature) -> Result<Vec<u8>> {
    time_signature.validate()?;

    let tpq = EXPORT_TICKS_PER_QUARTER as f64;
    let mut points: Vec<Point> = Vec::with_capacity(notes.len() * 2);
    let mut silent = 0;

    for (i, note) in notes.iter().enumerate() {
        note.validate().map_err(|e| anyhow!("Cannot export note {} to MIDI: {}", i, e))?;

        let start_tick = (note.start_time * tpq).round().max(0.0) as u64;
        let end_tick = ((note.end_time() * tpq).round() as u64).max(start_tick + 1);

        // A NoteOn with velocity 0 reads back as a NoteOff.
        let velocity = note.velocity.max(1);
        if note.velocity == 0 {
            silent += 1;
        }

        points.push(Point {
            tick: start_tick,
            is_start: true,
            midi: note.pitch,
            velocity,
        });
        points.push(Point {
            tick: end_tick,
            is_start: false,
            midi: note.pitch,
            velocity: 0,
        });
    }

    if silent > 0 {
        warn!("Wrote {} zero-velocity note(s) with velocity 1..!", silent);
    }

    // Releases go before attacks on the same tick so back to back notes of one pitch stay separate.
    points.sort_by(|a, b| {
        a.tick
            .cmp(&b.tick)
            .then_with(|| (a.is_start as u8).cmp(&(b.is_start as u8)))
    });

    let den_pow = time_signature.denominator.trailing_zeros() as u8;
    let numerator = u8::try_from(time_signature.numerator)
        .map_err(|_| anyhow!("Time signature {} does not fit in a MIDI file..!", time_signature))?;

    let mut track: Vec<TrackEvent<'static>> = vec![TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, den_pow, 24, 8)),
    }];

    let mut last_tick = 0u64;
    for pt in points {
        let delta = u32::try_from(pt.tick - last_tick)
            .ok()
            .filter(|d| *d <= MAX_DELTA_TICKS)
            .ok_or_else(|| {
                anyhow!(
                    "Note at tick {} is too far from the previous event..!",
                    pt.tick
                )
            })?;
        last_tick = pt.tick;

        let message = if pt.is_start {
            MidiMessage::NoteOn {
                key: u7::new(pt.midi),
                vel: u7::new(pt.velocity),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(pt.midi),
                vel: u7::new(0),
            }
        };

        track.push(TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message,
            },
        });
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header: Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(EXPORT_TICKS_PER_QUARTER)),
        ),
        tracks: vec![track],
    };

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;
    debug!("Encoded {} note(s) into {} MIDI bytes", notes.len(), bytes.len());

    Ok(bytes)
}
