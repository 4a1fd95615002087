use crate::model::note::{NoteEvent, TimeSignature};
use anyhow::{Result, anyhow};
use log::{debug, warn};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// The notes of a Standard MIDI File, placed on the quarter-note beat grid.
#[derive(Debug, Clone, Default)]
pub struct ImportedClip {
    pub notes: Vec<NoteEvent>,
    /// The first time signature event found in the file, if any.
    pub time_signature: Option<TimeSignature>,
}

struct NoteInterval {
    pub midi: u8,
    pub start_tick: u64,
    pub end_tick: u64,
    pub velocity: u8,
}

pub fn import_midi_notes<P: AsRef<Path>>(path: P) -> Result<ImportedClip> {
    let bytes = fs::read(path.as_ref()).map_err(|e| {
        anyhow!(
            "Failed to read MIDI file {}: {}",
            path.as_ref().display(),
            e
        )
    })?;

    midi_bytes_to_notes(&bytes)
}

pub fn midi_bytes_to_notes(bytes: &[u8]) -> Result<ImportedClip> {
    let smf = Smf::parse(bytes).map_err(|e| anyhow!("Failed to parse MIDI: {:?}", e))?;

    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(t) => t.as_int() as u64,
        Timing::Timecode(_fps, _subframe) => {
            return Err(anyhow!(
                "SMPTE timecode midi timing is not currently supported..!"
            ));
        }
    };

    if ticks_per_quarter == 0 {
        return Err(anyhow!("MIDI header declares zero ticks per quarter note..!"));
    }

    debug!("Ticks per quarter note: {}", ticks_per_quarter);
    debug!(
        "MIDI format: {:?}, tracks: {}",
        smf.header.format,
        smf.tracks.len()
    );

    let mut time_signature: Option<TimeSignature> = None;
    let mut intervals: Vec<NoteInterval> = Vec::new();
    let mut open_notes: HashMap<(u8, u8), Vec<(u64, u8)>> = HashMap::new();
    let mut last_tick: u64 = 0;

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let mut abs_tick: u64 = 0;
        for event in track.iter() {
            abs_tick = abs_tick.saturating_add(event.delta.as_int() as u64);
            last_tick = last_tick.max(abs_tick);

            match &event.kind {
                TrackEventKind::Meta(MetaMessage::TimeSignature(num, den_pow, _, _)) => {
                    if time_signature.is_some() {
                        continue;
                    }

                    let denominator = 1u32.checked_shl(*den_pow as u32).unwrap_or(0);
                    match TimeSignature::new(*num as u32, denominator) {
                        Ok(ts) => {
                            debug!(
                                "Time signature {} at tick {} (track {})",
                                ts, abs_tick, track_idx
                            );
                            time_signature = Some(ts);
                        }
                        Err(why) => warn!("Ignoring time signature event: {}..!", why),
                    }
                }
                TrackEventKind::Midi { channel, message } => {
                    let ch: u8 = channel.as_int();

                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            open_notes
                                .entry((ch, key.as_int()))
                                .or_default()
                                .push((abs_tick, vel.as_int()));
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            close_note(&mut open_notes, &mut intervals, ch, key.as_int(), abs_tick);
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }

    for ((ch, key), stack) in open_notes.into_iter() {
        for (start_tick, velocity) in stack {
            let end_tick = if last_tick > start_tick {
                last_tick
            } else {
                start_tick + ticks_per_quarter
            };

            warn!(
                "Unclosed NoteOn for {}, channel: {} at tick: {} auto-closing at: {}..!",
                key, ch, start_tick, end_tick
            );

            intervals.push(NoteInterval {
                midi: key,
                start_tick,
                end_tick,
                velocity,
            });
        }
    }

    let tpq = ticks_per_quarter as f64;
    let mut notes: Vec<NoteEvent> = intervals
        .into_iter()
        .filter(|interval| {
            if interval.end_tick <= interval.start_tick {
                debug!(
                    "Skipping zero-length midi note {} at tick {}..!",
                    interval.midi, interval.start_tick
                );
                return false;
            }
            true
        })
        .map(|interval| {
            NoteEvent::new(
                interval.midi,
                interval.start_tick as f64 / tpq,
                (interval.end_tick - interval.start_tick) as f64 / tpq,
                interval.velocity,
            )
        })
        .collect();

    notes.sort_by(|a, b| {
        a.start_time
            .total_cmp(&b.start_time)
            .then_with(|| a.pitch.cmp(&b.pitch))
    });

    Ok(ImportedClip {
        notes,
        time_signature,
    })
}

fn close_note(
    open_notes: &mut HashMap<(u8, u8), Vec<(u64, u8)>>,
    intervals: &mut Vec<NoteInterval>,
    ch: u8,
    midi_num: u8,
    abs_tick: u64,
) {
    if let Some((start_tick, velocity)) = open_notes
        .get_mut(&(ch, midi_num))
        .and_then(|stack| stack.pop())
    {
        intervals.push(NoteInterval {
            midi: midi_num,
            start_tick,
            end_tick: abs_tick,
            velocity,
        });
    } else {
        debug!(
            "Orphaned NoteOff for {} ch{} at tick {}..!",
            midi_num, ch, abs_tick
        );
    }
}
