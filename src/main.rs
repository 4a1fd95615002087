use anyhow::Result;
use barbeat::notation::{format_drafts, format_notes, parse_drafts, resolve_drafts};
use barbeat::pitch::midi_label;
use barbeat::{
    Args, InMemoryNoteStore, NoteUpdateRequest, TimeSignature, apply_note_update, export_midi_notes,
    load_existing_notes, parse_update_mode,
};
use clap::Parser;
use log::{debug, info};

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let update_mode = parse_update_mode(&args.update_mode)?;

    let (existing, file_ts) = match &args.existing {
        Some(path) => load_existing_notes(path)?,
        None => (Vec::new(), None),
    };

    let clip_ts = match file_ts {
        Some(ts) => {
            debug!("Using time signature {} from the existing clip file", ts);
            ts
        }
        None => args.clip_time_signature.parse::<TimeSignature>()?,
    };

    let request = NoteUpdateRequest {
        notation: args.notation.clone(),
        time_signature: args.time_signature.clone(),
        update_mode,
    };

    if args.dry_run {
        let ts = request.options()?.effective_time_signature(clip_ts);
        let drafts = parse_drafts(&request.notation)?;
        let notes = resolve_drafts(&drafts, ts)?;

        info!("Previewing {} parsed note(s) in {}..!", notes.len(), ts);
        for (i, (draft, note)) in drafts.iter().zip(notes.iter()).enumerate() {
            info!(
                "Note {}: pitch={} at={} start={} dur={} vel={} dev={} prob={}",
                i,
                midi_label(note.pitch),
                draft.position,
                note.start_time,
                note.duration,
                note.velocity,
                note.velocity_deviation,
                note.probability
            );
        }

        println!("{}", format_drafts(&drafts));
        return Ok(());
    }

    let mut store = InMemoryNoteStore::with_notes(existing);
    let result = apply_note_update(&mut store, clip_ts, &request)?;
    println!("{}", serde_json::to_string(&result)?);

    if args.verbose {
        println!("{}", format_notes(store.notes(), clip_ts)?);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(store.notes())?);
    }

    if let Some(path) = &args.export_midi {
        export_midi_notes(store.notes(), clip_ts, path)?;
        info!("Wrote {} note(s) to '{}'..!", store.notes().len(), path.display());
    }

    Ok(())
}
