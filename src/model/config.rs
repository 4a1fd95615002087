use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "barbeat",
    about = "Compile bar|beat note notation and write it into a clip!"
)]
pub struct Args {
    /// The notation to compile, e.g. "v100 t0.25 C1 Gb1 1|1 D1 1|2".
    pub notation: String,

    /// Time signature used to place positions (N/M). Defaults to the clip's own.
    #[arg(short, long)]
    pub time_signature: Option<String>,

    /// Time signature of the target clip (N/M). Taken from `--existing` when that is a MIDI file.
    #[arg(short, long, default_value = "4/4")]
    pub clip_time_signature: String,

    /// How parsed notes are combined with the clip's notes: merge|replace.
    #[arg(short, long, default_value = "merge")]
    pub update_mode: String,

    /// The clip's current notes, as a JSON note list or a .mid file.
    #[arg(short, long)]
    pub existing: Option<PathBuf>,

    /// Write the resulting clip to a MIDI file.
    #[arg(long = "export-midi")]
    pub export_midi: Option<PathBuf>,

    /// Dry run (print the parsed notes and their notation, do not touch the clip).
    #[arg(short, long, default_value_t = false)]
    pub dry_run: bool,

    /// Print the resulting clip notes as JSON.
    #[arg(short, long, default_value_t = false)]
    pub json: bool,

    /// Prints extra information to the terminal.
    #[arg(short, long)]
    pub verbose: bool,
}
