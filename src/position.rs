use crate::error::{ErrorKind, ParseError};
use crate::model::note::{BarBeatPosition, TimeSignature};

/// Converts a bar|beat position into quarter-note beats from the start of the clip.
///
/// With power-of-two denominators every intermediate value is a dyadic
/// fraction, so the result is exact for any position a notation string can
/// express with a finite binary beat.
pub fn to_absolute_beats(pos: BarBeatPosition, ts: TimeSignature) -> Result<f64, ParseError> {
    ts.validate()?;
    validate_position(pos)?;

    let bars = (pos.bar - 1) as f64;
    Ok(bars * ts.beats_per_bar() + (pos.beat - 1.0) * ts.beat_unit())
}

/// Inverse of [`to_absolute_beats`]. Negative inputs are rejected.
pub fn from_absolute_beats(beats: f64, ts: TimeSignature) -> Result<BarBeatPosition, ParseError> {
    ts.validate()?;

    if !beats.is_finite() || beats < 0.0 {
        return Err(ParseError::new(
            ErrorKind::InvalidPosition,
            format!("absolute time must be a non-negative number, got {}", beats),
        ));
    }

    let beats_per_bar = ts.beats_per_bar();
    let bar_index = (beats / beats_per_bar).floor();
    if bar_index >= u32::MAX as f64 {
        return Err(ParseError::new(
            ErrorKind::InvalidPosition,
            format!("absolute time {} is past the last bar of {}", beats, ts),
        ));
    }
    let remainder = beats - bar_index * beats_per_bar;

    Ok(BarBeatPosition {
        bar: bar_index as u32 + 1,
        beat: remainder / ts.beat_unit() + 1.0,
    })
}

pub fn validate_position(pos: BarBeatPosition) -> Result<(), ParseError> {
    if pos.bar < 1 {
        return Err(ParseError::at(
            ErrorKind::InvalidPosition,
            &pos.to_string(),
            format!("bar must be at least 1, got {}", pos.bar),
        ));
    }

    if !pos.beat.is_finite() || pos.beat < 1.0 {
        return Err(ParseError::at(
            ErrorKind::InvalidPosition,
            &pos.to_string(),
            format!("beat must be at least 1, got {}", pos.beat),
        ));
    }

    Ok(())
}
