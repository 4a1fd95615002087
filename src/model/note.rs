use crate::error::{ErrorKind, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_VELOCITY: u8 = 100;
pub const DEFAULT_DURATION: f64 = 1.0;
pub const DEFAULT_PROBABILITY: f64 = 1.0;
pub const MAX_MIDI: u8 = 127;

const TIME_SIGNATURE_FORMAT: &str = "Time signature must be in format N/M";

/// A meter, with beats counted in quarter notes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    pub fn new(numerator: u32, denominator: u32) -> Result<Self, ParseError> {
        let ts = Self {
            numerator,
            denominator,
        };
        ts.validate()?;
        Ok(ts)
    }

    /// Numerator at least 1 and a power-of-two denominator.
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.numerator < 1 {
            return Err(ParseError::at(
                ErrorKind::InvalidTimeSignature,
                &self.to_string(),
                format!("numerator must be at least 1, got {}", self.numerator),
            ));
        }

        if !self.denominator.is_power_of_two() {
            return Err(ParseError::at(
                ErrorKind::InvalidTimeSignature,
                &self.to_string(),
                format!(
                    "denominator must be a power of two, got {}",
                    self.denominator
                ),
            ));
        }

        Ok(())
    }

    /// Length of one beat in quarter notes.
    pub fn beat_unit(&self) -> f64 {
        4.0 / self.denominator as f64
    }

    /// Length of one bar in quarter notes.
    pub fn beats_per_bar(&self) -> f64 {
        self.numerator as f64 * self.beat_unit()
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for TimeSignature {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed =
            || ParseError::at(ErrorKind::InvalidTimeSignature, s, TIME_SIGNATURE_FORMAT);

        let (num, den) = s.split_once('/').ok_or_else(malformed)?;
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(num) || !all_digits(den) {
            return Err(malformed());
        }

        let numerator = num.parse::<u32>().map_err(|_| malformed())?;
        let denominator = den.parse::<u32>().map_err(|_| malformed())?;

        Self::new(numerator, denominator)
    }
}

/// A 1-indexed musical position, `bar|beat`. The beat may be fractional.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BarBeatPosition {
    pub bar: u32,
    pub beat: f64,
}

impl BarBeatPosition {
    pub fn new(bar: u32, beat: f64) -> Self {
        Self { bar, beat }
    }
}

impl fmt::Display for BarBeatPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.bar, format_number(self.beat))
    }
}

/// A note as stored in a clip. Times and durations are in quarter-note beats.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    pub pitch: u8,
    pub start_time: f64,
    pub duration: f64,
    pub velocity: u8,
    #[serde(default = "default_probability")]
    pub probability: f64,
    #[serde(default)]
    pub velocity_deviation: u8,
}

fn default_probability() -> f64 {
    DEFAULT_PROBABILITY
}

impl NoteEvent {
    pub fn new(pitch: u8, start_time: f64, duration: f64, velocity: u8) -> Self {
        Self {
            pitch,
            start_time,
            duration,
            velocity,
            probability: DEFAULT_PROBABILITY,
            velocity_deviation: 0,
        }
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Checks the ranges a compiled note always satisfies, for notes that come
    /// from somewhere else. `velocity + velocity_deviation` must stay a MIDI
    /// value, as it does for a `v<lo>-<hi>` range.
    pub fn validate(&self) -> Result<(), ParseError> {
        let out_of_range = |message: String| ParseError::new(ErrorKind::OutOfRangeValue, message);

        if self.pitch > MAX_MIDI {
            return Err(out_of_range(format!(
                "pitch must be within 0..{}, got {}",
                MAX_MIDI, self.pitch
            )));
        }
        if self.velocity as u16 + self.velocity_deviation as u16 > MAX_MIDI as u16 {
            return Err(out_of_range(format!(
                "velocity {} with deviation {} goes past {}",
                self.velocity, self.velocity_deviation, MAX_MIDI
            )));
        }
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(out_of_range(format!(
                "start time must be at least 0, got {}",
                self.start_time
            )));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(out_of_range(format!(
                "duration must be greater than 0, got {}",
                self.duration
            )));
        }
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(out_of_range(format!(
                "probability must be within 0..1, got {}",
                self.probability
            )));
        }

        Ok(())
    }
}

/// A parsed note that still carries its bar|beat position.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftNote {
    pub pitch: u8,
    pub position: BarBeatPosition,
    pub duration: f64,
    pub velocity: u8,
    pub probability: f64,
    pub velocity_deviation: u8,
}

/// Formats a number without a trailing `.0` for whole values.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
