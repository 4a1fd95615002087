use std::fmt;
use thiserror::Error;

/// The class of problem found while compiling a notation string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedToken,
    InvalidPosition,
    InvalidTimeSignature,
    PitchBeforePosition,
    UnresolvedPitch,
    OutOfRangeValue,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::MalformedToken => "malformed token",
            ErrorKind::InvalidPosition => "invalid position",
            ErrorKind::InvalidTimeSignature => "invalid time signature",
            ErrorKind::PitchBeforePosition => "pitch without position",
            ErrorKind::UnresolvedPitch => "unresolved pitch",
            ErrorKind::OutOfRangeValue => "out of range value",
        };
        f.write_str(label)
    }
}

/// A notation compile failure. Carries the offending token text when there is one.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub token: Option<String>,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            token: None,
            message: message.into(),
        }
    }

    pub fn at(kind: ErrorKind, token: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            token: Some(token.to_string()),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NoteError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Note store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, NoteError>;
