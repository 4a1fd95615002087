use crate::error::{ErrorKind, ParseError};
use crate::pitch::looks_like_pitch;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// `v<n>`
    Velocity(f64),
    /// `v<lo>-<hi>`
    VelocityRange(f64, f64),
    /// `t<beats>`
    Duration(f64),
    /// `p<chance>`
    Probability(f64),
    /// `<bar>|<beat>`
    Position { bar: u32, beat: f64 },
    /// A note name or `*`; resolved later by the builder.
    Pitch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the token in the source string.
    pub offset: usize,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

/// Lazily splits notation into tokens. Cloning restarts from the clone's position.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    source: &'a str,
    cursor: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, cursor: 0 }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.source[self.cursor..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            self.cursor = self.source.len();
            return None;
        }

        let offset = self.cursor + (rest.len() - trimmed.len());
        let len = trimmed
            .find(char::is_whitespace)
            .unwrap_or(trimmed.len());
        let text = &trimmed[..len];
        self.cursor = offset + len;

        Some(classify(text).map(|kind| Token { kind, text, offset }))
    }
}

pub fn tokens(source: &str) -> Tokens<'_> {
    Tokens::new(source)
}

/// Tokenizes the whole string, failing on the first malformed token.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, ParseError> {
    tokens(source).collect()
}

fn classify(text: &str) -> Result<TokenKind, ParseError> {
    if let Some(body) = text.strip_prefix('v') {
        if let Some(value) = parse_number(body) {
            return Ok(TokenKind::Velocity(value));
        }
        if let Some((lo, hi)) = body.split_once('-')
            && let (Some(lo), Some(hi)) = (parse_number(lo), parse_number(hi))
        {
            return Ok(TokenKind::VelocityRange(lo, hi));
        }
    }

    if let Some(value) = text.strip_prefix('t').and_then(parse_number) {
        return Ok(TokenKind::Duration(value));
    }

    if let Some(value) = text.strip_prefix('p').and_then(parse_number) {
        return Ok(TokenKind::Probability(value));
    }

    if let Some((bar, beat)) = text.split_once('|')
        && !bar.is_empty()
        && bar.bytes().all(|b| b.is_ascii_digit())
        && let (Ok(bar), Some(beat)) = (bar.parse::<u32>(), parse_number(beat))
    {
        return Ok(TokenKind::Position { bar, beat });
    }

    if looks_like_pitch(text) {
        return Ok(TokenKind::Pitch);
    }

    Err(ParseError::at(
        ErrorKind::MalformedToken,
        text,
        format!("'{}' is not a modifier, position or pitch", text),
    ))
}

/// Unsigned decimal: `12`, `0.25`, `.5`.
fn parse_number(text: &str) -> Option<f64> {
    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (text, None),
    };

    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let valid = match frac {
        Some(frac) => !frac.is_empty() && digits(frac) && digits(whole),
        None => !whole.is_empty() && digits(whole),
    };

    if !valid {
        return None;
    }

    text.parse::<f64>().ok()
}
