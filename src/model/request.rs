use crate::error::ParseError;
use crate::model::note::TimeSignature;
use serde::{Deserialize, Serialize};

/// How parsed notes are combined with the notes already in a clip.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Keep the clip's notes and add the parsed ones next to them.
    #[default]
    Merge,

    /// Clear the clip, then add the parsed notes.
    Replace,
}

/// Fixed per-call configuration for a clip update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Merge or replace the clip's existing notes.
    pub update_mode: UpdateMode,

    /// Meter used to place bar|beat positions. When `None` the clip's own
    /// time signature is used.
    pub time_signature: Option<TimeSignature>,
}

impl UpdateOptions {
    /// The time signature to compile against for a clip with `clip_ts`.
    pub fn effective_time_signature(&self, clip_ts: TimeSignature) -> TimeSignature {
        self.time_signature.unwrap_or(clip_ts)
    }
}

/// A note update as received from a caller.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdateRequest {
    pub notation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<String>,
    #[serde(default)]
    pub update_mode: UpdateMode,
}

impl NoteUpdateRequest {
    pub fn new(notation: impl Into<String>) -> Self {
        Self {
            notation: notation.into(),
            ..Default::default()
        }
    }

    /// Validates the loose request fields into an [`UpdateOptions`].
    pub fn options(&self) -> Result<UpdateOptions, ParseError> {
        let time_signature = match &self.time_signature {
            Some(raw) => Some(raw.parse::<TimeSignature>()?),
            None => None,
        };

        Ok(UpdateOptions {
            update_mode: self.update_mode,
            time_signature,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdateResult {
    pub note_count: usize,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn request_defaults_to_merge() {
        let request: NoteUpdateRequest = serde_json::from_str(r#"{"notation":"C3 1|1"}"#).unwrap();
        assert_eq!(request.update_mode, UpdateMode::Merge);

        let options = request.options().unwrap();
        assert_eq!(options.time_signature, None);
        assert_eq!(
            options.effective_time_signature(TimeSignature::new(3, 4).unwrap()),
            TimeSignature::new(3, 4).unwrap()
        );
    }

    #[test]
    fn request_time_signature_overrides_clip() {
        let request: NoteUpdateRequest = serde_json::from_str(
            r#"{"notation":"C3 1|1","timeSignature":"6/8","updateMode":"replace"}"#,
        )
        .unwrap();

        let options = request.options().unwrap();
        assert_eq!(options.update_mode, UpdateMode::Replace);
        assert_eq!(
            options.effective_time_signature(TimeSignature::default()),
            TimeSignature::new(6, 8).unwrap()
        );
    }

    #[test]
    fn request_rejects_bad_time_signature() {
        let mut request = NoteUpdateRequest::new("C3 1|1");
        request.time_signature = Some("invalid".into());

        let err = request.options().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTimeSignature);
        assert!(err.to_string().contains("Time signature must be in format"));
    }

    #[test]
    fn result_serializes_note_count() {
        let json = serde_json::to_string(&NoteUpdateResult { note_count: 2 }).unwrap();
        assert_eq!(json, r#"{"noteCount":2}"#);
    }
}
