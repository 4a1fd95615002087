use crate::error::Result;
use crate::model::note::{NoteEvent, TimeSignature};
use crate::model::request::NoteUpdateRequest;
use crate::notation::{parse_drafts, resolve_drafts};
use crate::reconcile::update_clip;
use crate::store::{InMemoryNoteStore, NoteStore};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Looks up clips by id on behalf of a batch update.
pub trait ClipResolver {
    /// The meter of the clip, or `None` when no such clip exists.
    fn clip_time_signature(&self, clip_id: &str) -> Option<TimeSignature>;

    fn clip_store(&mut self, clip_id: &str) -> Option<&mut dyn NoteStore>;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClipUpdateResult {
    pub clip_id: String,
    pub note_count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub results: Vec<ClipUpdateResult>,
    /// One entry per clip that was skipped: unknown ids, and clips that failed
    /// to compile or to write.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl BatchResult {
    fn skip(&mut self, message: String) {
        warn!("{}..!", message);
        self.warnings.push(message);
    }
}

/// Applies one notation update to several clips, one clip at a time.
///
/// The request's own time signature and the notation are checked before any
/// clip is touched; an error there is returned and nothing is written. After
/// that, a clip that cannot be updated (unknown id, bad meter, store failure)
/// is skipped with a warning and the others are still written.
pub fn update_clips<R: ClipResolver + ?Sized>(
    resolver: &mut R,
    clip_ids: &[&str],
    request: &NoteUpdateRequest,
) -> Result<BatchResult> {
    let options = request.options()?;
    let drafts = parse_drafts(&request.notation)?;

    let mut batch = BatchResult::default();
    let mut compiled: Vec<(&str, Vec<NoteEvent>)> = Vec::with_capacity(clip_ids.len());

    for &clip_id in clip_ids {
        let Some(clip_ts) = resolver.clip_time_signature(clip_id) else {
            batch.skip(format!("Clip '{}' does not exist, skipping", clip_id));
            continue;
        };

        let ts = options.effective_time_signature(clip_ts);
        match ts.validate().and_then(|_| resolve_drafts(&drafts, ts)) {
            Ok(notes) => compiled.push((clip_id, notes)),
            Err(why) => batch.skip(format!("Clip '{}' skipped: {}", clip_id, why)),
        }
    }

    for (clip_id, notes) in compiled {
        let Some(store) = resolver.clip_store(clip_id) else {
            batch.skip(format!("Clip '{}' disappeared before it could be written", clip_id));
            continue;
        };

        match update_clip(store, notes, options.update_mode) {
            Ok(plan) => batch.results.push(ClipUpdateResult {
                clip_id: clip_id.to_string(),
                note_count: plan.note_count(),
            }),
            Err(why) => batch.skip(format!("Clip '{}' was not written: {}", clip_id, why)),
        }
    }

    info!(
        "Updated {} clip(s), skipped {}",
        batch.results.len(),
        batch.warnings.len()
    );

    Ok(batch)
}

#[derive(Debug, Clone, Default)]
pub struct SessionClip {
    pub time_signature: TimeSignature,
    pub store: InMemoryNoteStore,
}

/// Clips kept in memory, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct InMemorySession {
    clips: BTreeMap<String, SessionClip>,
}

impl InMemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_clip(
        &mut self,
        clip_id: impl Into<String>,
        time_signature: TimeSignature,
        notes: Vec<NoteEvent>,
    ) {
        self.clips.insert(
            clip_id.into(),
            SessionClip {
                time_signature,
                store: InMemoryNoteStore::with_notes(notes),
            },
        );
    }

    pub fn clip(&self, clip_id: &str) -> Option<&SessionClip> {
        self.clips.get(clip_id)
    }

    pub fn into_clip(mut self, clip_id: &str) -> Option<SessionClip> {
        self.clips.remove(clip_id)
    }
}

impl ClipResolver for InMemorySession {
    fn clip_time_signature(&self, clip_id: &str) -> Option<TimeSignature> {
        self.clips.get(clip_id).map(|c| c.time_signature)
    }

    fn clip_store(&mut self, clip_id: &str) -> Option<&mut dyn NoteStore> {
        self.clips
            .get_mut(clip_id)
            .map(|c| &mut c.store as &mut dyn NoteStore)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::{ErrorKind, NoteError};
    use crate::model::request::UpdateMode;
    use std::ops::{Range, RangeInclusive};

    /// A store whose host has gone away.
    struct OfflineStore;

    impl NoteStore for OfflineStore {
        fn read_notes(&self, _: RangeInclusive<u8>, _: Range<f64>) -> Result<Vec<NoteEvent>> {
            Err(NoteError::Store("host is offline".into()))
        }

        fn clear_notes(&mut self, _: RangeInclusive<u8>, _: Range<f64>) -> Result<()> {
            Err(NoteError::Store("host is offline".into()))
        }

        fn add_notes(&mut self, _: &[NoteEvent]) -> Result<()> {
            Err(NoteError::Store("host is offline".into()))
        }
    }

    /// An offline clip named `offline` next to an in-memory session.
    struct PartlyOffline {
        session: InMemorySession,
        offline: OfflineStore,
    }

    impl ClipResolver for PartlyOffline {
        fn clip_time_signature(&self, clip_id: &str) -> Option<TimeSignature> {
            match clip_id {
                "offline" => Some(TimeSignature::default()),
                _ => self.session.clip_time_signature(clip_id),
            }
        }

        fn clip_store(&mut self, clip_id: &str) -> Option<&mut dyn NoteStore> {
            match clip_id {
                "offline" => Some(&mut self.offline as &mut dyn NoteStore),
                _ => self.session.clip_store(clip_id),
            }
        }
    }

    fn session() -> InMemorySession {
        let mut session = InMemorySession::new();
        session.insert_clip(
            "verse",
            TimeSignature::new(4, 4).unwrap(),
            vec![NoteEvent::new(36, 0.0, 1.0, 100)],
        );
        session.insert_clip("waltz", TimeSignature::new(3, 4).unwrap(), Vec::new());
        session
    }

    #[test]
    fn each_clip_uses_its_own_meter() {
        env_logger::try_init().unwrap_or(());

        let mut session = session();
        let request = NoteUpdateRequest::new("C3 1|1 D3 2|1");
        let batch = update_clips(&mut session, &["verse", "waltz"], &request).unwrap();

        let counts: Vec<(&str, usize)> = batch
            .results
            .iter()
            .map(|r| (r.clip_id.as_str(), r.note_count))
            .collect();
        assert_eq!(counts, vec![("verse", 3), ("waltz", 2)]);
        assert_eq!(session.clip("verse").unwrap().store.notes()[2].start_time, 4.0);
        assert_eq!(session.clip("waltz").unwrap().store.notes()[1].start_time, 3.0);
    }

    #[test]
    fn unknown_clips_are_skipped_with_a_warning() {
        env_logger::try_init().unwrap_or(());

        let mut session = session();
        let mut request = NoteUpdateRequest::new("C3 1|1");
        request.update_mode = UpdateMode::Replace;

        let batch = update_clips(&mut session, &["missing", "verse"], &request).unwrap();
        assert_eq!(batch.results.len(), 1);
        assert_eq!(batch.results[0].clip_id, "verse");
        assert_eq!(batch.results[0].note_count, 1);
        assert_eq!(batch.warnings.len(), 1);
        assert!(batch.warnings[0].contains("missing"));
    }

    #[test]
    fn parse_error_writes_no_clip() {
        let mut session = session();
        let request = NoteUpdateRequest::new("C3 1|1 H9 1|2");

        let err = update_clips(&mut session, &["verse", "waltz"], &request).unwrap_err();
        assert!(matches!(err, NoteError::Parse(ref e) if e.kind == ErrorKind::MalformedToken));
        assert_eq!(session.clip("verse").unwrap().store.notes().len(), 1);
        assert!(session.clip("waltz").unwrap().store.operations().is_empty());
    }

    #[test]
    fn clip_with_a_bad_meter_does_not_stop_the_others() {
        env_logger::try_init().unwrap_or(());

        let mut session = session();
        let broken = TimeSignature {
            numerator: 4,
            denominator: 3,
        };
        session.insert_clip("broken", broken, Vec::new());

        let request = NoteUpdateRequest::new("C3 1|1");
        let batch = update_clips(&mut session, &["broken", "waltz"], &request).unwrap();

        assert_eq!(batch.results.len(), 1);
        assert_eq!(batch.results[0].clip_id, "waltz");
        assert_eq!(session.clip("waltz").unwrap().store.notes().len(), 1);

        assert_eq!(batch.warnings.len(), 1);
        assert!(batch.warnings[0].contains("broken"));
        assert!(batch.warnings[0].contains("power of two"));
        assert!(session.clip("broken").unwrap().store.operations().is_empty());
    }

    #[test]
    fn store_failure_is_reported_per_clip() {
        env_logger::try_init().unwrap_or(());

        let mut resolver = PartlyOffline {
            session: session(),
            offline: OfflineStore,
        };
        let request = NoteUpdateRequest::new("C3 1|1");
        let batch = update_clips(&mut resolver, &["verse", "offline", "waltz"], &request).unwrap();

        let written: Vec<&str> = batch.results.iter().map(|r| r.clip_id.as_str()).collect();
        assert_eq!(written, vec!["verse", "waltz"]);
        assert_eq!(resolver.session.clip("verse").unwrap().store.notes().len(), 2);
        assert_eq!(resolver.session.clip("waltz").unwrap().store.notes().len(), 1);

        assert_eq!(batch.warnings.len(), 1);
        assert!(batch.warnings[0].contains("offline"));
        assert!(batch.warnings[0].contains("host is offline"));
    }

    #[test]
    fn bad_request_time_signature_writes_no_clip() {
        let mut session = session();
        let mut request = NoteUpdateRequest::new("C3 1|1");
        request.time_signature = Some("4/3".into());

        let err = update_clips(&mut session, &["verse", "waltz"], &request).unwrap_err();
        assert!(matches!(
            err,
            NoteError::Parse(ref e) if e.kind == ErrorKind::InvalidTimeSignature
        ));
        assert!(session.clip("verse").unwrap().store.operations().is_empty());
        assert!(session.clip("waltz").unwrap().store.operations().is_empty());
    }

    #[test]
    fn batch_result_serializes_camel_case() {
        let batch = BatchResult {
            results: vec![ClipUpdateResult {
                clip_id: "a".into(),
                note_count: 1,
            }],
            warnings: Vec::new(),
        };
        assert_eq!(
            serde_json::to_string(&batch).unwrap(),
            r#"{"results":[{"clipId":"a","noteCount":1}]}"#
        );
    }
}
