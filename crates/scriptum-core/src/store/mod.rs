//! Durable local note store used when no remote backend is configured.
//!
//! The collection lives in a single JSON file with an explicit schema
//! version. All operations are synchronous and there is no authentication
//! gate; mutations write through to disk immediately.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{sort_notes, Note, NoteDraft, NoteId, NotePatch};

/// Current on-disk schema version. Version 1 stored timestamps as epoch
/// milliseconds; version 2 stores RFC 3339 strings.
pub const STORE_VERSION: u32 = 2;

/// Synchronous note store backed by a versioned JSON file.
pub struct LocalNoteStore {
    path: PathBuf,
    notes: Mutex<Vec<Note>>,
}

impl LocalNoteStore {
    /// Open the store at `path`, creating an empty collection when no file
    /// exists yet and migrating older schema versions in place.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let (notes, migrated) = match fs::read_to_string(&path) {
            Ok(text) => parse_store_payload(&text)?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => (Vec::new(), false),
            Err(error) => return Err(error.into()),
        };

        let store = Self {
            path,
            notes: Mutex::new(notes),
        };
        if migrated {
            tracing::info!(path = %store.path.display(), "Migrated local note store to version {STORE_VERSION}");
            store.persist(&store.lock())?;
        }
        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the collection in insertion order.
    #[must_use]
    pub fn notes(&self) -> Vec<Note> {
        self.lock().clone()
    }

    /// The sort view: pinned first, newest first within each group.
    #[must_use]
    pub fn sorted_notes(&self) -> Vec<Note> {
        sort_notes(&self.lock())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Append a new note with a locally generated id and creation timestamp.
    pub fn add_note(&self, draft: NoteDraft) -> Result<Note> {
        let draft = draft.normalized();
        let note = Note {
            id: NoteId::generate(),
            title: draft.title,
            content: draft.content,
            tags: draft.tags,
            color: draft.color,
            is_pinned: draft.is_pinned,
            created_at: Utc::now(),
            modified_at: None,
        };

        let mut notes = self.lock();
        notes.push(note.clone());
        self.persist(&notes)?;
        Ok(note)
    }

    /// Look up a note by id.
    #[must_use]
    pub fn get_note(&self, id: &NoteId) -> Option<Note> {
        self.lock().iter().find(|note| &note.id == id).cloned()
    }

    /// Merge the patch into the matching note in place; silent no-op when
    /// the id is not present.
    pub fn update_note(&self, id: &NoteId, patch: &NotePatch) -> Result<()> {
        let patch = patch.clone().normalized();
        let mut notes = self.lock();
        let Some(note) = notes.iter_mut().find(|note| &note.id == id) else {
            return Ok(());
        };
        patch.apply_to(note);
        note.modified_at = Some(Utc::now());
        self.persist(&notes)
    }

    /// Remove the matching note; silent no-op when the id is not present.
    pub fn delete_note(&self, id: &NoteId) -> Result<()> {
        let mut notes = self.lock();
        let before = notes.len();
        notes.retain(|note| &note.id != id);
        if notes.len() == before {
            return Ok(());
        }
        self.persist(&notes)
    }

    /// Flip the pin flag; silent no-op when the id is not present.
    pub fn toggle_pin(&self, id: &NoteId) -> Result<()> {
        let mut notes = self.lock();
        let Some(note) = notes.iter_mut().find(|note| &note.id == id) else {
            return Ok(());
        };
        note.is_pinned = !note.is_pinned;
        note.modified_at = Some(Utc::now());
        self.persist(&notes)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Note>> {
        self.notes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, notes: &[Note]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = StorePayload {
            version: STORE_VERSION,
            notes,
        };
        fs::write(&self.path, serde_json::to_string_pretty(&payload)?)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct StorePayload<'a> {
    version: u32,
    notes: &'a [Note],
}

#[derive(Deserialize)]
struct RawStoreFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    notes: serde_json::Value,
}

/// Notes as persisted by schema version 1, with epoch-millisecond
/// timestamps.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyNoteV1 {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    is_pinned: bool,
    created_at: i64,
    #[serde(default)]
    modified_at: Option<i64>,
}

impl LegacyNoteV1 {
    fn into_note(self) -> Result<Note> {
        let created_at = timestamp_from_millis(self.created_at)?;
        let modified_at = self.modified_at.map(timestamp_from_millis).transpose()?;
        Ok(Note {
            id: self.id.parse()?,
            title: self.title,
            content: self.content,
            tags: self.tags,
            color: self.color,
            is_pinned: self.is_pinned,
            created_at,
            modified_at,
        })
    }
}

fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| Error::Store(format!("invalid stored timestamp {millis}")))
}

/// Parse a persisted payload, returning the notes plus whether the on-disk
/// form needs rewriting at the current version.
fn parse_store_payload(text: &str) -> Result<(Vec<Note>, bool)> {
    let raw: RawStoreFile =
        serde_json::from_str(text).map_err(|error| Error::Store(format!("unreadable store file: {error}")))?;

    match raw.version {
        // Payloads from before the schema tag reset to an empty collection.
        0 => Ok((Vec::new(), true)),
        1 => {
            let legacy: Vec<LegacyNoteV1> = serde_json::from_value(raw.notes)?;
            let notes = legacy
                .into_iter()
                .map(LegacyNoteV1::into_note)
                .collect::<Result<Vec<_>>>()?;
            Ok((notes, true))
        }
        STORE_VERSION => {
            let notes: Vec<Note> = serde_json::from_value(raw.notes)?;
            Ok((notes, false))
        }
        newer => Err(Error::Store(format!(
            "store version {newer} is newer than supported version {STORE_VERSION}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn temp_store_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("notes.json")
    }

    fn draft() -> NoteDraft {
        NoteDraft::new("Groceries", "Milk, eggs, and bread")
    }

    #[test]
    fn open_without_file_initializes_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalNoteStore::open(temp_store_path(&dir)).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn notes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_store_path(&dir);

        let created = {
            let store = LocalNoteStore::open(&path).unwrap();
            store.add_note(draft()).unwrap()
        };

        let reopened = LocalNoteStore::open(&path).unwrap();
        assert_eq!(reopened.notes(), vec![created]);

        let text = fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(raw["version"], serde_json::json!(STORE_VERSION));
    }

    #[test]
    fn add_note_assigns_unique_ids_and_drops_duplicate_tags() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalNoteStore::open(temp_store_path(&dir)).unwrap();

        let first = store
            .add_note(draft().with_tags(vec!["t1".into(), "t1".into()]))
            .unwrap();
        let second = store.add_note(draft()).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.tags, vec!["t1".to_string()]);
        assert!(first.modified_at.is_none());
    }

    #[test]
    fn update_merges_fields_and_touches_modified_at() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalNoteStore::open(temp_store_path(&dir)).unwrap();
        let note = store.add_note(draft()).unwrap();

        store
            .update_note(&note.id, &NotePatch::default().with_title("Shopping"))
            .unwrap();

        let updated = store.get_note(&note.id).unwrap();
        assert_eq!(updated.title, "Shopping");
        assert_eq!(updated.content, note.content);
        assert_eq!(updated.created_at, note.created_at);
        assert!(updated.modified_at.is_some());
    }

    #[test]
    fn update_missing_id_leaves_collection_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalNoteStore::open(temp_store_path(&dir)).unwrap();
        let note = store.add_note(draft()).unwrap();

        store
            .update_note(
                &"missing".parse().unwrap(),
                &NotePatch::default().with_title("Never applied"),
            )
            .unwrap();

        assert_eq!(store.notes(), vec![note]);
    }

    #[test]
    fn delete_missing_id_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalNoteStore::open(temp_store_path(&dir)).unwrap();
        let note = store.add_note(draft()).unwrap();

        store.delete_note(&"missing".parse().unwrap()).unwrap();
        assert_eq!(store.len(), 1);

        store.delete_note(&note.id).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn toggle_pin_flips_flag() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalNoteStore::open(temp_store_path(&dir)).unwrap();
        let note = store.add_note(draft()).unwrap();

        store.toggle_pin(&note.id).unwrap();
        assert!(store.get_note(&note.id).unwrap().is_pinned);

        store.toggle_pin(&note.id).unwrap();
        assert!(!store.get_note(&note.id).unwrap().is_pinned);
    }

    #[test]
    fn sorted_notes_places_pinned_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalNoteStore::open(temp_store_path(&dir)).unwrap();

        let older = store.add_note(draft()).unwrap();
        let newer = store
            .add_note(NoteDraft::new("Second", "Written slightly later"))
            .unwrap();
        store.toggle_pin(&older.id).unwrap();

        let sorted = store.sorted_notes();
        assert_eq!(sorted[0].id, older.id);
        assert_eq!(sorted[1].id, newer.id);
    }

    #[test]
    fn migrates_version_1_epoch_millisecond_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_store_path(&dir);
        fs::write(
            &path,
            r#"{
                "version": 1,
                "notes": [{
                    "id": "legacy-1",
                    "title": "Old note",
                    "content": "Written before the schema change",
                    "isPinned": true,
                    "createdAt": 86400000
                }]
            }"#,
        )
        .unwrap();

        let store = LocalNoteStore::open(&path).unwrap();
        let notes = store.notes();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id.as_str(), "legacy-1");
        assert!(notes[0].is_pinned);
        assert_eq!(
            notes[0].created_at,
            Utc.timestamp_millis_opt(86_400_000).unwrap()
        );
        assert!(notes[0].modified_at.is_none());

        // The file is rewritten at the current version on migration.
        let text = fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(raw["version"], serde_json::json!(STORE_VERSION));
        assert_eq!(
            raw["notes"][0]["createdAt"],
            serde_json::json!("1970-01-02T00:00:00Z")
        );
    }

    #[test]
    fn version_zero_payload_resets_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_store_path(&dir);
        fs::write(&path, r#"{"notes": [{"id": "x"}]}"#).unwrap();

        let store = LocalNoteStore::open(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn newer_store_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_store_path(&dir);
        fs::write(&path, r#"{"version": 99, "notes": []}"#).unwrap();

        assert!(matches!(
            LocalNoteStore::open(&path),
            Err(Error::Store(_))
        ));
    }

    #[test]
    fn unreadable_file_is_an_error_not_a_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_store_path(&dir);
        fs::write(&path, "not json at all").unwrap();

        assert!(LocalNoteStore::open(&path).is_err());
    }
}
