//! Note model, typed inputs, and the display ordering shared by every client.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Minimum title length accepted for drafts and patches.
pub const TITLE_MIN_CHARS: usize = 2;
/// Minimum content length accepted for drafts and patches.
pub const CONTENT_MIN_CHARS: usize = 10;
/// Longest tag reference accepted on a note.
pub const TAG_MAX_CHARS: usize = 50;

/// Title shown for notes whose stored title is empty. Display-only; never
/// written back.
pub const UNTITLED_PLACEHOLDER: &str = "Untitled";

/// A unique identifier for a note.
///
/// Ids are opaque strings: the remote service assigns them on create, and
/// the local store generates a UUID v7 when running without a backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generate a fresh id for locally created notes.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Err(Error::InvalidInput("note id must not be empty".into()))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

/// A markdown note.
///
/// The serde shape is the wire shape: camelCase field names, RFC 3339
/// timestamps. The same shape is persisted by the local store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier, stable once created
    pub id: NoteId,
    /// Short text label; may be empty
    #[serde(default)]
    pub title: String,
    /// Markdown body
    #[serde(default)]
    pub content: String,
    /// Tag references by id; insertion order, no duplicates
    #[serde(default)]
    pub tags: Vec<String>,
    /// Display color (hex string); neutral default applied at display time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Pinned notes sort before unpinned ones
    #[serde(default)]
    pub is_pinned: bool,
    /// Set once at creation, immutable afterwards
    pub created_at: DateTime<Utc>,
    /// Updated on every successful mutation where tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Note {
    /// Title for list display; empty titles fall back to the placeholder.
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED_PLACEHOLDER
        } else {
            &self.title
        }
    }

    /// Whether this note references the given tag id.
    #[must_use]
    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|tag| tag == tag_id)
    }
}

/// Input for creating a note. Ids and timestamps are assigned by whichever
/// backend performs the create.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
}

impl NoteDraft {
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub const fn pinned(mut self, is_pinned: bool) -> Self {
        self.is_pinned = is_pinned;
        self
    }

    /// Drop duplicate tag references, keeping first occurrence order.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        dedup_tags(&mut self.tags);
        self
    }

    /// Check the draft against the input bounds before it is sent anywhere.
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_content(&self.content)?;
        validate_tags(&self.tags)
    }
}

/// Partial update for a note. Unset fields are left out of the request body
/// entirely, so nothing unknown or unchanged is ever sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}

impl NotePatch {
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub const fn with_pinned(mut self, is_pinned: bool) -> Self {
        self.is_pinned = Some(is_pinned);
        self
    }

    /// True when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.color.is_none()
            && self.is_pinned.is_none()
    }

    #[must_use]
    pub fn normalized(mut self) -> Self {
        if let Some(tags) = self.tags.as_mut() {
            dedup_tags(tags);
        }
        self
    }

    /// Check every set field against the input bounds. An entirely empty
    /// patch is rejected too.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::InvalidInput("update contains no fields".into()));
        }
        if let Some(title) = self.title.as_deref() {
            validate_title(title)?;
        }
        if let Some(content) = self.content.as_deref() {
            validate_content(content)?;
        }
        if let Some(tags) = self.tags.as_deref() {
            validate_tags(tags)?;
        }
        Ok(())
    }

    /// Merge the set fields into an existing note in place. Timestamps are
    /// the caller's concern.
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(content) = &self.content {
            note.content = content.clone();
        }
        if let Some(tags) = &self.tags {
            note.tags = tags.clone();
        }
        if let Some(color) = &self.color {
            note.color = Some(color.clone());
        }
        if let Some(is_pinned) = self.is_pinned {
            note.is_pinned = is_pinned;
        }
    }
}

/// Sort notes for display: pinned before unpinned, newest first within each
/// group. Returns a sorted copy; the sort is stable, so equal keys keep
/// their original relative order.
#[must_use]
pub fn sort_notes(notes: &[Note]) -> Vec<Note> {
    let mut sorted = notes.to_vec();
    sorted.sort_by_key(|note| (Reverse(note.is_pinned), Reverse(note.created_at)));
    sorted
}

fn dedup_tags(tags: &mut Vec<String>) {
    let mut seen = Vec::with_capacity(tags.len());
    tags.retain(|tag| {
        if seen.contains(tag) {
            false
        } else {
            seen.push(tag.clone());
            true
        }
    });
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().chars().count() < TITLE_MIN_CHARS {
        return Err(Error::InvalidInput(format!(
            "title must be at least {TITLE_MIN_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().chars().count() < CONTENT_MIN_CHARS {
        return Err(Error::InvalidInput(format!(
            "content must be at least {CONTENT_MIN_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<()> {
    for tag in tags {
        if tag.trim().is_empty() || tag.chars().count() > TAG_MAX_CHARS {
            return Err(Error::InvalidInput(format!(
                "tag reference '{tag}' must be 1-{TAG_MAX_CHARS} characters"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn note_at(id: &str, is_pinned: bool, created_at_ms: i64) -> Note {
        Note {
            id: id.parse().unwrap(),
            title: format!("note {id}"),
            content: "body".to_string(),
            tags: Vec::new(),
            color: None,
            is_pinned,
            created_at: Utc.timestamp_millis_opt(created_at_ms).unwrap(),
            modified_at: None,
        }
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(NoteId::generate(), NoteId::generate());
    }

    #[test]
    fn note_id_parse_rejects_blank() {
        assert!(" \t ".parse::<NoteId>().is_err());
        assert_eq!("  n1  ".parse::<NoteId>().unwrap().as_str(), "n1");
    }

    #[test]
    fn display_title_falls_back_to_placeholder() {
        let mut note = note_at("a", false, 0);
        note.title = "   ".to_string();
        assert_eq!(note.display_title(), UNTITLED_PLACEHOLDER);

        note.title = "Groceries".to_string();
        assert_eq!(note.display_title(), "Groceries");
    }

    #[test]
    fn sort_notes_places_pinned_first() {
        // B is newer but unpinned; A is pinned and older.
        let a = note_at("a", true, 1_000);
        let b = note_at("b", false, 2_000);

        let sorted = sort_notes(&[b.clone(), a.clone()]);
        assert_eq!(sorted, vec![a, b]);
    }

    #[test]
    fn sort_notes_orders_newest_first_within_group() {
        let older = note_at("older", false, 1_000);
        let newer = note_at("newer", false, 2_000);

        let sorted = sort_notes(&[older.clone(), newer.clone()]);
        assert_eq!(sorted, vec![newer, older]);
    }

    #[test]
    fn sort_notes_is_idempotent_and_stable() {
        let first = note_at("first", false, 1_000);
        let second = note_at("second", false, 1_000);
        let pinned = note_at("pinned", true, 500);

        let once = sort_notes(&[first.clone(), second.clone(), pinned.clone()]);
        let twice = sort_notes(&once);
        assert_eq!(once, twice);

        // Equal keys keep their original relative order.
        assert_eq!(once, vec![pinned, first, second]);
    }

    #[test]
    fn draft_validation_enforces_bounds() {
        assert!(NoteDraft::new("ok", "long enough body").validate().is_ok());
        assert!(NoteDraft::new("x", "long enough body").validate().is_err());
        assert!(NoteDraft::new("ok", "short").validate().is_err());
        assert!(NoteDraft::new("ok", "long enough body")
            .with_tags(vec![String::new()])
            .validate()
            .is_err());
    }

    #[test]
    fn draft_normalization_drops_duplicate_tags() {
        let draft = NoteDraft::new("ok", "long enough body")
            .with_tags(vec!["t1".into(), "t2".into(), "t1".into()])
            .normalized();
        assert_eq!(draft.tags, vec!["t1".to_string(), "t2".to_string()]);
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(NotePatch::default().validate().is_err());
        assert!(NotePatch::default().with_pinned(true).validate().is_ok());
    }

    #[test]
    fn patch_applies_only_set_fields() {
        let mut note = note_at("a", false, 1_000);
        note.color = Some("#aabbcc".to_string());

        NotePatch::default()
            .with_title("Renamed title")
            .with_pinned(true)
            .apply_to(&mut note);

        assert_eq!(note.title, "Renamed title");
        assert!(note.is_pinned);
        assert_eq!(note.content, "body");
        assert_eq!(note.color.as_deref(), Some("#aabbcc"));
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = NotePatch::default().with_title("New title");
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, serde_json::json!({ "title": "New title" }));
    }

    #[test]
    fn note_wire_shape_is_camel_case() {
        let note = note_at("n1", true, 86_400_000);
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["isPinned"], serde_json::json!(true));
        assert_eq!(value["createdAt"], serde_json::json!("1970-01-02T00:00:00Z"));
        assert!(value.get("color").is_none());
    }
}
