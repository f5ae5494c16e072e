//! Data models for Scriptum

pub mod note;
pub mod tag;

pub use note::{sort_notes, Note, NoteDraft, NoteId, NotePatch};
pub use tag::{Tag, TagDraft, TagId, TagPatch};
