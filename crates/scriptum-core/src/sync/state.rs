//! Reducer-style state for the synchronization services.
//!
//! Every list-state change goes through [`NotesState::apply`] with an
//! explicit event, so each operation reads as `started -> settled` and the
//! collection invariants live in one place.

use crate::models::{Note, NoteId};

/// Snapshot state of the note collection plus request status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotesState {
    /// Notes in the order the backend returned them.
    pub notes: Vec<Note>,
    /// Whether an operation is currently in flight.
    pub is_loading: bool,
    /// Message from the most recent failure, cleared when a new operation
    /// starts.
    pub error: Option<String>,
}

/// Outcome events produced by the synchronization services.
#[derive(Debug, Clone, PartialEq)]
pub enum NotesEvent {
    /// An operation began; loading is on and any previous error is cleared.
    OperationStarted,
    /// A full reload succeeded; the collection is replaced wholesale.
    NotesLoaded(Vec<Note>),
    /// A create succeeded; the stored record is appended.
    NoteCreated(Note),
    /// An update succeeded; the matching entry is replaced with the
    /// authoritative record. Unknown ids leave the collection unchanged.
    NoteUpdated(Note),
    /// A delete succeeded; the matching entry is removed.
    NoteDeleted(NoteId),
    /// A read-through finished without touching the collection.
    OperationSettled,
    /// An operation failed; the collection keeps its previous value.
    OperationFailed(String),
    /// Teardown; everything resets to the initial state.
    Cleared,
}

impl NotesState {
    pub fn apply(&mut self, event: NotesEvent) {
        match event {
            NotesEvent::OperationStarted => {
                self.is_loading = true;
                self.error = None;
            }
            NotesEvent::NotesLoaded(notes) => {
                self.notes = notes;
                self.is_loading = false;
                self.error = None;
            }
            NotesEvent::NoteCreated(note) => {
                self.notes.push(note);
                self.is_loading = false;
            }
            NotesEvent::NoteUpdated(note) => {
                if let Some(entry) = self.notes.iter_mut().find(|entry| entry.id == note.id) {
                    *entry = note;
                }
                self.is_loading = false;
            }
            NotesEvent::NoteDeleted(id) => {
                self.notes.retain(|entry| entry.id != id);
                self.is_loading = false;
            }
            NotesEvent::OperationSettled => {
                self.is_loading = false;
            }
            NotesEvent::OperationFailed(message) => {
                self.error = Some(message);
                self.is_loading = false;
            }
            NotesEvent::Cleared => {
                *self = Self::default();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;

    fn note(id: &str, title: &str) -> Note {
        Note {
            id: id.parse().unwrap(),
            title: title.to_string(),
            content: String::new(),
            tags: Vec::new(),
            color: None,
            is_pinned: false,
            created_at: Utc.timestamp_millis_opt(0).unwrap(),
            modified_at: None,
        }
    }

    #[test]
    fn started_turns_loading_on_and_clears_error() {
        let mut state = NotesState {
            error: Some("previous failure".into()),
            ..NotesState::default()
        };

        state.apply(NotesEvent::OperationStarted);

        assert!(state.is_loading);
        assert_eq!(state.error, None);
    }

    #[test]
    fn loaded_replaces_the_collection_wholesale() {
        let mut state = NotesState {
            notes: vec![note("old", "Stale")],
            is_loading: true,
            error: None,
        };

        state.apply(NotesEvent::NotesLoaded(vec![note("n1", "One"), note("n2", "Two")]));

        assert_eq!(state.notes.len(), 2);
        assert_eq!(state.notes[0].id.as_str(), "n1");
        assert!(!state.is_loading);
    }

    #[test]
    fn created_appends_exactly_one_entry() {
        let mut state = NotesState {
            notes: vec![note("n1", "One")],
            is_loading: true,
            error: None,
        };

        state.apply(NotesEvent::NoteCreated(note("n2", "Two")));

        assert_eq!(state.notes.len(), 2);
        assert_eq!(state.notes[1].id.as_str(), "n2");
        assert!(!state.is_loading);
    }

    #[test]
    fn updated_replaces_the_matching_entry_in_place() {
        let mut state = NotesState {
            notes: vec![note("n1", "One"), note("n2", "Two")],
            is_loading: true,
            error: None,
        };

        state.apply(NotesEvent::NoteUpdated(note("n1", "One, revised")));

        assert_eq!(state.notes.len(), 2);
        assert_eq!(state.notes[0].title, "One, revised");
        assert_eq!(state.notes[1].title, "Two");
    }

    #[test]
    fn updated_with_unknown_id_leaves_the_collection_unchanged() {
        let mut state = NotesState {
            notes: vec![note("n1", "One")],
            is_loading: true,
            error: None,
        };

        state.apply(NotesEvent::NoteUpdated(note("ghost", "Never applied")));

        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.notes[0].title, "One");
        assert!(!state.is_loading);
    }

    #[test]
    fn deleted_removes_exactly_the_matching_entry() {
        let mut state = NotesState {
            notes: vec![note("n1", "One"), note("n2", "Two")],
            is_loading: true,
            error: None,
        };

        state.apply(NotesEvent::NoteDeleted("n1".parse().unwrap()));

        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.notes[0].id.as_str(), "n2");
    }

    #[test]
    fn failed_records_the_message_and_keeps_notes() {
        let mut state = NotesState {
            notes: vec![note("n1", "One")],
            is_loading: true,
            error: None,
        };

        state.apply(NotesEvent::OperationFailed("backend unavailable".into()));

        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.error.as_deref(), Some("backend unavailable"));
        assert!(!state.is_loading);
    }

    #[test]
    fn cleared_resets_to_the_initial_state() {
        let mut state = NotesState {
            notes: vec![note("n1", "One")],
            is_loading: true,
            error: Some("stale".into()),
        };

        state.apply(NotesEvent::Cleared);

        assert_eq!(state, NotesState::default());
    }
}
