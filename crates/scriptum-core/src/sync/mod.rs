//! Synchronization services over the configured note backend.

pub mod notes;
pub mod state;
pub mod tags;

pub use notes::NotesService;
pub use state::{NotesEvent, NotesState};
pub use tags::{TagsService, TagsState};
