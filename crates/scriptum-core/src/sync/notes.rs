//! Note synchronization service.
//!
//! Mediates between callers and the configured backend: every operation
//! runs against the [`NoteRepository`] chosen at construction time, and on
//! success the in-memory collection is updated through a reducer event so
//! callers always read a consistent snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::auth::AuthContext;
use crate::error::{Error, Result};
use crate::models::{sort_notes, Note, NoteDraft, NoteId, NotePatch, TagId};
use crate::remote::NoteServiceClient;
use crate::repository::NoteRepository;
use crate::store::LocalNoteStore;
use crate::sync::state::{NotesEvent, NotesState};

/// Cheaply cloneable handle to the shared note collection and its request
/// state.
#[derive(Clone)]
pub struct NotesService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    repository: Arc<dyn NoteRepository>,
    auth: Option<AuthContext>,
    state: Mutex<NotesState>,
    generation: AtomicU64,
}

impl NotesService {
    /// Service over an arbitrary backend. When `auth` is present every
    /// operation is gated on an active session; local-store callers pass
    /// `None`.
    #[must_use]
    pub fn new(repository: Arc<dyn NoteRepository>, auth: Option<AuthContext>) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                repository,
                auth,
                state: Mutex::new(NotesState::default()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Service backed by the remote note API, gated on the client's session
    /// context.
    #[must_use]
    pub fn remote(client: NoteServiceClient) -> Self {
        let auth = client.context().clone();
        Self::new(Arc::new(client), Some(auth))
    }

    /// Service backed by the local persisted store.
    #[must_use]
    pub fn local(store: LocalNoteStore) -> Self {
        Self::new(Arc::new(store), None)
    }

    /// Snapshot of the collection in backend order.
    #[must_use]
    pub fn notes(&self) -> Vec<Note> {
        self.lock().notes.clone()
    }

    /// Snapshot sorted for display: pinned first, newest first.
    #[must_use]
    pub fn sorted_notes(&self) -> Vec<Note> {
        sort_notes(&self.lock().notes)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    /// Message from the most recent failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Full state snapshot.
    #[must_use]
    pub fn state(&self) -> NotesState {
        self.lock().clone()
    }

    /// Refresh the collection from the backend.
    ///
    /// Failures land in [`Self::error`] and the log rather than the return
    /// value, so a periodic refresh cannot bubble errors into callers.
    /// Without an active session the collection resets to empty.
    pub async fn load_notes(&self) {
        if !self.has_session() {
            tracing::debug!("No active session; clearing note collection");
            self.lock().apply(NotesEvent::Cleared);
            return;
        }

        let generation = self.generation();
        self.lock().apply(NotesEvent::OperationStarted);
        match self.inner.repository.list().await {
            Ok(notes) => {
                self.apply_if_current(generation, NotesEvent::NotesLoaded(notes));
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to load notes");
                self.apply_if_current(generation, NotesEvent::OperationFailed(error.to_string()));
            }
        }
    }

    /// Validate and create a note, appending the stored record to the
    /// collection.
    pub async fn create_note(&self, draft: NoteDraft) -> Result<Note> {
        self.require_session()?;
        let draft = draft.normalized();
        draft.validate()?;

        let generation = self.generation();
        self.lock().apply(NotesEvent::OperationStarted);
        match self.inner.repository.create(&draft).await {
            Ok(note) => {
                self.apply_if_current(generation, NotesEvent::NoteCreated(note.clone()));
                Ok(note)
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to create note");
                self.apply_if_current(generation, NotesEvent::OperationFailed(error.to_string()));
                Err(error)
            }
        }
    }

    /// Apply a patch and replace the matching entry with the authoritative
    /// record the backend returns.
    pub async fn update_note(&self, id: &NoteId, patch: NotePatch) -> Result<Note> {
        self.require_session()?;
        let patch = patch.normalized();
        patch.validate()?;

        let generation = self.generation();
        self.lock().apply(NotesEvent::OperationStarted);
        match self.inner.repository.update(id, &patch).await {
            Ok(note) => {
                self.apply_if_current(generation, NotesEvent::NoteUpdated(note.clone()));
                Ok(note)
            }
            Err(error) => {
                tracing::warn!(%error, note = %id, "Failed to update note");
                self.apply_if_current(generation, NotesEvent::OperationFailed(error.to_string()));
                Err(error)
            }
        }
    }

    /// Delete a note and drop the matching entry from the collection.
    pub async fn delete_note(&self, id: &NoteId) -> Result<()> {
        self.require_session()?;

        let generation = self.generation();
        self.lock().apply(NotesEvent::OperationStarted);
        match self.inner.repository.delete(id).await {
            Ok(()) => {
                self.apply_if_current(generation, NotesEvent::NoteDeleted(id.clone()));
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, note = %id, "Failed to delete note");
                self.apply_if_current(generation, NotesEvent::OperationFailed(error.to_string()));
                Err(error)
            }
        }
    }

    /// Fetch a single note without touching the cached collection.
    pub async fn get_note(&self, id: &NoteId) -> Result<Note> {
        self.require_session()?;

        let generation = self.generation();
        self.lock().apply(NotesEvent::OperationStarted);
        match self.inner.repository.get(id).await {
            Ok(Some(note)) => {
                self.apply_if_current(generation, NotesEvent::OperationSettled);
                Ok(note)
            }
            Ok(None) => {
                let error = Error::NotFound(format!("note {id} not found"));
                self.apply_if_current(generation, NotesEvent::OperationFailed(error.to_string()));
                Err(error)
            }
            Err(error) => {
                tracing::warn!(%error, note = %id, "Failed to fetch note");
                self.apply_if_current(generation, NotesEvent::OperationFailed(error.to_string()));
                Err(error)
            }
        }
    }

    /// Notes carrying the given tag. Results are returned to the caller
    /// and never replace the cached collection.
    pub async fn notes_by_tag(&self, tag: &TagId) -> Result<Vec<Note>> {
        self.require_session()?;
        self.inner.repository.list_by_tag(tag).await
    }

    /// Case-insensitive title search; results are returned, not cached.
    pub async fn search_by_title(&self, query: &str) -> Result<Vec<Note>> {
        self.require_session()?;
        self.inner.repository.search_title(query).await
    }

    /// Case-insensitive content search; results are returned, not cached.
    pub async fn search_by_content(&self, query: &str) -> Result<Vec<Note>> {
        self.require_session()?;
        self.inner.repository.search_content(query).await
    }

    /// Teardown: discard the collection and invalidate in-flight
    /// operations so their settle-time updates are dropped.
    pub fn reset(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.lock().apply(NotesEvent::Cleared);
    }

    fn has_session(&self) -> bool {
        match &self.inner.auth {
            Some(auth) => auth.is_authenticated(),
            None => true,
        }
    }

    fn require_session(&self) -> Result<()> {
        if self.has_session() {
            Ok(())
        } else {
            Err(Error::AuthRequired)
        }
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    // The generation is re-checked under the state lock so a concurrent
    // reset either happens before the check or after the whole apply.
    fn apply_if_current(&self, generation: u64, event: NotesEvent) {
        let mut state = self.lock();
        if self.inner.generation.load(Ordering::SeqCst) == generation {
            state.apply(event);
        } else {
            tracing::debug!("Discarding state transition from a stale operation");
        }
    }

    fn lock(&self) -> MutexGuard<'_, NotesState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
