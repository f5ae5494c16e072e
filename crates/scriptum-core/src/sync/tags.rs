//! Tag synchronization service.
//!
//! Tags live only on the remote service; there is no local fallback. The
//! service mirrors the note layer's contract: `load_tags` reports failures
//! through the snapshot state, every other operation also returns them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::auth::AuthContext;
use crate::error::{Error, Result};
use crate::models::{Tag, TagDraft, TagId, TagPatch};
use crate::remote::NoteServiceClient;

/// Snapshot state of the tag collection plus request status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagsState {
    pub tags: Vec<Tag>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum TagsEvent {
    Started,
    Loaded(Vec<Tag>),
    Created(Tag),
    Updated(Tag),
    Deleted(TagId),
    Settled,
    Failed(String),
    Cleared,
}

impl TagsState {
    fn apply(&mut self, event: TagsEvent) {
        match event {
            TagsEvent::Started => {
                self.is_loading = true;
                self.error = None;
            }
            TagsEvent::Loaded(tags) => {
                self.tags = tags;
                self.is_loading = false;
                self.error = None;
            }
            TagsEvent::Created(tag) => {
                self.tags.push(tag);
                self.is_loading = false;
            }
            TagsEvent::Updated(tag) => {
                if let Some(entry) = self.tags.iter_mut().find(|entry| entry.id == tag.id) {
                    *entry = tag;
                }
                self.is_loading = false;
            }
            TagsEvent::Deleted(id) => {
                self.tags.retain(|entry| entry.id != id);
                self.is_loading = false;
            }
            TagsEvent::Settled => {
                self.is_loading = false;
            }
            TagsEvent::Failed(message) => {
                self.error = Some(message);
                self.is_loading = false;
            }
            TagsEvent::Cleared => {
                *self = Self::default();
            }
        }
    }
}

/// Cheaply cloneable handle to the shared tag collection.
#[derive(Clone)]
pub struct TagsService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    client: NoteServiceClient,
    auth: AuthContext,
    state: Mutex<TagsState>,
    generation: AtomicU64,
}

impl TagsService {
    #[must_use]
    pub fn new(client: NoteServiceClient) -> Self {
        let auth = client.context().clone();
        Self {
            inner: Arc::new(ServiceInner {
                client,
                auth,
                state: Mutex::new(TagsState::default()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Snapshot of the tag collection in backend order.
    #[must_use]
    pub fn tags(&self) -> Vec<Tag> {
        self.lock().tags.clone()
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
    pub fn state(&self) -> TagsState {
        self.lock().clone()
    }

    /// Refresh the collection; failures land in [`Self::error`] and the log
    /// rather than the return value. Without an active session the
    /// collection resets to empty.
    pub async fn load_tags(&self) {
        if !self.inner.auth.is_authenticated() {
            tracing::debug!("No active session; clearing tag collection");
            self.lock().apply(TagsEvent::Cleared);
            return;
        }

        let generation = self.generation();
        self.lock().apply(TagsEvent::Started);
        match self.inner.client.list_tags().await {
            Ok(tags) => {
                self.apply_if_current(generation, TagsEvent::Loaded(tags));
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to load tags");
                self.apply_if_current(generation, TagsEvent::Failed(error.to_string()));
            }
        }
    }

    /// Validate and create a tag, appending the stored record.
    pub async fn create_tag(&self, draft: TagDraft) -> Result<Tag> {
        self.require_session()?;
        draft.validate()?;

        let generation = self.generation();
        self.lock().apply(TagsEvent::Started);
        match self.inner.client.create_tag(&draft).await {
            Ok(tag) => {
                self.apply_if_current(generation, TagsEvent::Created(tag.clone()));
                Ok(tag)
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to create tag");
                self.apply_if_current(generation, TagsEvent::Failed(error.to_string()));
                Err(error)
            }
        }
    }

    /// Apply a patch and replace the matching entry with the authoritative
    /// record.
    pub async fn update_tag(&self, id: &TagId, patch: TagPatch) -> Result<Tag> {
        self.require_session()?;
        patch.validate()?;

        let generation = self.generation();
        self.lock().apply(TagsEvent::Started);
        match self.inner.client.update_tag(id, &patch).await {
            Ok(tag) => {
                self.apply_if_current(generation, TagsEvent::Updated(tag.clone()));
                Ok(tag)
            }
            Err(error) => {
                tracing::warn!(%error, tag = %id, "Failed to update tag");
                self.apply_if_current(generation, TagsEvent::Failed(error.to_string()));
                Err(error)
            }
        }
    }

    /// Delete a tag and drop the matching entry.
    pub async fn delete_tag(&self, id: &TagId) -> Result<()> {
        self.require_session()?;

        let generation = self.generation();
        self.lock().apply(TagsEvent::Started);
        match self.inner.client.delete_tag(id).await {
            Ok(()) => {
                self.apply_if_current(generation, TagsEvent::Deleted(id.clone()));
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, tag = %id, "Failed to delete tag");
                self.apply_if_current(generation, TagsEvent::Failed(error.to_string()));
                Err(error)
            }
        }
    }

    /// Fetch a single tag without touching the cached collection.
    pub async fn get_tag(&self, id: &TagId) -> Result<Tag> {
        self.require_session()?;

        let generation = self.generation();
        self.lock().apply(TagsEvent::Started);
        match self.inner.client.fetch_tag(id).await {
            Ok(Some(tag)) => {
                self.apply_if_current(generation, TagsEvent::Settled);
                Ok(tag)
            }
            Ok(None) => {
                let error = Error::NotFound(format!("tag {id} not found"));
                self.apply_if_current(generation, TagsEvent::Failed(error.to_string()));
                Err(error)
            }
            Err(error) => {
                tracing::warn!(%error, tag = %id, "Failed to fetch tag");
                self.apply_if_current(generation, TagsEvent::Failed(error.to_string()));
                Err(error)
            }
        }
    }

    /// Case-insensitive name search; results are returned, not cached.
    pub async fn search_by_name(&self, query: &str) -> Result<Vec<Tag>> {
        self.require_session()?;
        self.inner.client.search_tags_by_name(query).await
    }

    /// Teardown: discard the collection and invalidate in-flight
    /// operations.
    pub fn reset(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.lock().apply(TagsEvent::Cleared);
    }

    fn require_session(&self) -> Result<()> {
        if self.inner.auth.is_authenticated() {
            Ok(())
        } else {
            Err(Error::AuthRequired)
        }
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    fn apply_if_current(&self, generation: u64, event: TagsEvent) {
        let mut state = self.lock();
        if self.inner.generation.load(Ordering::SeqCst) == generation {
            state.apply(event);
        } else {
            tracing::debug!("Discarding state transition from a stale operation");
        }
    }

    fn lock(&self) -> MutexGuard<'_, TagsState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::auth::MemorySessionStore;

    fn tag(id: &str, name: &str) -> Tag {
        Tag {
            id: id.parse().unwrap(),
            name: name.to_string(),
            color: None,
            created_at: Utc.timestamp_millis_opt(0).unwrap(),
            modified_at: None,
        }
    }

    fn signed_out_service() -> TagsService {
        let context = AuthContext::new(MemorySessionStore::default());
        let client = NoteServiceClient::new("http://localhost:9", context).unwrap();
        TagsService::new(client)
    }

    #[test]
    fn reducer_replaces_and_appends() {
        let mut state = TagsState::default();

        state.apply(TagsEvent::Started);
        assert!(state.is_loading);

        state.apply(TagsEvent::Loaded(vec![tag("t1", "work")]));
        assert_eq!(state.tags.len(), 1);
        assert!(!state.is_loading);

        state.apply(TagsEvent::Created(tag("t2", "home")));
        assert_eq!(state.tags.len(), 2);

        state.apply(TagsEvent::Updated(tag("t1", "office")));
        assert_eq!(state.tags[0].name, "office");
        assert_eq!(state.tags.len(), 2);

        state.apply(TagsEvent::Deleted("t2".parse().unwrap()));
        assert_eq!(state.tags.len(), 1);
    }

    #[test]
    fn reducer_records_failures_and_clears() {
        let mut state = TagsState {
            tags: vec![tag("t1", "work")],
            is_loading: true,
            error: None,
        };

        state.apply(TagsEvent::Failed("backend unavailable".into()));
        assert_eq!(state.tags.len(), 1);
        assert_eq!(state.error.as_deref(), Some("backend unavailable"));

        state.apply(TagsEvent::Cleared);
        assert_eq!(state, TagsState::default());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn load_tags_without_a_session_resets_empty() {
        let service = signed_out_service();

        service.load_tags().await;

        assert!(service.tags().is_empty());
        assert_eq!(service.error(), None);
        assert!(!service.is_loading());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn mutations_fail_fast_without_a_session() {
        let service = signed_out_service();

        let result = service.create_tag(TagDraft::new("work")).await;

        assert!(matches!(result, Err(Error::AuthRequired)));
        assert_eq!(service.state(), TagsState::default());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn update_checks_the_session_before_anything_else() {
        let service = signed_out_service();

        let result = service
            .update_tag(&"t1".parse().unwrap(), TagPatch::default())
            .await;

        assert!(matches!(result, Err(Error::AuthRequired)));
        assert_eq!(service.state(), TagsState::default());
    }
}
