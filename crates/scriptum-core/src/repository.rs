//! Note storage capability shared by the remote client and the local store.
//!
//! The synchronization layer talks to this trait only, so the backend is
//! fixed at construction time rather than probed per call.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::{Note, NoteDraft, NoteId, NotePatch, TagId};
use crate::remote::NoteServiceClient;
use crate::store::LocalNoteStore;

/// Backend-neutral note operations. Query operations live here too so the
/// synchronization layer has a single call surface in both modes.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// All notes visible to the caller.
    async fn list(&self) -> Result<Vec<Note>>;

    /// Create a note and return the authoritative stored record.
    async fn create(&self, draft: &NoteDraft) -> Result<Note>;

    /// Apply a patch and return the updated record. Unlike the local
    /// store's inherent API, an unknown id is an error here so both
    /// backends report the same thing.
    async fn update(&self, id: &NoteId, patch: &NotePatch) -> Result<Note>;

    /// Remove a note. Removal of an unknown id is not an error.
    async fn delete(&self, id: &NoteId) -> Result<()>;

    /// Look up a single note; `None` when it does not exist.
    async fn get(&self, id: &NoteId) -> Result<Option<Note>>;

    /// Notes carrying the given tag.
    async fn list_by_tag(&self, tag: &TagId) -> Result<Vec<Note>>;

    /// Case-insensitive title search.
    async fn search_title(&self, query: &str) -> Result<Vec<Note>>;

    /// Case-insensitive content search.
    async fn search_content(&self, query: &str) -> Result<Vec<Note>>;
}

#[async_trait]
impl NoteRepository for NoteServiceClient {
    async fn list(&self) -> Result<Vec<Note>> {
        self.list_notes().await
    }

    async fn create(&self, draft: &NoteDraft) -> Result<Note> {
        self.create_note(draft).await
    }

    async fn update(&self, id: &NoteId, patch: &NotePatch) -> Result<Note> {
        self.update_note(id, patch).await
    }

    async fn delete(&self, id: &NoteId) -> Result<()> {
        self.delete_note(id).await
    }

    async fn get(&self, id: &NoteId) -> Result<Option<Note>> {
        self.fetch_note(id).await
    }

    async fn list_by_tag(&self, tag: &TagId) -> Result<Vec<Note>> {
        self.notes_by_tag(tag).await
    }

    async fn search_title(&self, query: &str) -> Result<Vec<Note>> {
        self.search_notes_by_title(query).await
    }

    async fn search_content(&self, query: &str) -> Result<Vec<Note>> {
        self.search_notes_by_content(query).await
    }
}

#[async_trait]
impl NoteRepository for LocalNoteStore {
    async fn list(&self) -> Result<Vec<Note>> {
        Ok(self.notes())
    }

    async fn create(&self, draft: &NoteDraft) -> Result<Note> {
        self.add_note(draft.clone())
    }

    async fn update(&self, id: &NoteId, patch: &NotePatch) -> Result<Note> {
        if self.get_note(id).is_none() {
            return Err(Error::NotFound(format!("note {id} not found")));
        }
        self.update_note(id, patch)?;
        self.get_note(id)
            .ok_or_else(|| Error::NotFound(format!("note {id} not found")))
    }

    async fn delete(&self, id: &NoteId) -> Result<()> {
        self.delete_note(id)
    }

    async fn get(&self, id: &NoteId) -> Result<Option<Note>> {
        Ok(self.get_note(id))
    }

    async fn list_by_tag(&self, tag: &TagId) -> Result<Vec<Note>> {
        Ok(self
            .notes()
            .into_iter()
            .filter(|note| note.has_tag(tag.as_str()))
            .collect())
    }

    async fn search_title(&self, query: &str) -> Result<Vec<Note>> {
        let needle = query.to_lowercase();
        Ok(self
            .notes()
            .into_iter()
            .filter(|note| note.title.to_lowercase().contains(&needle))
            .collect())
    }

    async fn search_content(&self, query: &str) -> Result<Vec<Note>> {
        let needle = query.to_lowercase();
        Ok(self
            .notes()
            .into_iter()
            .filter(|note| note.content.to_lowercase().contains(&needle))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::NoteDraft;

    fn open_store(dir: &tempfile::TempDir) -> LocalNoteStore {
        LocalNoteStore::open(dir.path().join("notes.json")).unwrap()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn local_update_reports_missing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let result = store
            .update(
                &"missing".parse().unwrap(),
                &NotePatch::default().with_title("New title"),
            )
            .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn local_update_returns_the_merged_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let note = store
            .add_note(NoteDraft::new("Groceries", "Milk, eggs, and bread"))
            .unwrap();

        let updated = store
            .update(&note.id, &NotePatch::default().with_pinned(true))
            .await
            .unwrap();

        assert!(updated.is_pinned);
        assert_eq!(updated.title, note.title);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn local_searches_are_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        store
            .add_note(NoteDraft::new("Reading List", "Start with The Rust Book"))
            .unwrap();
        store
            .add_note(NoteDraft::new("Groceries", "Milk, eggs, and bread"))
            .unwrap();

        let by_title = store.search_title("reading").await.unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].title, "Reading List");

        let by_content = store.search_content("RUST").await.unwrap();
        assert_eq!(by_content.len(), 1);

        assert!(store.search_title("missing").await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn local_tag_listing_matches_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        store
            .add_note(
                NoteDraft::new("Groceries", "Milk, eggs, and bread")
                    .with_tags(vec!["errands".into()]),
            )
            .unwrap();
        store
            .add_note(NoteDraft::new("Journal", "Quiet day, mostly reading"))
            .unwrap();

        let tagged = store.list_by_tag(&"errands".parse().unwrap()).await.unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].title, "Groceries");

        let other = store.list_by_tag(&"errand".parse().unwrap()).await.unwrap();
        assert!(other.is_empty());
    }
}
