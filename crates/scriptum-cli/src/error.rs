use std::io;

use scriptum_core::auth::AuthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] scriptum_core::Error),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Edited note content cannot be empty")]
    EmptyEditedContent,
    #[error("Note ID cannot be empty")]
    EmptyNoteId,
    #[error("Search query cannot be empty")]
    EmptySearchQuery,
    #[error("Note not found for id/prefix: {0}")]
    NoteNotFound(String),
    #[error("{0}")]
    AmbiguousNoteId(String),
    #[error("Failed to load notes: {0}")]
    LoadFailed(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Not signed in. Run `scriptum auth login --email <email> --password <password>` first.")]
    NotSignedIn,
    #[error(
        "No remote API is configured. Run `scriptum config init --api-url <URL>` to enable remote mode, or set SCRIPTUM_API_URL."
    )]
    RemoteNotConfigured,
}
