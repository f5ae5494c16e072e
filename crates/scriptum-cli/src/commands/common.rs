//! Shared helpers for CLI commands.

use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use scriptum_core::auth::{AuthClient, AuthContext};
use scriptum_core::models::{sort_notes, Note, NoteId, Tag};
use scriptum_core::remote::NoteServiceClient;
use scriptum_core::store::LocalNoteStore;
use scriptum_core::sync::{NotesService, TagsService};
use scriptum_core::util::markdown_preview;
use serde::Serialize;

use crate::config_profiles::{normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;
use crate::session::SessionStore;

pub const SHORT_ID_CHARS: usize = 13;
pub const LIST_TITLE_CHARS: usize = 30;
pub const JSON_PREVIEW_CHARS: usize = 120;

/// Services for one invocation: remote API when the resolved profile
/// carries a base URL, otherwise the local persisted store.
pub struct Workspace {
    pub notes: NotesService,
    tags: Option<TagsService>,
    context: Option<AuthContext>,
}

impl Workspace {
    /// Tag operations exist only against the remote service.
    pub fn tags(&self) -> Result<&TagsService, CliError> {
        self.tags.as_ref().ok_or(CliError::RemoteNotConfigured)
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        self.context.is_some()
    }

    /// Remote mode requires a stored session; local mode never does.
    pub fn require_signed_in(&self) -> Result<(), CliError> {
        match &self.context {
            Some(context) if !context.is_authenticated() => Err(CliError::NotSignedIn),
            _ => Ok(()),
        }
    }
}

pub fn load_profile(explicit: Option<&str>) -> Result<(String, CliProfile), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(explicit);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();
    Ok((profile_name, profile))
}

pub fn open_workspace(
    profile_flag: Option<&str>,
    store_path_flag: Option<&Path>,
) -> Result<Workspace, CliError> {
    let (profile_name, profile) = load_profile(profile_flag)?;

    if let Some(base_url) = resolve_api_base_url(&profile) {
        let context = AuthContext::restore(SessionStore::new(&profile_name))?;
        context.on_deauth(|| {
            eprintln!(
                "Session rejected by the server; stored credentials were cleared. Run `scriptum auth login` to sign in again."
            );
        });
        let client = NoteServiceClient::new(base_url, context.clone())?;
        let tags = TagsService::new(client.clone());
        tracing::debug!(profile = %profile_name, "Using remote note service");
        Ok(Workspace {
            notes: NotesService::remote(client),
            tags: Some(tags),
            context: Some(context),
        })
    } else {
        open_local_workspace(resolve_store_path(store_path_flag, &profile))
    }
}

pub fn open_local_workspace(path: PathBuf) -> Result<Workspace, CliError> {
    tracing::debug!(path = %path.display(), "Using local note store");
    let store = LocalNoteStore::open(path)?;
    Ok(Workspace {
        notes: NotesService::local(store),
        tags: None,
        context: None,
    })
}

/// Auth client for the resolved profile; errors when no remote API is
/// configured.
pub fn auth_client(profile_name: &str, profile: &CliProfile) -> Result<AuthClient, CliError> {
    let base_url = resolve_api_base_url(profile).ok_or(CliError::RemoteNotConfigured)?;
    let context = AuthContext::restore(SessionStore::new(profile_name))?;
    Ok(AuthClient::new(base_url, context)?)
}

pub fn resolve_api_base_url(profile: &CliProfile) -> Option<String> {
    normalize_text_option(env::var("SCRIPTUM_API_URL").ok()).or_else(|| profile.api_base_url())
}

pub fn resolve_store_path(flag: Option<&Path>, profile: &CliProfile) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| env::var_os("SCRIPTUM_STORE_PATH").map(PathBuf::from))
        .or_else(|| profile.store_path.clone())
        .unwrap_or_else(default_store_path)
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scriptum")
        .join("notes.json")
}

/// Reload the collection and return it sorted for display. Load failures
/// surface as errors here so list-shaped commands can render them.
pub async fn load_sorted_notes(workspace: &Workspace) -> Result<Vec<Note>, CliError> {
    workspace.require_signed_in()?;
    workspace.notes.load_notes().await;
    if let Some(message) = workspace.notes.error() {
        return Err(CliError::LoadFailed(message));
    }
    Ok(workspace.notes.sorted_notes())
}

pub async fn list_notes(
    workspace: &Workspace,
    limit: usize,
    tag: Option<&str>,
) -> Result<Vec<Note>, CliError> {
    let notes = if let Some(tag_name) = tag {
        workspace.require_signed_in()?;
        let tag_id = tag_name.parse()?;
        sort_notes(&workspace.notes.notes_by_tag(&tag_id).await?)
    } else {
        load_sorted_notes(workspace).await?
    };
    Ok(notes.into_iter().take(limit).collect())
}

/// Resolve a note by exact id or unique id prefix against the loaded
/// collection.
pub async fn resolve_note(workspace: &Workspace, query: &str) -> Result<Note, CliError> {
    let normalized = normalize_note_identifier(query)?;

    workspace.require_signed_in()?;
    workspace.notes.load_notes().await;
    if let Some(message) = workspace.notes.error() {
        return Err(CliError::LoadFailed(message));
    }

    let collection = workspace.notes.notes();
    if let Some(note) = collection.iter().find(|note| note.id.as_str() == normalized) {
        return Ok(note.clone());
    }

    let matches = collection
        .iter()
        .filter(|note| note.id.as_str().starts_with(&normalized))
        .collect::<Vec<_>>();
    match matches.len() {
        0 => Err(CliError::NoteNotFound(normalized)),
        1 => Ok(matches[0].clone()),
        _ => {
            let options = matches
                .iter()
                .take(3)
                .map(|note| short_id(&note.id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{normalized}' is ambiguous; matches: {options}"
            )))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub tags: Vec<String>,
    pub color: Option<String>,
    pub is_pinned: bool,
    pub created_at: String,
    pub modified_at: Option<String>,
    pub relative_time: String,
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now = Utc::now();
    let mut tags = note.tags.clone();
    tags.sort();

    NoteListItem {
        id: note.id.to_string(),
        title: note.display_title().to_string(),
        preview: note_preview(note, JSON_PREVIEW_CHARS),
        tags,
        color: note.color.clone(),
        is_pinned: note.is_pinned,
        created_at: note.created_at.to_rfc3339(),
        modified_at: note.modified_at.map(|stamp| stamp.to_rfc3339()),
        relative_time: format_relative_time(last_touched(note), now),
    }
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now = Utc::now();
    notes
        .iter()
        .map(|note| {
            let pin_marker = if note.is_pinned { "*" } else { " " };
            let short_id = short_id(&note.id);
            let title = clip_text(note.display_title(), LIST_TITLE_CHARS);
            let relative_time = format_relative_time(last_touched(note), now);
            let tags = render_tags(note);

            if tags.is_empty() {
                format!("{pin_marker} {short_id:<13}  {title:<30}  {relative_time}")
            } else {
                format!("{pin_marker} {short_id:<13}  {title:<30}  {relative_time:<10}  {tags}")
            }
        })
        .collect()
}

/// One-line plain-text preview of the note body for list rows.
pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let stripped = markdown_preview(&note.content, max_chars.saturating_mul(4));
    let first_line = stripped
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");
    clip_text(&collapsed, max_chars)
}

pub fn clip_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut clipped = text.chars().take(take_len).collect::<String>();
        clipped.push_str("...");
        clipped
    }
}

pub fn render_tags(note: &Note) -> String {
    let mut tags = note.tags.clone();
    tags.sort();
    tags.into_iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn short_id(id: &NoteId) -> String {
    id.as_str().chars().take(SHORT_ID_CHARS).collect()
}

fn last_touched(note: &Note) -> DateTime<Utc> {
    note.modified_at.unwrap_or(note.created_at)
}

pub fn format_relative_time(stamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(stamp);
    let minutes = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if hours < 1 {
        format!("{minutes}m ago")
    } else if days < 1 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else if days < 30 {
        format!("{}w ago", days / 7)
    } else if days < 365 {
        format!("{}mo ago", days / 30)
    } else {
        format!("{}y ago", days / 365)
    }
}

pub fn format_timestamp(stamp: DateTime<Utc>) -> String {
    stamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[derive(Debug, Serialize)]
pub struct TagListItem {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub created_at: String,
}

pub fn tag_to_list_item(tag: &Tag) -> TagListItem {
    TagListItem {
        id: tag.id.to_string(),
        name: tag.name.clone(),
        color: tag.color.clone(),
        created_at: tag.created_at.to_rfc3339(),
    }
}

pub fn format_tag_lines(tags: &[Tag]) -> Vec<String> {
    tags.iter()
        .map(|tag| {
            let name = clip_text(&tag.name, 24);
            match &tag.color {
                Some(color) => format!("{:<13}  {name:<24}  {color}", tag.id),
                None => format!("{:<13}  {name}", tag.id),
            }
        })
        .collect()
}

/// Note content for `add`: explicit flag first, then piped stdin, then an
/// interactive editor.
pub fn resolve_note_content(explicit: Option<&str>) -> Result<String, CliError> {
    if let Some(content) = explicit.and_then(normalize_content) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    if let Some(content) = capture_editor_input()? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

fn capture_editor_input() -> Result<Option<String>, CliError> {
    capture_editor_input_with_initial("")
}

pub fn capture_editor_input_with_initial(initial_content: &str) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&note_content))
}

fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            // Fallback for editor commands with args, e.g. "code --wait"
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("scriptum-note-{}-{now}.md", std::process::id()))
}
