use std::path::Path;

use scriptum_core::models::NoteDraft;

use crate::commands::common::{open_workspace, resolve_note_content};
use crate::error::CliError;

pub async fn run_add(
    title_parts: &[String],
    content: Option<&str>,
    tags: &[String],
    color: Option<&str>,
    pin: bool,
    profile: Option<&str>,
    store_path: Option<&Path>,
) -> Result<(), CliError> {
    let title = title_parts.join(" ");
    let content = resolve_note_content(content)?;

    let mut draft = NoteDraft::new(title, content)
        .with_tags(tags.to_vec())
        .pinned(pin);
    if let Some(color) = color {
        draft = draft.with_color(color);
    }

    let workspace = open_workspace(profile, store_path)?;
    workspace.require_signed_in()?;
    let note = workspace.notes.create_note(draft).await?;

    println!("{}", note.id);
    Ok(())
}
