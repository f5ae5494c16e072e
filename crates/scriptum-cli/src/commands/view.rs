use std::path::Path;

use scriptum_core::models::NoteId;

use crate::commands::common::{
    format_timestamp, normalize_note_identifier, open_workspace, render_tags, resolve_note,
};
use crate::error::CliError;

pub async fn run_view(
    id: &str,
    profile: Option<&str>,
    store_path: Option<&Path>,
) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let workspace = open_workspace(profile, store_path)?;
    workspace.require_signed_in()?;

    // Exact id lookup first; prefixes fall back to the resolver.
    let note_id: NoteId = normalized_id.parse()?;
    let note = match workspace.notes.get_note(&note_id).await {
        Ok(note) => note,
        Err(scriptum_core::Error::NotFound(_)) => resolve_note(&workspace, &normalized_id).await?,
        Err(err) => return Err(err.into()),
    };

    println!("{}", note.display_title());
    println!("Id:       {}", note.id);
    println!("Created:  {}", format_timestamp(note.created_at));
    if let Some(modified_at) = note.modified_at {
        println!("Modified: {}", format_timestamp(modified_at));
    }
    if note.is_pinned {
        println!("Pinned:   yes");
    }
    if let Some(color) = &note.color {
        println!("Color:    {color}");
    }
    let tags = render_tags(&note);
    if !tags.is_empty() {
        println!("Tags:     {tags}");
    }
    println!();
    println!("{}", note.content);

    Ok(())
}
