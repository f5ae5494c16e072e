use std::path::Path;

use scriptum_core::models::NotePatch;

use crate::commands::common::{capture_editor_input_with_initial, open_workspace, resolve_note};
use crate::error::CliError;

pub async fn run_edit(
    id: &str,
    title: Option<&str>,
    content: Option<&str>,
    tags: Option<&[String]>,
    color: Option<&str>,
    profile: Option<&str>,
    store_path: Option<&Path>,
) -> Result<(), CliError> {
    let workspace = open_workspace(profile, store_path)?;
    let note = resolve_note(&workspace, id).await?;

    let mut patch = NotePatch::default();
    if let Some(title) = title {
        patch = patch.with_title(title);
    }
    if let Some(content) = content {
        patch = patch.with_content(content);
    }
    if let Some(tags) = tags {
        patch = patch.with_tags(tags.to_vec());
    }
    if let Some(color) = color {
        patch = patch.with_color(color);
    }

    // Without field flags the body is edited interactively.
    if patch.is_empty() {
        let Some(edited_content) = capture_editor_input_with_initial(&note.content)? else {
            return Err(CliError::EmptyEditedContent);
        };

        if edited_content == note.content {
            println!("{}", note.id);
            return Ok(());
        }

        patch = patch.with_content(edited_content);
    }

    let updated = workspace.notes.update_note(&note.id, patch).await?;
    println!("{}", updated.id);
    Ok(())
}
