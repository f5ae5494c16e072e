use std::path::Path;

use scriptum_core::models::NotePatch;

use crate::commands::common::{open_workspace, resolve_note};
use crate::error::CliError;

pub async fn run_pin(
    id: &str,
    profile: Option<&str>,
    store_path: Option<&Path>,
) -> Result<(), CliError> {
    let workspace = open_workspace(profile, store_path)?;
    let note = resolve_note(&workspace, id).await?;

    let pinned = !note.is_pinned;
    let patch = NotePatch::default().with_pinned(pinned);
    let updated = workspace.notes.update_note(&note.id, patch).await?;

    if pinned {
        println!("Pinned {}", updated.id);
    } else {
        println!("Unpinned {}", updated.id);
    }
    Ok(())
}
