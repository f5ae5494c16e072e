use std::path::Path;

use crate::commands::common::{open_workspace, resolve_note};
use crate::error::CliError;

pub async fn run_delete(
    id: &str,
    profile: Option<&str>,
    store_path: Option<&Path>,
) -> Result<(), CliError> {
    let workspace = open_workspace(profile, store_path)?;
    let note = resolve_note(&workspace, id).await?;

    workspace.notes.delete_note(&note.id).await?;
    println!("{}", note.id);
    Ok(())
}
