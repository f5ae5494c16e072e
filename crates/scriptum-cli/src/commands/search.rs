use std::path::Path;

use scriptum_core::models::sort_notes;

use crate::cli::SearchField;
use crate::commands::common::{
    format_note_lines, normalize_search_query, note_to_list_item, open_workspace, NoteListItem,
};
use crate::error::CliError;

pub async fn run_search(
    query: &str,
    field: SearchField,
    limit: usize,
    as_json: bool,
    profile: Option<&str>,
    store_path: Option<&Path>,
) -> Result<(), CliError> {
    let normalized_query = normalize_search_query(query)?;
    let workspace = open_workspace(profile, store_path)?;
    workspace.require_signed_in()?;

    let matches = match field {
        SearchField::Title => workspace.notes.search_by_title(&normalized_query).await?,
        SearchField::Content => workspace.notes.search_by_content(&normalized_query).await?,
    };
    let notes = sort_notes(&matches)
        .into_iter()
        .take(limit)
        .collect::<Vec<_>>();

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}
