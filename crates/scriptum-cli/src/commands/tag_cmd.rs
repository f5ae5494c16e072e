use std::path::Path;

use scriptum_core::models::{Tag, TagDraft, TagId, TagPatch};

use crate::cli::TagCommands;
use crate::commands::common::{
    format_tag_lines, normalize_search_query, open_workspace, tag_to_list_item, TagListItem,
};
use crate::error::CliError;

pub async fn run_tag(
    command: TagCommands,
    profile: Option<&str>,
    store_path: Option<&Path>,
) -> Result<(), CliError> {
    let workspace = open_workspace(profile, store_path)?;
    let tags = workspace.tags()?;
    workspace.require_signed_in()?;

    match command {
        TagCommands::List { json } => {
            tags.load_tags().await;
            if let Some(message) = tags.error() {
                return Err(CliError::LoadFailed(message));
            }
            render_tag_collection(&tags.tags(), json)
        }
        TagCommands::Add { name, color } => {
            let mut draft = TagDraft::new(name);
            if let Some(color) = color {
                draft = draft.with_color(color);
            }
            let tag = tags.create_tag(draft).await?;
            println!("{}", tag.id);
            Ok(())
        }
        TagCommands::Rename { id, name } => {
            let tag_id: TagId = id.parse()?;
            let patch = TagPatch::default().with_name(name);
            let tag = tags.update_tag(&tag_id, patch).await?;
            println!("{}", tag.id);
            Ok(())
        }
        TagCommands::Delete { id } => {
            let tag_id: TagId = id.parse()?;
            tags.delete_tag(&tag_id).await?;
            println!("{tag_id}");
            Ok(())
        }
        TagCommands::Search { query, json } => {
            let normalized_query = normalize_search_query(&query)?;
            let matches = tags.search_by_name(&normalized_query).await?;
            render_tag_collection(&matches, json)
        }
    }
}

fn render_tag_collection(tags: &[Tag], as_json: bool) -> Result<(), CliError> {
    if as_json {
        let json_items = tags
            .iter()
            .map(tag_to_list_item)
            .collect::<Vec<TagListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_tag_lines(tags) {
            println!("{line}");
        }
    }
    Ok(())
}
