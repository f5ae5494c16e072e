//! Scriptum CLI - Markdown notes from the command line
//!
//! Works against the remote Scriptum API when a profile is configured,
//! or against a local note store when it is not.

mod cli;
mod commands;
mod config_profiles;
mod error;
mod session;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::health::run_health;
use crate::commands::list::run_list;
use crate::commands::pin::run_pin;
use crate::commands::search::run_search;
use crate::commands::tag_cmd::run_tag;
use crate::commands::view::run_view;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scriptum=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();
    let store_path = cli.store_path.as_deref();

    match cli.command {
        Some(Commands::Add {
            title,
            content,
            tags,
            color,
            pin,
        }) => {
            run_add(
                &title,
                content.as_deref(),
                &tags,
                color.as_deref(),
                pin,
                profile,
                store_path,
            )
            .await?;
        }
        Some(Commands::List { limit, tag, json }) => {
            run_list(limit, tag.as_deref(), json, profile, store_path).await?;
        }
        Some(Commands::View { id }) => run_view(&id, profile, store_path).await?,
        Some(Commands::Edit {
            id,
            title,
            content,
            tags,
            color,
        }) => {
            let tags = if tags.is_empty() {
                None
            } else {
                Some(tags.as_slice())
            };
            run_edit(
                &id,
                title.as_deref(),
                content.as_deref(),
                tags,
                color.as_deref(),
                profile,
                store_path,
            )
            .await?;
        }
        Some(Commands::Delete { id }) => run_delete(&id, profile, store_path).await?,
        Some(Commands::Pin { id }) => run_pin(&id, profile, store_path).await?,
        Some(Commands::Search {
            query,
            field,
            limit,
            json,
        }) => {
            run_search(&query, field, limit, json, profile, store_path).await?;
        }
        Some(Commands::Tag { command }) => run_tag(command, profile, store_path).await?,
        Some(Commands::Auth { command }) => run_auth(command, profile).await?,
        Some(Commands::Health) => run_health(profile).await?,
        Some(Commands::Config { command }) => run_config(command, profile)?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        None => {
            // Quick capture mode: scriptum "meeting notes" (content comes
            // from stdin or the editor)
            if cli.title.is_empty() {
                Cli::command().print_help().map_err(CliError::Io)?;
                println!();
            } else {
                run_add(&cli.title, None, &[], None, false, profile, store_path).await?;
            }
        }
    }

    Ok(())
}
