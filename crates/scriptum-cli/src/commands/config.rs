use std::env;
use std::path::PathBuf;

use crate::cli::ConfigCommands;
use crate::commands::common::resolve_store_path;
use crate::config_profiles::{is_http_url, normalize_text_option, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_url,
            store_path,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            api_url,
            store_path,
            no_activate,
        ),
        ConfigCommands::Show { profile } => run_config_show(profile.as_deref().or(global_profile)),
    }
}

fn run_config_init(
    profile_name: Option<&str>,
    api_url: Option<String>,
    store_path: Option<PathBuf>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);

    let merged_api_url = normalize_text_option(api_url)
        .or_else(|| normalize_text_option(env::var("SCRIPTUM_API_URL").ok()));
    let merged_store_path =
        store_path.or_else(|| env::var_os("SCRIPTUM_STORE_PATH").map(PathBuf::from));

    let profile = config.profile_mut_or_default(&profile_name);
    if let Some(url) = merged_api_url {
        if !is_http_url(&url) {
            return Err(CliError::Config(
                "api_url must include http:// or https://".to_string(),
            ));
        }
        profile.api_base_url = Some(url.trim_end_matches('/').to_string());
    }
    if let Some(path) = merged_store_path {
        profile.store_path = Some(path);
    }

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let profile = config
        .profiles
        .get(&profile_name)
        .ok_or_else(|| CliError::Config("Failed to persist profile".to_string()))?;
    if profile.api_base_url().is_some() {
        println!(
            "Remote profile '{profile_name}' is ready. Run `scriptum auth login --email <email> --password <password>`."
        );
    } else {
        println!("Profile '{profile_name}' runs in local mode (no API URL configured).");
    }

    Ok(())
}

fn run_config_show(profile_name: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();

    println!("Profile:    {profile_name}");
    match profile.api_base_url() {
        Some(url) => println!("API URL:    {url}"),
        None => println!("API URL:    (local mode)"),
    }
    println!(
        "Store path: {}",
        resolve_store_path(None, &profile).display()
    );

    Ok(())
}
