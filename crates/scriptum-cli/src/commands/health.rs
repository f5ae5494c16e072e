use crate::commands::common::{auth_client, load_profile};
use crate::error::CliError;

pub async fn run_health(profile: Option<&str>) -> Result<(), CliError> {
    let (profile_name, profile) = load_profile(profile)?;
    let client = auth_client(&profile_name, &profile)?;

    let response = client.health().await?;
    println!("{response}");
    Ok(())
}
