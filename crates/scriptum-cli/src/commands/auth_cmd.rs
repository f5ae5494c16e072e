use scriptum_core::auth::Registration;

use crate::cli::AuthCommands;
use crate::commands::common::{auth_client, load_profile};
use crate::error::CliError;
use crate::session::{clear_stored_session, load_stored_session};

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Login {
            profile,
            email,
            password,
        } => {
            let (profile_name, profile) = load_profile(profile.as_deref().or(global_profile))?;
            let client = auth_client(&profile_name, &profile)?;
            let session = client.login(&email, &password).await?;

            println!(
                "Signed in profile '{profile_name}' as {}",
                session.user.email
            );
            if !session.email_verified {
                println!("Email not verified yet. Run `scriptum auth resend-verification` to request a new mail.");
            }
            Ok(())
        }
        AuthCommands::Register {
            profile,
            name,
            email,
            password,
            avatar_url,
        } => {
            let (profile_name, profile) = load_profile(profile.as_deref().or(global_profile))?;
            let client = auth_client(&profile_name, &profile)?;
            let registration = Registration {
                name,
                email,
                password,
                avatar_url,
            };
            let session = client.register(&registration).await?;

            println!(
                "Registered and signed in profile '{profile_name}' as {}",
                session.user.email
            );
            if !session.email_verified {
                println!("Check your inbox for the verification mail.");
            }
            Ok(())
        }
        AuthCommands::Status { profile } => {
            let (profile_name, _) = load_profile(profile.as_deref().or(global_profile))?;

            if let Some(session) = load_stored_session(&profile_name)? {
                println!(
                    "Profile '{profile_name}' is signed in as {} (user {})",
                    session.user.email, session.user.id
                );
                if !session.email_verified {
                    println!("Email not verified yet.");
                }
            } else {
                println!("Profile '{profile_name}' is not signed in.");
            }
            Ok(())
        }
        AuthCommands::Logout { profile } => {
            let (profile_name, _) = load_profile(profile.as_deref().or(global_profile))?;
            clear_stored_session(&profile_name)?;

            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
        AuthCommands::Verify { token, profile } => {
            let (profile_name, profile) = load_profile(profile.as_deref().or(global_profile))?;
            let client = auth_client(&profile_name, &profile)?;
            let response = client.verify_email(&token).await?;

            println!("{response}");
            Ok(())
        }
        AuthCommands::ResendVerification { profile } => {
            let (profile_name, profile) = load_profile(profile.as_deref().or(global_profile))?;
            let session = load_stored_session(&profile_name)?.ok_or(CliError::NotSignedIn)?;

            let client = auth_client(&profile_name, &profile)?;
            let response = client.resend_verification(&session.user.id).await?;

            println!("{response}");
            Ok(())
        }
    }
}
