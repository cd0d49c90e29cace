use super::context;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::Input;
use saved_media_config::{Config, PathManager};
use serde_json::json;

fn prompt_email(email: Option<String>) -> Result<String> {
    match email {
        Some(email) => Ok(email),
        None => Ok(Input::<String>::new().with_prompt("Email").interact_text()?),
    }
}

pub async fn run_login(paths: PathManager, config: Config, email: Option<String>, output: &Output) -> Result<()> {
    let (mut client, _) = context::open(&paths, &config, output).await?;
    let email = prompt_email(email)?;
    let password = rpassword::prompt_password("Password: ")?;

    let profile = client
        .login(&email, &password)
        .await
        .map_err(|e| eyre!("Login failed: {}", e))?;

    output.success(format!("Signed in as {}", profile.name.as_deref().unwrap_or(&profile.email)));
    let state = client.snapshot();
    if state.error.is_none() {
        output.info(format!("{} saved items", state.items.len()));
    }
    Ok(())
}

pub async fn run_register(
    paths: PathManager,
    config: Config,
    email: Option<String>,
    name: Option<String>,
    output: &Output,
) -> Result<()> {
    let (mut client, _) = context::open(&paths, &config, output).await?;
    let email = prompt_email(email)?;
    let name = match name {
        Some(name) => name,
        None => Input::<String>::new().with_prompt("Name").interact_text()?,
    };
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        return Err(eyre!("Passwords do not match"));
    }

    let profile = client
        .register(&email, &password, &name)
        .await
        .map_err(|e| eyre!("Registration failed: {}", e))?;
    output.success(format!("Account created for {}", profile.email));
    Ok(())
}

pub async fn run_logout(paths: PathManager, config: Config, output: &Output) -> Result<()> {
    let (mut client, _) = context::open(&paths, &config, output).await?;
    if client.user().is_none() {
        output.info("Not signed in");
    }
    client.logout().await?;
    output.success("Signed out");
    Ok(())
}

pub async fn run_whoami(paths: PathManager, config: Config, output: &Output) -> Result<()> {
    let (client, _) = context::open(&paths, &config, output).await?;
    let since = client.session().signed_in_since();
    match client.user() {
        Some(user) if output.is_human() => {
            output.info(format!("{} <{}>", user.name.as_deref().unwrap_or("-"), user.email));
            if let Some(role) = &user.role {
                output.info(format!("Role: {}", role));
            }
            if let Some(since) = since {
                output.info(format!("Signed in since {}", since.format("%Y-%m-%d %H:%M UTC")));
            }
        }
        Some(user) => output.json(&json!({ "type": "user", "user": user, "signedInSince": since })),
        None => output.info("Guest (not signed in)"),
    }
    Ok(())
}
