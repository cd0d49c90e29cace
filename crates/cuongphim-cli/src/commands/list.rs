use super::context;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use saved_media_config::{Config, PathManager};

pub async fn run_list(paths: PathManager, config: Config, legacy: bool, output: &Output) -> Result<()> {
    let (client, _) = context::open(&paths, &config, output).await?;

    if legacy {
        if client.user().is_none() {
            return Err(eyre!("Sign in to read the legacy favorites list"));
        }
        let items = client
            .reconciler()
            .legacy_favorites()
            .await
            .map_err(|e| eyre!("Failed to fetch legacy favorites: {}", e))?;
        output.items(&items);
        return Ok(());
    }

    let state = client.snapshot();
    output.items(state.items.items());
    Ok(())
}
