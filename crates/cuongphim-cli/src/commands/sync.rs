use super::context;
use crate::output::Output;
use color_eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use saved_media_config::{Config, PathManager};
use saved_media_core::HydrateOutcome;
use std::time::Duration;

pub async fn run_sync(paths: PathManager, config: Config, output: &Output) -> Result<()> {
    let (client, _) = context::open(&paths, &config, output).await?;

    let spinner = if output.is_human() && !output.is_quiet() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Fetching your watchlist...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = client.refresh().await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match result {
        Ok(HydrateOutcome::Replaced { count }) => output.success(format!("Watchlist synced ({} items)", count)),
        Ok(HydrateOutcome::Guest) => output.warn("Not signed in; showing the local collection"),
        Err(e) => output.warn(format!("Sync failed, showing saved data: {}", e)),
    }

    output.items(client.snapshot().items.items());
    Ok(())
}
