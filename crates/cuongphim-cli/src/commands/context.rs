use crate::output::Output;
use chrono::Utc;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use saved_media_backend::HttpBackend;
use saved_media_config::{Config, CredentialStore, PathManager};
use saved_media_core::{BackupCleanup, MigrationOutcome, SavedMediaClient, StartReport};
use saved_media_store::{CollectionStore, FileStore};
use std::sync::Arc;

pub fn load_config() -> Result<(PathManager, Config)> {
    let paths = if std::env::var("CUONGPHIM_BASE_PATH").is_ok() {
        PathManager::from_docker_env()
    } else {
        PathManager::new().map_err(|e| eyre!("{}", e))?
    };
    let config_file = paths.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;
    Ok((paths, config))
}

/// Build the client and run the app-load sequence (migration, backup
/// cleanup, session restore, hydrate).
pub async fn open(paths: &PathManager, config: &Config, output: &Output) -> Result<(SavedMediaClient, StartReport)> {
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create data directories: {}", e))?;

    let storage_dir = config.storage.dir.clone().unwrap_or_else(|| paths.storage_dir());
    let store = CollectionStore::new(Arc::new(FileStore::new(storage_dir)?));
    let backend = HttpBackend::from_config(&config.backend)?;
    let credentials = CredentialStore::new(paths.credentials_file());

    let mut client = SavedMediaClient::new(Arc::new(backend), store, credentials, config.backup_retention());
    let report = client.start(Utc::now()).await;
    report_start(&client, &report, output);
    Ok((client, report))
}

fn report_start(client: &SavedMediaClient, report: &StartReport, output: &Output) {
    match &report.migration {
        MigrationOutcome::Migrated { favorites, merged, .. } if *favorites > 0 => {
            output.info(format!("Moved {} favorites into your watchlist ({} items total)", favorites, merged));
        }
        MigrationOutcome::Failed(e) => {
            output.warn(format!("Could not migrate saved favorites, will retry next time: {}", e));
        }
        _ => {}
    }
    if let BackupCleanup::RemoveFailed(e) = &report.backup {
        tracing::warn!("Favorites backup cleanup failed: {}", e);
    }
    if let Some(e) = &report.restore_error {
        match client.session().stored_email() {
            Some(email) => output.warn(format!("Could not verify the session for {}, working offline: {}", email, e)),
            None => output.warn(format!("Could not verify your session, working offline: {}", e)),
        }
    }
    // A failed hydrate stays quiet: the local list is still shown
    if let Some(e) = &report.hydrate_error {
        tracing::debug!("Startup hydrate failed: {}", e);
    }
}
