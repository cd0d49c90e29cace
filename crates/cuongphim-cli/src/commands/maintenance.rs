use super::context;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use saved_media_config::{Config, PathManager};
use saved_media_core::{BackupCleanup, MigrationOutcome};
use serde_json::json;

/// Migration already runs on every start; this reports what it did.
pub async fn run_migrate(paths: PathManager, config: Config, output: &Output) -> Result<()> {
    let (_, report) = context::open(&paths, &config, output).await?;

    match report.migration {
        MigrationOutcome::AlreadyMigrated => output.info("Favorites were already migrated"),
        MigrationOutcome::Migrated {
            favorites,
            watchlist,
            merged,
        } => {
            if output.is_human() {
                output.success(format!(
                    "Migrated {} favorites and {} watchlist items into {} saved items",
                    favorites, watchlist, merged
                ));
            } else {
                output.json(&json!({
                    "type": "migration",
                    "favorites": favorites,
                    "watchlist": watchlist,
                    "merged": merged,
                }));
            }
        }
        MigrationOutcome::Failed(e) => return Err(eyre!("Migration failed: {}", e)),
    }
    Ok(())
}

pub async fn run_cleanup_backup(paths: PathManager, config: Config, output: &Output) -> Result<()> {
    let (_, report) = context::open(&paths, &config, output).await?;

    match report.backup {
        BackupCleanup::Missing => output.info("No favorites backup found"),
        BackupCleanup::Retained { expires_at } => output.info(format!(
            "Favorites backup kept until {}",
            expires_at.format("%Y-%m-%d %H:%M UTC")
        )),
        BackupCleanup::Removed => output.success("Expired favorites backup removed"),
        BackupCleanup::RemovedCorrupt => output.success("Unreadable favorites backup removed"),
        BackupCleanup::RemoveFailed(e) => return Err(eyre!("Could not remove favorites backup: {}", e)),
    }
    Ok(())
}

pub async fn run_clear(
    paths: PathManager,
    config: Config,
    all: bool,
    collection: bool,
    credentials: bool,
    output: &Output,
) -> Result<()> {
    if !all && !collection && !credentials {
        return Err(eyre!("Nothing to clear: pass --collection, --credentials or --all"));
    }

    let (mut client, _) = context::open(&paths, &config, output).await?;

    if all || collection {
        client.reconciler().clear_local()?;
        output.success("Local collection cleared");
    }
    if all || credentials {
        client.logout().await?;
        output.success("Stored credential cleared");
    }
    Ok(())
}
