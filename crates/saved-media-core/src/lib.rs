pub mod auth_watcher;
pub mod client;
pub mod error;
pub mod migration;
pub mod reconcile;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use auth_watcher::AuthWatcher;
pub use client::{SavedMediaClient, StartReport};
pub use error::{ReconcileError, SessionError};
pub use migration::{cleanup_expired_backup, migrate, BackupCleanup, FavoritesBackup, MigrationOutcome};
pub use reconcile::{HydrateOutcome, Reconciler, ToggleOutcome, WatchlistState};
pub use session::AuthSession;
